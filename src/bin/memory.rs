use std::path::Path;

use measurement_aggregator::MeasurementAggregator;

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "measurements.txt".to_string());

    let aggregator = MeasurementAggregator::default();
    match aggregator.process_file(Path::new(&path)) {
        Ok(out) => println!("{} bytes of output", out.len()),
        Err(e) => eprintln!("{e}"),
    }

    println!("Memory benchmark finished. See dhat-heap.json for details");
}
