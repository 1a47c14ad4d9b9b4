use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};

const STATIONS: [&str; 12] = [
    "Abha", "Berlin", "Bulawayo", "Hamburg", "Istanbul", "Oslo", "Palembang", "Paris",
    "Reykjavík", "San José", "St. John's", "Zürich",
];

fn main() -> std::io::Result<()> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "measurements.txt".to_string());
    let rows: usize = args
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(10_000_000);

    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);

    let mut rng = rand::rng();
    for _ in 0..rows {
        let station = STATIONS[rng.random_range(0..STATIONS.len())];
        let tenths: i32 = rng.random_range(-999..=999);
        let sign = if tenths < 0 { "-" } else { "" };
        let abs = tenths.unsigned_abs();
        writeln!(writer, "{};{}{}.{}", station, sign, abs / 10, abs % 10)?;
    }
    writer.flush()?;

    println!("Generated {} rows: {}", rows, path);
    Ok(())
}
