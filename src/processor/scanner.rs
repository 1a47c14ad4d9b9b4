use memchr::memchr_iter;

use crate::processor::{
    RecordError,
    aggregate::{AggregateMap, upsert},
    planner::{Chunk, LINE_SEPARATOR},
    record::parse_record,
};

/// Everything one worker produces for its chunk.
#[derive(Debug, Default)]
pub struct ChunkResult<'a> {
    pub aggregates: AggregateMap<'a>,
    /// Valid observations folded into `aggregates`
    pub records: u64,
    /// Lines rejected by the record parser
    pub skipped: u64,
    /// First `max_errors` rejected lines, in input order
    pub errors: Vec<RecordError>,
}

/// Scans `chunk` of `source` into a local aggregate map.
///
/// The chunk's last line may lack a separator; the end of the range ends it.
/// Malformed lines are counted and sampled, never fatal.
pub fn scan_chunk<'a>(source: &'a [u8], chunk: Chunk, max_errors: usize) -> ChunkResult<'a> {
    let mut result = ChunkResult::default();
    if chunk.is_empty() {
        return result;
    }

    let data = &source[chunk.range()];
    let mut start = 0;

    for newline_pos in memchr_iter(LINE_SEPARATOR, data) {
        scan_line(&data[start..newline_pos], chunk.start + start, max_errors, &mut result);
        start = newline_pos + 1;
    }

    if start < data.len() {
        scan_line(&data[start..], chunk.start + start, max_errors, &mut result);
    }

    result
}

#[inline]
fn scan_line<'a>(line: &'a [u8], offset: usize, max_errors: usize, result: &mut ChunkResult<'a>) {
    match parse_record(line) {
        Ok(Some((key, value))) => {
            upsert(&mut result.aggregates, key, value);
            result.records += 1;
        }
        Ok(None) => {}
        Err(error) => {
            result.skipped += 1;
            if result.errors.len() < max_errors {
                result.errors.push(RecordError {
                    offset,
                    line: String::from_utf8_lossy(line).to_string(),
                    error,
                });
            }
        }
    }
}
