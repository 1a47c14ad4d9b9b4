use memchr::memchr;
use std::num::NonZeroUsize;
use std::ops::Range;

pub const LINE_SEPARATOR: u8 = b'\n';

/// Half-open byte range `[start, end)` of the input handed to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Computes `workers + 1` non-decreasing boundaries over `[0, file_size)`.
///
/// Each intermediate boundary starts at the naive target
/// `i * (file_size / workers)` and moves forward to the byte just past the
/// next line separator, as reported by `line_break_at`. Targets that run off
/// the end clamp to `file_size`.
pub fn plan<F>(file_size: usize, workers: NonZeroUsize, line_break_at: F) -> Vec<usize>
where
    F: Fn(usize) -> bool,
{
    plan_with(file_size, workers, |from| {
        (from..file_size).find(|&offset| line_break_at(offset))
    })
}

/// Same plan as [`plan`], scanning the in-memory buffer with `memchr`.
pub fn plan_bytes(data: &[u8], workers: NonZeroUsize) -> Vec<usize> {
    plan_with(data.len(), workers, |from| {
        memchr(LINE_SEPARATOR, &data[from..]).map(|pos| from + pos)
    })
}

fn plan_with<F>(file_size: usize, workers: NonZeroUsize, next_break: F) -> Vec<usize>
where
    F: Fn(usize) -> Option<usize>,
{
    let workers = workers.get();
    let mut boundaries = Vec::with_capacity(workers + 1);
    boundaries.push(0);

    if file_size == 0 {
        boundaries.resize(workers + 1, 0);
        return boundaries;
    }

    let chunk_size = file_size / workers;

    for i in 1..workers {
        let target = i * chunk_size;
        let boundary = if target >= file_size {
            file_size
        } else {
            match next_break(target) {
                Some(sep) => sep + 1,
                None => file_size,
            }
        };

        boundaries.push(boundary);
    }

    boundaries.push(file_size);
    boundaries
}

/// Pairs consecutive boundaries into chunks.
pub fn chunks(boundaries: &[usize]) -> Vec<Chunk> {
    boundaries
        .windows(2)
        .map(|w| Chunk {
            start: w[0],
            end: w[1],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workers(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn assert_partition(data: &[u8], boundaries: &[usize], n: usize) {
        assert_eq!(boundaries.len(), n + 1);
        assert_eq!(boundaries[0], 0);
        assert_eq!(boundaries[n], data.len());
        assert!(boundaries.windows(2).all(|w| w[0] <= w[1]));

        for &b in &boundaries[1..n] {
            if b != 0 && b != data.len() {
                assert_eq!(data[b - 1], LINE_SEPARATOR, "boundary {b} not after a newline");
            }
        }

        let rebuilt: Vec<u8> = chunks(boundaries)
            .iter()
            .flat_map(|c| data[c.range()].iter().copied())
            .collect();
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn test_empty_input_collapses() {
        assert_eq!(plan_bytes(b"", workers(4)), vec![0, 0, 0, 0, 0]);
        assert!(chunks(&plan_bytes(b"", workers(4))).iter().all(Chunk::is_empty));
    }

    #[test]
    fn test_single_worker_takes_everything() {
        let data = b"a;1.0\nb;2.0\n";
        assert_eq!(plan_bytes(data, workers(1)), vec![0, data.len()]);
    }

    #[test]
    fn test_boundaries_follow_newlines() {
        let data = b"Hamburg;12.0\nBerlin;8.5\nHamburg;6.0\n";
        for n in 1..=8 {
            assert_partition(data, &plan_bytes(data, workers(n)), n);
        }
    }

    #[test]
    fn test_more_workers_than_lines_yields_empty_chunks() {
        let data = b"a;1.0\nb;2.0";
        let boundaries = plan_bytes(data, workers(10));
        assert_partition(data, &boundaries, 10);
        let non_empty = chunks(&boundaries).iter().filter(|c| !c.is_empty()).count();
        assert!(non_empty <= 2);
    }

    #[test]
    fn test_converging_targets_share_a_boundary() {
        let data = b"a;1.0\nb;2.0\nc;3.0\n";
        let boundaries = plan_bytes(data, workers(10));
        assert_eq!(boundaries, vec![0, 6, 6, 6, 6, 6, 12, 12, 12, 12, 18]);
        assert_partition(data, &boundaries, 10);
    }

    #[test]
    fn test_no_trailing_separator() {
        let data = b"long-key-without-newline;1.0";
        let boundaries = plan_bytes(data, workers(3));
        assert_eq!(boundaries, vec![0, data.len(), data.len(), data.len()]);
    }

    #[test]
    fn test_callback_plan_matches_memchr_plan() {
        let data: Vec<u8> = (0..200)
            .flat_map(|i| format!("k{};{}.{}\n", i % 7, i, i % 10).into_bytes())
            .collect();

        for n in [1, 2, 3, 5, 16, 64] {
            let by_callback = plan(data.len(), workers(n), |offset| data[offset] == LINE_SEPARATOR);
            assert_eq!(by_callback, plan_bytes(&data, workers(n)));
        }
    }
}
