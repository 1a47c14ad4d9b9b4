use crate::processor::aggregate::{Aggregate, AggregateMap};

/// Renders `{key=min/mean/max,...}` sorted by key bytes.
///
/// # Example
/// ```rust
/// # use measurement_aggregator::processor::{aggregate::{AggregateMap, upsert}, format::format_map};
/// let mut map = AggregateMap::default();
/// upsert(&mut map, b"A", -50);
/// upsert(&mut map, b"A", 50);
/// assert_eq!(format_map(&map), "{A=-5.0/0.0/5.0}");
/// ```
pub fn format_map(map: &AggregateMap<'_>) -> String {
    let mut entries: Vec<(&[u8], &Aggregate)> = map.iter().map(|(k, v)| (*k, v)).collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut out = String::with_capacity(2 + entries.len() * 32);
    out.push('{');
    for (i, (key, agg)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&String::from_utf8_lossy(key));
        out.push('=');
        push_tenths(&mut out, agg.min);
        out.push('/');
        push_tenths(&mut out, agg.mean_tenths());
        out.push('/');
        push_tenths(&mut out, agg.max);
    }
    out.push('}');
    out
}

/// Writes a scaled value with exactly one fractional digit. Never emits `-0.0`.
fn push_tenths(out: &mut String, tenths: i64) {
    if tenths < 0 {
        out.push('-');
    }
    let abs = tenths.unsigned_abs();
    out.push_str(&format!("{}.{}", abs / 10, abs % 10));
}
