use memchr::memchr;

use crate::processor::ParseError;

pub const DELIMITER: u8 = b';';

/// Splits one line into `(key, value)`, with the value scaled by ten.
///
/// Returns `Ok(None)` for blank or whitespace-only lines. A single trailing
/// `\r` is dropped so CRLF input parses the same as LF input.
///
/// # Errors
/// - [`ParseError::MissingDelimiter`] if the line has no `;`
/// - [`ParseError::InvalidNumber`] if the value is not `-?\d+\.\d`
///
/// # Example
/// ```rust
/// # use measurement_aggregator::processor::record::parse_record;
/// let (key, value) = parse_record(b"Hamburg;-12.3").unwrap().unwrap();
/// assert_eq!(key, b"Hamburg");
/// assert_eq!(value, -123);
/// ```
pub fn parse_record(line: &[u8]) -> Result<Option<(&[u8], i64)>, ParseError> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let sep = memchr(DELIMITER, line).ok_or(ParseError::MissingDelimiter)?;
    let value = parse_tenths(&line[sep + 1..])?;

    Ok(Some((&line[..sep], value)))
}

/// Parses `-?\d+\.\d` into tenths, e.g. `-4.5` -> `-45`.
pub fn parse_tenths(field: &[u8]) -> Result<i64, ParseError> {
    let (negative, digits) = match field {
        [b'-', rest @ ..] => (true, rest),
        _ => (false, field),
    };

    let [int_part @ .., b'.', frac] = digits else {
        return Err(ParseError::InvalidNumber);
    };
    if int_part.is_empty() || !int_part.iter().all(u8::is_ascii_digit) || !frac.is_ascii_digit() {
        return Err(ParseError::InvalidNumber);
    }

    // atoi_simd caps the digit count, so leading zeros must not count against it
    let int_part = match int_part.iter().position(|&b| b != b'0') {
        Some(first) => &int_part[first..],
        None => &int_part[int_part.len() - 1..],
    };
    let whole = atoi_simd::parse::<i64>(int_part).map_err(|_| ParseError::InvalidNumber)?;
    let tenths = whole
        .checked_mul(10)
        .and_then(|v| v.checked_add((frac - b'0') as i64))
        .ok_or(ParseError::InvalidNumber)?;

    Ok(if negative { -tenths } else { tenths })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_records() {
        assert_eq!(parse_record(b"Hamburg;12.0"), Ok(Some((&b"Hamburg"[..], 120))));
        assert_eq!(parse_record(b"A;-5.0"), Ok(Some((&b"A"[..], -50))));
        assert_eq!(parse_record(b"A;-0.3"), Ok(Some((&b"A"[..], -3))));
        assert_eq!(parse_record(b"Abidjan;105.7"), Ok(Some((&b"Abidjan"[..], 1057))));
    }

    #[test]
    fn test_key_ends_at_first_delimiter() {
        // the rest of the line is the value field, so a second ';' makes it invalid
        assert_eq!(parse_record(b"a;b;1.0"), Err(ParseError::InvalidNumber));
        assert_eq!(parse_record(b"San Jose;1.0"), Ok(Some((&b"San Jose"[..], 10))));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(parse_record(b""), Ok(None));
        assert_eq!(parse_record(b"  \t"), Ok(None));
        assert_eq!(parse_record(b"\r"), Ok(None));
    }

    #[test]
    fn test_crlf_is_tolerated() {
        assert_eq!(parse_record(b"Oslo;1.5\r"), Ok(Some((&b"Oslo"[..], 15))));
    }

    #[test]
    fn test_missing_delimiter() {
        assert_eq!(parse_record(b"Oslo 1.5"), Err(ParseError::MissingDelimiter));
    }

    #[test]
    fn test_invalid_numbers() {
        for bad in [
            "abc", "", "1", "1.", ".5", "1.25", "-", "-.5", "+1.0", "1,0", " 1.0", "1.0 ",
            "--1.0", "99999999999999999999.9",
        ] {
            assert_eq!(
                parse_tenths(bad.as_bytes()),
                Err(ParseError::InvalidNumber),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(parse_tenths(b"007.5"), Ok(75));
        assert_eq!(parse_tenths(b"-0.0"), Ok(0));
        assert_eq!(parse_tenths(b"000000000000000000000001.5"), Ok(15));
        assert_eq!(parse_tenths(b"-0000000000000000000000000.7"), Ok(-7));
        assert_eq!(parse_tenths(b"0000000000000000000000000.0"), Ok(0));
    }

    #[test]
    fn test_large_magnitudes() {
        assert_eq!(parse_tenths(b"900000000000000000.0"), Ok(9_000_000_000_000_000_000));
        assert_eq!(parse_tenths(b"-922337203685477580.7"), Ok(-i64::MAX));
        assert_eq!(parse_tenths(b"922337203685477580.8"), Err(ParseError::InvalidNumber));
    }
}
