//! Strict parsing of manifest modification timestamps.

use jiff::civil::DateTime;

/// The only accepted shape of [`ManifestEntry::modified`], in `strptime` form.
///
/// [`ManifestEntry::modified`]: crate::ManifestEntry::modified
pub const MODIFIED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const MODIFIED_LEN: usize = "2006-01-02T15:04:05Z".len();

/// A modification timestamp that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum TimestampError {
    /// The input does not have the `YYYY-MM-DDTHH:MM:SSZ` shape.
    #[error("timestamp '{0}' does not match YYYY-MM-DDTHH:MM:SSZ")]
    Malformed(String),

    /// The input has the right shape but names an impossible date or time.
    #[error("timestamp '{input}' is not a valid date and time")]
    Invalid {
        input: String,
        #[source]
        source: jiff::Error,
    },
}

/// Parses a manifest timestamp in exactly `YYYY-MM-DDTHH:MM:SSZ` form.
///
/// The result is a civil (UTC) date and time. Fractional seconds, offsets
/// other than `Z` and surrounding whitespace are all rejected.
pub fn parse_modified(input: &str) -> Result<DateTime, TimestampError> {
    if !has_modified_shape(input) {
        return Err(TimestampError::Malformed(input.to_owned()));
    }

    DateTime::strptime(MODIFIED_FORMAT, input).map_err(|source| TimestampError::Invalid {
        input: input.to_owned(),
        source,
    })
}

fn has_modified_shape(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.len() != MODIFIED_LEN {
        return false;
    }

    bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        10 => *b == b'T',
        13 | 16 => *b == b':',
        19 => *b == b'Z',
        _ => b.is_ascii_digit(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_format() {
        let dt = parse_modified("2015-07-18T02:05:04Z").unwrap();
        assert_eq!(dt.year(), 2015);
        assert_eq!(dt.month(), 7);
        assert_eq!(dt.day(), 18);
        assert_eq!(dt.hour(), 2);
        assert_eq!(dt.minute(), 5);
        assert_eq!(dt.second(), 4);
    }

    #[test]
    fn rejects_other_shapes() {
        for input in [
            "",
            "2015-07-18",
            "2015-07-18 02:05:04Z",
            "2015-07-18T02:05:04",
            "2015-07-18T02:05:04+00:00",
            "2015-07-18T02:05:04.123Z",
            " 2015-07-18T02:05:04Z",
            "2015-7-18T02:05:04Z",
        ] {
            assert!(
                matches!(parse_modified(input), Err(TimestampError::Malformed(_))),
                "{input:?} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(matches!(
            parse_modified("2015-02-30T02:05:04Z"),
            Err(TimestampError::Invalid { .. })
        ));
        assert!(matches!(
            parse_modified("2015-07-18T25:05:04Z"),
            Err(TimestampError::Invalid { .. })
        ));
    }
}
