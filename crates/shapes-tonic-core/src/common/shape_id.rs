//! Client-side parsing of user-supplied shape identifiers and thresholds.
//!
//! The server resolves identifiers leniently (only the leading letter is
//! uppercased), so the client normalizes input up front: `t-03` becomes `T-3`.
//! Validation here is purely syntactic; whether the letter names a real bucket
//! is for the server to decide.

use crate::{Error, Result, geometry::round2};

/// Parses `<letter>-<non-negative integer>` into its normalized form.
pub fn normalize_shape_id(input: &str) -> Result<String> {
    let invalid = |reason| Error::InvalidShapeId {
        input: input.to_string(),
        reason,
    };

    let trimmed = input.trim();
    let (prefix, ordinal) = trimmed
        .split_once('-')
        .ok_or_else(|| invalid("expected `<letter>-<number>`"))?;

    let mut chars = prefix.chars();
    let letter = match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
        _ => return Err(invalid("prefix must be a single letter")),
    };

    if ordinal.is_empty() || !ordinal.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("suffix must be a non-negative integer"));
    }
    let ordinal: u64 = ordinal
        .parse()
        .map_err(|_| invalid("suffix is out of range"))?;

    Ok(format!("{letter}-{ordinal}"))
}

/// Parses a minimum perimeter, rounded to two decimals.
///
/// Negative values are accepted here; the server answers them with
/// `INVALID_PERIMETER`.
pub fn parse_min_perimeter(input: &str) -> Result<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(round2)
        .ok_or_else(|| Error::InvalidPerimeter {
            input: input.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_leading_zeros() {
        assert_eq!(normalize_shape_id("t-03").unwrap(), "T-3");
        assert_eq!(normalize_shape_id(" R-0 ").unwrap(), "R-0");
        assert_eq!(normalize_shape_id("p-12").unwrap(), "P-12");
        // Unknown letters are syntactically fine.
        assert_eq!(normalize_shape_id("x-1").unwrap(), "X-1");
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in ["", "T", "T-", "-3", "TT-3", "T--3", "T-3a", "T-+3", "7-1", "T 3"] {
            assert!(
                matches!(normalize_shape_id(bad), Err(Error::InvalidShapeId { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn parses_perimeters() {
        assert_eq!(parse_min_perimeter("10").unwrap(), 10.0);
        assert_eq!(parse_min_perimeter("3.14159").unwrap(), 3.14);
        assert_eq!(parse_min_perimeter("-1").unwrap(), -1.0);
        assert!(parse_min_perimeter("ten").is_err());
        assert!(parse_min_perimeter("NaN").is_err());
        assert!(parse_min_perimeter("inf").is_err());
    }
}
