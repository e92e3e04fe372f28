//! Scale-in schedule parsing
//!
//! The schedule is configured as a comma-separated list of budget
//! percentages, one per successive trigger on the locked outcome.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Default schedule: 50% on the first trigger, 30% and 20% on the follow-ups
pub fn default_schedule() -> Vec<Decimal> {
    vec![dec!(50), dec!(30), dec!(20)]
}

/// Parse a `"50,30,20"`-style schedule string
///
/// A list summing to more than 100 is scaled down proportionally to sum to
/// exactly 100. Malformed input falls back to the default schedule; a bad
/// schedule is a tuning concern, not a startup failure.
pub fn parse_scale_in_pcts(value: &str) -> Vec<Decimal> {
    if value.trim().is_empty() {
        return default_schedule();
    }

    let mut pcts = Vec::new();
    for part in value.split(',') {
        match part.trim().parse::<Decimal>() {
            Ok(p) => pcts.push(p),
            Err(_) => {
                tracing::warn!(input = %value, "Unparseable scale-in schedule, using default");
                return default_schedule();
            }
        }
    }

    let total: Decimal = pcts.iter().sum();
    if total > dec!(100) {
        pcts = pcts.into_iter().map(|p| p * dec!(100) / total).collect();
    }
    pcts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_returns_default() {
        assert_eq!(parse_scale_in_pcts(""), default_schedule());
        assert_eq!(parse_scale_in_pcts("   "), default_schedule());
    }

    #[test]
    fn test_parses_valid_list() {
        assert_eq!(
            parse_scale_in_pcts("50,30,20"),
            vec![dec!(50), dec!(30), dec!(20)]
        );
        assert_eq!(parse_scale_in_pcts("60,40"), vec![dec!(60), dec!(40)]);
        assert_eq!(parse_scale_in_pcts("100"), vec![dec!(100)]);
    }

    #[test]
    fn test_handles_whitespace() {
        assert_eq!(
            parse_scale_in_pcts(" 50 , 30 , 20 "),
            vec![dec!(50), dec!(30), dec!(20)]
        );
    }

    #[test]
    fn test_invalid_returns_default() {
        assert_eq!(parse_scale_in_pcts("abc,def"), default_schedule());
        assert_eq!(parse_scale_in_pcts("50,,20"), default_schedule());
    }

    #[test]
    fn test_over_100_normalized_proportionally() {
        let pcts = parse_scale_in_pcts("60,60,80");
        let total: Decimal = pcts.iter().sum();
        assert_eq!(total, dec!(100));
        assert_eq!(pcts, vec![dec!(30), dec!(30), dec!(40)]);
    }

    #[test]
    fn test_under_100_accepted_as_is() {
        assert_eq!(parse_scale_in_pcts("40,30"), vec![dec!(40), dec!(30)]);
    }

    #[test]
    fn test_longer_than_three_accepted() {
        assert_eq!(
            parse_scale_in_pcts("40,30,20,10"),
            vec![dec!(40), dec!(30), dec!(20), dec!(10)]
        );
    }
}
