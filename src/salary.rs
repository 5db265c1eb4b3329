//! Compensation splitter: free-text pay strings into numeric bounds.

use crate::config::CleanRules;

/// The six derived pay fields of a cleaned record. At most one band is
/// populated per record; bounds never straddle salary and hourly.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PayBands {
    pub salary_lower: Option<f64>,
    pub salary_avg: Option<f64>,
    pub salary_upper: Option<f64>,
    pub hourly_lower: Option<f64>,
    pub hourly_avg: Option<f64>,
    pub hourly_upper: Option<f64>,
}

/// Parse a raw compensation string.
///
/// Currency symbols, a leading "From" qualifier and the unit phrases are
/// stripped, then the rest splits on one hyphen into a lower/upper pair. A
/// single value is a point estimate (upper = lower). Any bound under
/// `rules.hourly_threshold` moves the whole pair into the hourly band.
/// Unparseable segments turn into null bounds; a string with no numeric
/// content at all yields the empty result.
pub fn split_pay(raw: Option<&str>, rules: &CleanRules) -> PayBands {
    let Some(raw) = raw else {
        return PayBands::default();
    };

    let cleaned = raw
        .replace('$', "")
        .replace("From", "")
        .replace("a year", "")
        .replace("an hour", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return PayBands::default();
    }

    let (lower, upper) = match cleaned.split_once('-') {
        Some((lo, hi)) => (parse_amount(lo), parse_amount(hi)),
        None => {
            let point = parse_amount(cleaned);
            (point, point)
        }
    };
    if lower.is_none() && upper.is_none() {
        return PayBands::default();
    }

    let avg = midpoint(lower, upper);
    let hourly = [lower, upper]
        .iter()
        .flatten()
        .any(|v| *v < rules.hourly_threshold);

    if hourly {
        PayBands {
            hourly_lower: lower,
            hourly_avg: avg,
            hourly_upper: upper,
            ..PayBands::default()
        }
    } else {
        PayBands {
            salary_lower: lower,
            salary_avg: avg,
            salary_upper: upper,
            ..PayBands::default()
        }
    }
}

fn parse_amount(segment: &str) -> Option<f64> {
    let digits = segment.trim().replace(',', "");
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Mean of the present bounds; a lone bound is its own average.
fn midpoint(lower: Option<f64>, upper: Option<f64>) -> Option<f64> {
    match (lower, upper) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> CleanRules {
        CleanRules::default()
    }

    #[test]
    fn annual_range_splits_into_salary_band() {
        let p = split_pay(Some("$90,000 - $120,000 a year"), &rules());
        assert_eq!(p.salary_lower, Some(90000.0));
        assert_eq!(p.salary_avg, Some(105000.0));
        assert_eq!(p.salary_upper, Some(120000.0));
        assert_eq!(p.hourly_lower, None);
        assert_eq!(p.hourly_avg, None);
        assert_eq!(p.hourly_upper, None);
    }

    #[test]
    fn hourly_range_goes_to_hourly_band() {
        let p = split_pay(Some("$25 - $35 an hour"), &rules());
        assert_eq!(p.hourly_lower, Some(25.0));
        assert_eq!(p.hourly_avg, Some(30.0));
        assert_eq!(p.hourly_upper, Some(35.0));
        assert_eq!(p.salary_lower, None);
    }

    #[test]
    fn point_estimate_repeats_the_bound() {
        let p = split_pay(Some("From $185,000 a year"), &rules());
        assert_eq!(p.salary_lower, Some(185000.0));
        assert_eq!(p.salary_avg, Some(185000.0));
        assert_eq!(p.salary_upper, Some(185000.0));
    }

    #[test]
    fn decimal_hourly_rates_parse() {
        let p = split_pay(Some("$17.50 - $20 an hour"), &rules());
        assert_eq!(p.hourly_lower, Some(17.5));
        assert_eq!(p.hourly_avg, Some(18.75));
        assert_eq!(p.hourly_upper, Some(20.0));
    }

    #[test]
    fn one_bad_segment_leaves_a_null_bound() {
        let p = split_pay(Some("$90,000 - competitive a year"), &rules());
        assert_eq!(p.salary_lower, Some(90000.0));
        assert_eq!(p.salary_avg, Some(90000.0));
        assert_eq!(p.salary_upper, None);
    }

    #[test]
    fn garbage_and_empty_yield_all_nulls() {
        assert_eq!(split_pay(Some("Up to $60,000 a year"), &rules()), PayBands::default());
        assert_eq!(split_pay(Some(""), &rules()), PayBands::default());
        assert_eq!(split_pay(Some("-"), &rules()), PayBands::default());
        assert_eq!(split_pay(None, &rules()), PayBands::default());
    }

    #[test]
    fn mixed_magnitude_pair_is_still_one_band() {
        // a typo like "900 - 120,000" must not straddle both bands
        let p = split_pay(Some("$900 - $120,000 a year"), &rules());
        assert_eq!(p.hourly_lower, Some(900.0));
        assert_eq!(p.hourly_upper, Some(120000.0));
        assert_eq!(p.salary_lower, None);
        assert_eq!(p.salary_upper, None);
    }

    #[test]
    fn threshold_is_exclusive() {
        let p = split_pay(Some("$1,000 - $2,000"), &rules());
        assert_eq!(p.salary_lower, Some(1000.0));
        assert_eq!(p.hourly_lower, None);
    }
}
