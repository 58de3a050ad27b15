use crate::constants::LOGODDS_CLAMP;
use crate::errors::{EvaluationError, Result};

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(&String::from(", "));
    }
    s
}

// Validation
pub fn validate_fraction_parameter(value: f64, parameter: &str) -> Result<()> {
    if value.is_nan() || value <= 0.0 || 1.0 < value {
        Err(EvaluationError::InvalidInput(format!(
            "Invalid parameter value passed for {}, expected real value within range (0, 1] but {} provided.",
            parameter, value
        )))
    } else {
        Ok(())
    }
}

pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<()> {
    if value.is_nan() || value < min || max < value {
        Err(EvaluationError::InvalidInput(format!(
            "Invalid parameter value passed for {}, expected real value within range [{}, {}] but {} provided.",
            parameter, min, max, value
        )))
    } else {
        Ok(())
    }
}

/// Log odds of a rate, saturating at `LOGODDS_CLAMP`.
///
/// `ln(rate / (1 - rate))` is infinite at both ends of the unit interval, so a
/// rate of exactly `1.0` maps to `+LOGODDS_CLAMP` and a rate of exactly `0.0`
/// to `-LOGODDS_CLAMP`. Everything handed to the visualization and table
/// collaborators therefore stays finite.
///
/// The sign follows `ln(rate / (1 - rate))` on purpose. Do not flip the clamped
/// ends to `logodds(0.0) = +LOGODDS_CLAMP`: the log odds must stay increasing
/// in the rate.
#[inline]
pub fn logodds(rate: f64) -> f64 {
    if rate >= 1.0 {
        LOGODDS_CLAMP
    } else if rate <= 0.0 {
        -LOGODDS_CLAMP
    } else {
        (rate / (1.0 - rate)).ln()
    }
}

/// Quantile of an already sorted slice, interpolating linearly between
/// the two closest order statistics.
///
/// * `sorted` - Values sorted in ascending order, must be non empty.
/// * `q` - Quantile in [0, 1].
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}

/// Quantile of an unsorted slice.
pub fn quantile(v: &[f64], q: f64) -> Result<f64> {
    if v.is_empty() {
        return Err(EvaluationError::DegenerateGroup(
            "Quantile of an empty set of values is undefined.".to_string(),
        ));
    }
    validate_float_parameter(q, 0.0, 1.0, "q")?;
    let mut sorted = v.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    Ok(quantile_sorted(&sorted, q))
}

/// Percentile, `p` expressed in [0, 100].
pub fn percentile(v: &[f64], p: f64) -> Result<f64> {
    validate_float_parameter(p, 0.0, 100.0, "percentile")?;
    quantile(v, p / 100.0)
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        None
    } else {
        Some(v.iter().sum::<f64>() / v.len() as f64)
    }
}

pub fn precision_round(n: f64, precision: i32) -> f64 {
    let p = (10.0_f64).powi(precision);
    (n * p).round() / p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logodds_clamp() {
        assert_eq!(logodds(1.0), 10.0);
        assert_eq!(logodds(0.0), -10.0);
        assert!(logodds(0.0) < logodds(0.01) && logodds(0.99) < logodds(1.0));
        assert_eq!(logodds(0.5), 0.0);
        assert_eq!(precision_round(logodds(0.75), 6), precision_round(3.0_f64.ln(), 6));
    }

    #[test]
    fn test_logodds_inverts_odds() {
        for v in [-3.0_f64, -0.5, 0.0, 0.25, 2.0] {
            let rate = 1. / (1. + (-v).exp());
            assert_eq!(precision_round(logodds(rate), 8), v);
        }
    }

    #[test]
    fn test_quantile_interpolation() {
        let v = vec![9., 8., 7., 6., 5., 4., 3., 2., 1., 0.];
        assert_eq!(precision_round(quantile(&v, 0.7).unwrap(), 6), 6.3);
        assert_eq!(quantile(&v, 0.0).unwrap(), 0.0);
        assert_eq!(quantile(&v, 1.0).unwrap(), 9.0);
        assert_eq!(quantile(&v, 0.5).unwrap(), 4.5);
    }

    #[test]
    fn test_percentile() {
        let v = vec![1., 2., 3., 4., 5.];
        assert_eq!(percentile(&v, 50.0).unwrap(), 3.0);
        assert_eq!(precision_round(percentile(&v, 10.0).unwrap(), 6), 1.4);
        assert!(percentile(&v, 101.0).is_err());
    }

    #[test]
    fn test_quantile_empty() {
        let err = quantile(&[], 0.5).unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_validate_fraction() {
        assert!(validate_fraction_parameter(1.0, "p").is_ok());
        assert!(validate_fraction_parameter(0.0, "p").is_err());
        assert!(validate_fraction_parameter(f64::NAN, "p").is_err());
        assert!(validate_fraction_parameter(1.5, "p").is_err());
    }
}
