use anyhow::Result;

use crate::error::IconError;

/// Extra uniform scale applied after the fit step, stored as a percentage.
///
/// Values are rounded to a thousandth of a percent so that `1.2` and `120`
/// compare equal and drive identical resizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalePercent(f64);

impl ScalePercent {
    pub const IDENTITY: ScalePercent = ScalePercent(100.0);

    pub fn from_percent(percent: f64) -> Result<Self> {
        if !percent.is_finite() || percent <= 0.0 {
            return Err(IconError::Usage(format!("scale must be positive, got {}", percent)).into());
        }
        Ok(ScalePercent((percent * 1000.0).round() / 1000.0))
    }

    /// Parse a bare integer percent (`120`), a decimal multiplier (`1.2`) or
    /// an explicit percent (`120%`, `1.5%`).
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();

        let percent = if let Some(digits) = value.strip_suffix('%') {
            digits.parse::<f64>().ok()
        } else if value.contains('.') {
            value.parse::<f64>().map(|multiplier| multiplier * 100.0).ok()
        } else {
            value.parse::<u32>().map(f64::from).ok()
        };

        match percent {
            Some(p) => Self::from_percent(p),
            None => Err(IconError::Usage(format!(
                "scale must be a percent (120) or a multiplier (1.2), got '{}'",
                value
            ))
            .into()),
        }
    }

    pub fn percent(&self) -> f64 {
        self.0
    }

    pub fn factor(&self) -> f64 {
        self.0 / 100.0
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for ScalePercent {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::str::FromStr for ScalePercent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ScalePercent::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_and_percent_are_equal() {
        assert_eq!(ScalePercent::parse("1.2").unwrap(), ScalePercent::parse("120").unwrap());
        assert_eq!(ScalePercent::parse("0.75").unwrap(), ScalePercent::parse("75").unwrap());
        assert_eq!(ScalePercent::parse("1.0").unwrap(), ScalePercent::IDENTITY);
    }

    #[test]
    fn test_percent_sign_is_accepted() {
        assert_eq!(ScalePercent::parse("80%").unwrap().percent(), 80.0);
    }

    #[test]
    fn test_percent_sign_wins_over_decimal_point() {
        assert_eq!(ScalePercent::parse("1.2%").unwrap().percent(), 1.2);
        assert_eq!(ScalePercent::parse("120.0%").unwrap(), ScalePercent::parse("1.2").unwrap());
    }

    #[test]
    fn test_identity() {
        assert!(ScalePercent::default().is_identity());
        assert!(ScalePercent::parse("100").unwrap().is_identity());
        assert!(!ScalePercent::parse("1.5").unwrap().is_identity());
        assert_eq!(ScalePercent::parse("1.5").unwrap().factor(), 1.5);
    }

    #[test]
    fn test_rejects_invalid_values() {
        for bad in ["", "abc", "0", "-20", "0.0", "1.2.3", "NaN", "%", "0%", "-5%", "inf%"] {
            let err = ScalePercent::parse(bad).unwrap_err();
            assert!(
                matches!(IconError::find(&err), Some(IconError::Usage(_))),
                "expected usage error for {:?}",
                bad
            );
        }
    }
}
