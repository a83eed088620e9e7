//! Totals arithmetic check.

use rust_decimal::Decimal;

use crate::models::receipt::ValidationStatus;

/// Monetary fields that take part in the totals check.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub tip: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub total: Option<Decimal>,
}

/// Outcome of [`validate_totals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    pub status: ValidationStatus,
    /// `subtotal + tax + tip - discount` rounded to cents; `None` when it
    /// cannot be computed.
    pub calculated_total: Option<Decimal>,
}

/// Check `subtotal + tax + tip - discount` against `total`.
///
/// Subtotal and total are required; tax, tip and discount count as zero when
/// missing. The calculated total is rounded to cents, and the totals agree
/// when they differ by at most `tolerance`. Amounts too large to sum are a
/// mismatch with no calculated total.
pub fn validate_totals(totals: &Totals, tolerance: Decimal) -> Validation {
    let (Some(subtotal), Some(total)) = (totals.subtotal, totals.total) else {
        return Validation {
            status: ValidationStatus::InsufficientData,
            calculated_total: None,
        };
    };

    let Some(calculated) = subtotal
        .checked_add(totals.tax.unwrap_or_default())
        .and_then(|v| v.checked_add(totals.tip.unwrap_or_default()))
        .and_then(|v| v.checked_sub(totals.discount.unwrap_or_default()))
        .map(|v| v.round_dp(2))
    else {
        return Validation {
            status: ValidationStatus::Mismatch,
            calculated_total: None,
        };
    };

    let agrees = calculated
        .checked_sub(total)
        .is_some_and(|diff| diff.abs() <= tolerance);
    let status = if agrees {
        ValidationStatus::Ok
    } else {
        ValidationStatus::Mismatch
    };

    Validation {
        status,
        calculated_total: Some(calculated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tolerance() -> Decimal {
        dec("0.02")
    }

    fn totals(sub: &str, tax: &str, tip: &str, discount: &str, total: &str) -> Totals {
        Totals {
            subtotal: Some(dec(sub)),
            tax: Some(dec(tax)),
            tip: Some(dec(tip)),
            discount: Some(dec(discount)),
            total: Some(dec(total)),
        }
    }

    #[test]
    fn test_exact_totals_are_ok() {
        let cases = [
            ("40.00", "3.20", "0", "0", "43.20"),
            ("12.99", "1.04", "2.00", "1.50", "14.53"),
            ("0", "0", "0", "0", "0"),
            ("100", "0", "15", "20", "95"),
            ("9999.99", "800.00", "0.01", "0", "10800.00"),
        ];
        for (sub, tax, tip, discount, total) in cases {
            let result = validate_totals(&totals(sub, tax, tip, discount, total), tolerance());
            assert_eq!(result.status, ValidationStatus::Ok, "{} {} {} {} {}", sub, tax, tip, discount, total);
            assert_eq!(result.calculated_total, Some(dec(total)));
        }
    }

    #[test]
    fn test_within_tolerance_is_ok() {
        let result = validate_totals(&totals("10.00", "0.80", "0", "0", "10.82"), tolerance());
        assert_eq!(result.status, ValidationStatus::Ok);
        let result = validate_totals(&totals("10.00", "0.80", "0", "0", "10.78"), tolerance());
        assert_eq!(result.status, ValidationStatus::Ok);
    }

    #[test]
    fn test_beyond_tolerance_is_mismatch() {
        for delta in ["0.03", "-0.03", "1.00", "-250"] {
            let base = dec("43.20");
            let total = (base + dec(delta)).to_string();
            let result = validate_totals(&totals("40.00", "3.20", "0", "0", &total), tolerance());
            assert_eq!(result.status, ValidationStatus::Mismatch, "delta {}", delta);
            assert_eq!(result.calculated_total, Some(base));
        }
    }

    #[test]
    fn test_missing_optional_fields_count_as_zero() {
        let result = validate_totals(
            &Totals {
                subtotal: Some(dec("20.00")),
                total: Some(dec("20.00")),
                ..Totals::default()
            },
            tolerance(),
        );
        assert_eq!(result.status, ValidationStatus::Ok);
    }

    #[test]
    fn test_missing_subtotal_or_total_is_insufficient() {
        let mut t = totals("40.00", "3.20", "1", "1", "43.20");
        t.subtotal = None;
        assert_eq!(validate_totals(&t, tolerance()).status, ValidationStatus::InsufficientData);
        assert_eq!(validate_totals(&t, tolerance()).calculated_total, None);

        let mut t = totals("40.00", "3.20", "1", "1", "43.20");
        t.total = None;
        assert_eq!(validate_totals(&t, tolerance()).status, ValidationStatus::InsufficientData);

        assert_eq!(
            validate_totals(&Totals::default(), tolerance()).status,
            ValidationStatus::InsufficientData
        );
    }

    #[test]
    fn test_calculated_total_is_rounded_to_cents() {
        let result = validate_totals(&totals("388.80", "32.108475", "0", "0", "420.91"), tolerance());
        assert_eq!(result.calculated_total, Some(dec("420.91")));
        assert_eq!(result.status, ValidationStatus::Ok);
    }

    #[test]
    fn test_overflowing_amounts_are_a_mismatch() {
        let huge = dec("50000000000000000000000000000");
        let t = Totals {
            subtotal: Some(huge),
            tax: Some(huge),
            total: Some(huge),
            ..Totals::default()
        };
        let result = validate_totals(&t, tolerance());
        assert_eq!(result.status, ValidationStatus::Mismatch);
        assert_eq!(result.calculated_total, None);

        let t = Totals {
            subtotal: Some(huge),
            total: Some(-huge),
            ..Totals::default()
        };
        assert_eq!(validate_totals(&t, tolerance()).status, ValidationStatus::Mismatch);
    }
}
