//! Internal helpers for input validation and quantity arithmetic.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and the shortfall computation so the engine enforces
//! consistent invariants.

use rust_decimal::Decimal;

use crate::{EngineError, ResultEngine};

/// Trim a user-supplied name and reject blank values.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Quantities crossing the public API must be strictly positive.
pub(crate) fn ensure_positive_quantity(quantity: Decimal, label: &str) -> ResultEngine<()> {
    if quantity <= Decimal::ZERO {
        return Err(EngineError::InvalidQuantity(format!(
            "{label} must be > 0, got {quantity}"
        )));
    }
    Ok(())
}

/// Amount still needed to buy: `max(0, required - on_hand)`.
pub(crate) fn shortfall(required: Decimal, on_hand: Decimal) -> Decimal {
    (required - on_hand).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortfall_is_never_negative() {
        assert_eq!(
            shortfall(Decimal::from(500), Decimal::ZERO),
            Decimal::from(500)
        );
        assert_eq!(
            shortfall(Decimal::from(500), Decimal::from(200)),
            Decimal::from(300)
        );
        assert_eq!(shortfall(Decimal::from(500), Decimal::from(500)), Decimal::ZERO);
        assert_eq!(shortfall(Decimal::from(500), Decimal::from(900)), Decimal::ZERO);
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(normalize_required_name("  ", "ingredient").is_err());
        assert_eq!(
            normalize_required_name(" Arroz ", "ingredient").unwrap(),
            "Arroz"
        );
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        assert!(ensure_positive_quantity(Decimal::ZERO, "delta").is_err());
        assert!(ensure_positive_quantity(Decimal::from(-3), "delta").is_err());
        assert!(ensure_positive_quantity(Decimal::from(1), "delta").is_ok());
    }
}
