//! Quantity and price conversion between units of the same category.

use catalog_core::{DomainError, DomainResult, Entity};

use crate::uom::Uom;

/// Round `value` to the nearest multiple of `precision` (half away from zero).
///
/// A zero precision leaves the value untouched.
pub fn float_round(value: f64, precision: f64) -> f64 {
    if precision <= 0.0 || !precision.is_finite() {
        return value;
    }
    let steps = (value / precision).round();
    // Re-derive through the step count to shed representation noise (0.1 * 3).
    let decimals = decimals_of(precision);
    let rounded = steps * precision;
    let scale = 10f64.powi(decimals);
    (rounded * scale).round() / scale
}

fn decimals_of(precision: f64) -> i32 {
    let mut decimals = 0;
    let mut p = precision;
    while decimals < 12 && (p - p.round()).abs() > 1e-9 {
        p *= 10.0;
        decimals += 1;
    }
    decimals
}

fn ensure_same_category(from: &Uom, to: &Uom) -> DomainResult<()> {
    if !from.same_category(to) {
        return Err(DomainError::configuration(format!(
            "cannot convert from {} to {}: units belong to different categories",
            from.name(),
            to.name()
        )));
    }
    Ok(())
}

/// Convert a quantity expressed in `from` into `to`, rounded to `to`'s precision.
pub fn compute_quantity(qty: f64, from: &Uom, to: &Uom) -> DomainResult<f64> {
    if from.id() == to.id() {
        return Ok(qty);
    }
    ensure_same_category(from, to)?;
    let reference = qty / from.factor();
    Ok(float_round(reference * to.factor(), to.rounding()))
}

/// Convert a price per `from` unit into a price per `to` unit, rounded to
/// `to`'s precision.
///
/// Prices scale inversely to quantities: a price per unit times twelve is a
/// price per dozen.
pub fn compute_price(amount: f64, from: &Uom, to: &Uom) -> DomainResult<f64> {
    if from.id() == to.id() {
        return Ok(amount);
    }
    ensure_same_category(from, to)?;
    let reference = amount * from.factor();
    Ok(float_round(reference / to.factor(), to.rounding()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uom::UomCategory;

    struct Units {
        unit: Uom,
        dozen: Uom,
        kg: Uom,
        ton: Uom,
        gram: Uom,
    }

    fn units() -> Units {
        let count = UomCategory::new("Unit");
        let weight = UomCategory::new("Weight");
        Units {
            unit: Uom::reference("Unit", count.id, 0.01).unwrap(),
            dozen: Uom::bigger("Dozen", count.id, 12.0, 0.01).unwrap(),
            kg: Uom::reference("kg", weight.id, 0.01).unwrap(),
            ton: Uom::bigger("t", weight.id, 1000.0, 0.001).unwrap(),
            gram: Uom::smaller("g", weight.id, 1000.0, 1.0).unwrap(),
        }
    }

    #[test]
    fn float_round_snaps_to_precision() {
        assert_eq!(float_round(1.234, 0.01), 1.23);
        assert_eq!(float_round(1.236, 0.01), 1.24);
        assert_eq!(float_round(0.09000000000000001, 0.01), 0.09);
        assert_eq!(float_round(17.0, 5.0), 15.0);
        assert_eq!(float_round(3.3, 0.0), 3.3);
    }

    #[test]
    fn identity_conversion_is_untouched() {
        let u = units();
        assert_eq!(compute_quantity(1.23456, &u.unit, &u.unit).unwrap(), 1.23456);
        assert_eq!(compute_price(1.23456, &u.kg, &u.kg).unwrap(), 1.23456);
    }

    #[test]
    fn quantities_scale_with_unit_size() {
        let u = units();
        assert_eq!(compute_quantity(24.0, &u.unit, &u.dozen).unwrap(), 2.0);
        assert_eq!(compute_quantity(2.0, &u.dozen, &u.unit).unwrap(), 24.0);
        assert_eq!(compute_quantity(3500.0, &u.kg, &u.ton).unwrap(), 3.5);
        assert_eq!(compute_quantity(1.5, &u.kg, &u.gram).unwrap(), 1500.0);
    }

    #[test]
    fn prices_scale_inversely() {
        let u = units();
        assert_eq!(compute_price(63.0, &u.unit, &u.dozen).unwrap(), 756.0);
        assert_eq!(compute_price(100.0, &u.ton, &u.kg).unwrap(), 0.1);
        assert_eq!(compute_price(90.0, &u.ton, &u.kg).unwrap(), 0.09);
    }

    #[test]
    fn cross_category_conversion_is_a_configuration_error() {
        let u = units();
        let err = compute_price(10.0, &u.unit, &u.kg).unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
        let err = compute_quantity(10.0, &u.ton, &u.dozen).unwrap_err();
        assert!(err.is_configuration());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: converting a price there and back lands within one
            /// rounding step of each unit.
            #[test]
            fn price_round_trip_within_rounding(p in 0.0f64..100_000.0) {
                let u = units();
                let pairs = [(&u.unit, &u.dozen), (&u.kg, &u.ton), (&u.kg, &u.gram)];
                for (a, b) in pairs {
                    let there = compute_price(p, a, b).unwrap();
                    let back = compute_price(there, b, a).unwrap();
                    // Error from `b`'s rounding, carried back into `a`, plus `a`'s own.
                    let carried = b.rounding() * b.factor() / a.factor();
                    let tolerance = carried + a.rounding() + 1e-9;
                    prop_assert!((back - p).abs() <= tolerance, "{} -> {} -> {}", p, there, back);
                }
            }

            /// Property: unit price times twelve equals the dozen price.
            #[test]
            fn dozen_price_is_twelve_unit_prices(cents in 0u32..1_000_000) {
                let u = units();
                let p = f64::from(cents) / 100.0;
                let dozen = compute_price(p, &u.unit, &u.dozen).unwrap();
                prop_assert!((p * 12.0 - dozen).abs() < 1e-6);
            }
        }
    }
}
