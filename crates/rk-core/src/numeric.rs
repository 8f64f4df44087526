use crate::CoreError;

/// Floating point type of amounts, conditions and properties.
pub type Real = f64;

/// Reject NaN and infinities at an input boundary.
pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Like [`ensure_finite`], also rejecting negative values.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if ensure_finite(v, what)? < 0.0 {
        return Err(CoreError::OutOfRange {
            value: v,
            reason: format!("{what} must be non-negative"),
        });
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn negative_amounts_are_out_of_range() {
        assert_eq!(ensure_non_negative(0.0, "amount").unwrap(), 0.0);
        assert!(matches!(
            ensure_non_negative(-1e-3, "amount"),
            Err(CoreError::OutOfRange { .. })
        ));
        assert!(matches!(
            ensure_non_negative(Real::INFINITY, "amount"),
            Err(CoreError::NonFinite { .. })
        ));
    }
}
