//! Ternary projection - every value the network stores or emits is in {-1, 0, +1}
//!
//! Three sign-like functions do all of the squashing:
//!
//! - [`project`]: integer sign, zero stays zero
//! - [`float_project`]: real sign with a dead band of [`FLOAT_TOLERANCE`] around zero
//! - [`sign_project`]: integer sign with no zero case (zero goes to -1)
//!
//! # Example
//! ```
//! use parliament::{project, float_project, sign_project};
//!
//! assert_eq!(project(7), 1);
//! assert_eq!(float_project(1e-12), 0);
//! assert_eq!(sign_project(0), -1);
//! ```

/// A single ternary value. Always one of -1, 0, +1 outside an in-progress update.
pub type Trit = i8;

/// Dead band used by [`float_project`].
pub const FLOAT_TOLERANCE: f64 = 1e-10;

/// +1 if positive, -1 if negative, 0 otherwise.
#[inline]
pub const fn project(x: i32) -> Trit {
    if x > 0 {
        1
    } else if x < 0 {
        -1
    } else {
        0
    }
}

/// +1 above `FLOAT_TOLERANCE`, -1 below `-FLOAT_TOLERANCE`, 0 inside the band.
///
/// Near the band edge this does not agree with [`project`] applied to a rounded
/// input: `float_project(1e-11)` is 0 even though the value is positive.
#[inline]
pub fn float_project(x: f64) -> Trit {
    if x > FLOAT_TOLERANCE {
        1
    } else if x < -FLOAT_TOLERANCE {
        -1
    } else {
        0
    }
}

/// +1 if strictly positive, -1 otherwise. Never returns 0.
#[inline]
pub const fn sign_project(x: i32) -> Trit {
    if x > 0 {
        1
    } else {
        -1
    }
}

/// Is `x` a valid ternary value?
#[inline]
pub const fn is_trit(x: i32) -> bool {
    x >= -1 && x <= 1
}

/// Sign class of a weight - strictly {-1, 0, +1}
///
/// Used where a weight needs to be bucketed rather than computed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// Inhibitory weight
    Negative,
    /// Disconnected weight
    Zero,
    /// Excitatory weight
    Positive,
}

impl Polarity {
    /// Classify any integer by its sign
    #[inline]
    pub const fn of(value: i32) -> Self {
        match project(value) {
            1 => Self::Positive,
            -1 => Self::Negative,
            _ => Self::Zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_sign() {
        assert_eq!(project(0), 0);
        assert_eq!(project(1), 1);
        assert_eq!(project(12345), 1);
        assert_eq!(project(-1), -1);
        assert_eq!(project(i32::MIN), -1);
        assert_eq!(project(i32::MAX), 1);
    }

    #[test]
    fn test_project_idempotent() {
        for x in -1000..=1000 {
            let once = project(x);
            assert!(is_trit(once as i32));
            assert_eq!(project(once as i32), once);
        }
    }

    #[test]
    fn test_float_project_band() {
        assert_eq!(float_project(0.0), 0);
        assert_eq!(float_project(1e-11), 0);
        assert_eq!(float_project(-1e-11), 0);
        assert_eq!(float_project(FLOAT_TOLERANCE), 0);
        assert_eq!(float_project(-FLOAT_TOLERANCE), 0);
        assert_eq!(float_project(1e-9), 1);
        assert_eq!(float_project(-1e-9), -1);
        assert_eq!(float_project(2.5), 1);
        assert_eq!(float_project(-0.25), -1);
    }

    #[test]
    fn test_float_project_disagrees_near_band() {
        // A tiny positive value is "positive" to project but "zero" here
        let tiny: f64 = 5e-11;
        assert_eq!(project(tiny.ceil() as i32), 1);
        assert_eq!(float_project(tiny), 0);
    }

    #[test]
    fn test_sign_project_never_zero() {
        assert_eq!(sign_project(0), -1);
        assert_eq!(sign_project(3), 1);
        assert_eq!(sign_project(-3), -1);
        for x in -10..=10 {
            assert_ne!(sign_project(x), 0);
        }
    }

    #[test]
    fn test_polarity_of() {
        assert_eq!(Polarity::of(40), Polarity::Positive);
        assert_eq!(Polarity::of(-2), Polarity::Negative);
        assert_eq!(Polarity::of(0), Polarity::Zero);
        assert_eq!(Polarity::of(i32::MIN), Polarity::Negative);
    }
}
