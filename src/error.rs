//! Errors raised by the radiator model

use std::fmt;
use std::error::Error;

/// Why did a configuration change or a rate evaluation fail?
#[derive(Clone, PartialEq)]
pub enum RadiatorError {
    /// A stored or requested configuration value is out of range:
    /// the name of the parameter, its value and what was expected.
    InvalidConfiguration(String, String, String),
    /// A kinematic argument is outside its domain:
    /// the name of the argument, its value and the allowed domain.
    InvalidKinematics(String, f64, String),
    /// A numerical procedure did not reach its target accuracy.
    /// Carries a description and the best estimate obtained.
    Convergence(String, f64),
    /// A ratio was requested whose denominator vanishes.
    Degenerate(String),
}

impl fmt::Display for RadiatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RadiatorError::InvalidConfiguration(name, value, expected) =>
                write!(f, "invalid configuration: {} = {} (expected {})", name, value, expected),
            RadiatorError::InvalidKinematics(name, value, domain) =>
                write!(f, "invalid kinematics: {} = {:e} lies outside {}", name, value, domain),
            RadiatorError::Convergence(what, estimate) =>
                write!(f, "failed to converge: {} (best estimate {:e})", what, estimate),
            RadiatorError::Degenerate(what) =>
                write!(f, "degenerate ratio: {}", what),
        }
    }
}

impl fmt::Debug for RadiatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Error for RadiatorError {}

impl RadiatorError {
    pub fn config<V: fmt::Display>(name: &str, value: V, expected: &str) -> Self {
        Self::InvalidConfiguration(name.to_owned(), value.to_string(), expected.to_owned())
    }

    pub fn kinematics(name: &str, value: f64, domain: &str) -> Self {
        Self::InvalidKinematics(name.to_owned(), value, domain.to_owned())
    }

    pub fn convergence(what: &str, estimate: f64) -> Self {
        Self::Convergence(what.to_owned(), estimate)
    }

    pub fn degenerate(what: &str) -> Self {
        Self::Degenerate(what.to_owned())
    }

    /// Is this a numerical failure, rather than a misuse of the API?
    /// Callers may choose to retry these with relaxed settings.
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::Convergence(..) | Self::Degenerate(..))
    }

    /// The best estimate carried by a convergence failure.
    pub fn estimate(&self) -> Option<f64> {
        match self {
            Self::Convergence(_, estimate) => Some(*estimate),
            _ => None,
        }
    }
}

/// Checks that `x` lies strictly inside (0, 1).
pub(crate) fn check_fraction(x: f64) -> Result<f64, RadiatorError> {
    if x > 0.0 && x < 1.0 {
        Ok(x)
    } else {
        Err(RadiatorError::kinematics("x", x, "(0, 1)"))
    }
}

/// Checks that the squared emission angle is non-negative and finite.
pub(crate) fn check_theta2(theta2: f64) -> Result<f64, RadiatorError> {
    if theta2 >= 0.0 && theta2.is_finite() {
        Ok(theta2)
    } else {
        Err(RadiatorError::kinematics("theta2", theta2, "[0, inf)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains() {
        assert!(check_fraction(0.5).is_ok());
        assert!(check_fraction(0.0).is_err());
        assert!(check_fraction(1.0).is_err());
        assert!(check_fraction(f64::NAN).is_err());
        assert!(check_theta2(0.0).is_ok());
        assert!(check_theta2(-1.0e-12).is_err());
    }

    #[test]
    fn classification() {
        let e = RadiatorError::config("thickness", -1.0, "> 0 m");
        println!("{}", e);
        assert!(!e.is_numerical());
        let e = RadiatorError::convergence("lattice sum", 1.0);
        println!("{}", e);
        assert!(e.is_numerical());
        assert_eq!(e.estimate(), Some(1.0));
        assert_eq!(RadiatorError::degenerate("polarization").estimate(), None);
    }
}
