//! Weight descriptors attached to transitions and to the stop choice.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stochastic::WeightError;

/// The one question the selector may ask a weight descriptor.
pub trait Likelihood {
    /// Non-negative relative weight; only ratios between candidates matter.
    fn relative_likelihood(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatWeight(pub f64);

impl Likelihood for FlatWeight {
    fn relative_likelihood(&self) -> f64 {
        self.0
    }
}

/// Firing-delay distribution of a timed transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    Immediate,
    Uniform { low: f64, high: f64 },
    Normal { mu: f64, sigma: f64 },
    Exponential { scale: f64 },
}

impl Distribution {
    fn check(&self) -> Result<(), String> {
        match *self {
            Distribution::Immediate => Ok(()),
            Distribution::Uniform { low, high } if low.is_finite() && high.is_finite() => {
                if low <= high {
                    Ok(())
                } else {
                    Err(format!("uniform bounds reversed: {low} > {high}"))
                }
            }
            Distribution::Normal { mu, sigma } if mu.is_finite() && sigma.is_finite() => {
                if sigma >= 0.0 {
                    Ok(())
                } else {
                    Err(format!("normal sigma must be non-negative, got {sigma}"))
                }
            }
            Distribution::Exponential { scale } if scale.is_finite() && scale > 0.0 => Ok(()),
            other => Err(format!("non-finite or out-of-range parameters in {other:?}")),
        }
    }
}

/// A weight that also carries the delay distribution observed for the transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedDistribution {
    pub weight: f64,
    pub distribution: Distribution,
}

impl Likelihood for TimedDistribution {
    fn relative_likelihood(&self) -> f64 {
        self.weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightDescriptor {
    Flat(FlatWeight),
    Timed(TimedDistribution),
}

impl WeightDescriptor {
    pub fn flat(weight: f64) -> Self {
        WeightDescriptor::Flat(FlatWeight(weight))
    }

    pub fn timed(weight: f64, distribution: Distribution) -> Self {
        WeightDescriptor::Timed(TimedDistribution {
            weight,
            distribution,
        })
    }

    /// Checks the weight is finite and non-negative and the distribution well formed.
    pub fn validate(&self) -> Result<(), WeightError> {
        let weight = self.relative_likelihood();
        if !weight.is_finite() || weight < 0.0 {
            return Err(WeightError::InvalidWeight(weight));
        }
        if let WeightDescriptor::Timed(timed) = self {
            timed
                .distribution
                .check()
                .map_err(WeightError::InvalidDistribution)?;
        }
        Ok(())
    }
}

impl Likelihood for WeightDescriptor {
    fn relative_likelihood(&self) -> f64 {
        match self {
            WeightDescriptor::Flat(flat) => flat.relative_likelihood(),
            WeightDescriptor::Timed(timed) => timed.relative_likelihood(),
        }
    }
}

impl From<f64> for WeightDescriptor {
    fn from(value: f64) -> Self {
        WeightDescriptor::flat(value)
    }
}

impl fmt::Display for WeightDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightDescriptor::Flat(flat) => write!(f, "{}", flat.0),
            WeightDescriptor::Timed(timed) => {
                write!(f, "{} ({:?})", timed.weight, timed.distribution)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_answer_the_same_query() {
        let flat = WeightDescriptor::flat(2.5);
        let timed = WeightDescriptor::timed(2.5, Distribution::Normal { mu: 3.0, sigma: 1.0 });
        assert_eq!(flat.relative_likelihood(), timed.relative_likelihood());
    }

    #[test]
    fn negative_and_nan_weights_are_rejected() {
        assert_eq!(
            WeightDescriptor::flat(-1.0).validate(),
            Err(WeightError::InvalidWeight(-1.0))
        );
        assert!(WeightDescriptor::flat(f64::NAN).validate().is_err());
        assert!(WeightDescriptor::flat(0.0).validate().is_ok());
    }

    #[test]
    fn malformed_distributions_are_rejected() {
        let reversed = WeightDescriptor::timed(1.0, Distribution::Uniform { low: 2.0, high: 1.0 });
        assert!(matches!(
            reversed.validate(),
            Err(WeightError::InvalidDistribution(_))
        ));
        let zero_scale = WeightDescriptor::timed(1.0, Distribution::Exponential { scale: 0.0 });
        assert!(zero_scale.validate().is_err());
    }

    #[test]
    fn descriptors_use_tagged_json() {
        let timed = WeightDescriptor::timed(1.0, Distribution::Immediate);
        let json = serde_json::to_string(&timed).unwrap();
        assert_eq!(json, r#"{"timed":{"weight":1.0,"distribution":"immediate"}}"#);
        assert_eq!(
            serde_json::from_str::<WeightDescriptor>(r#"{"flat":0.5}"#).unwrap(),
            WeightDescriptor::flat(0.5)
        );
    }
}
