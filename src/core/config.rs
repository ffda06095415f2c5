use crate::error::ConstraintError;
use crate::math::Vector3;
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// User-facing parameters of a two-body constraint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ConstraintConfig {
    /// Attachment point P1 relative to the body 1 origin, body 1 frame
    pub offset1: Vector3,

    /// Attachment point P2 relative to the body 2 origin, body 2 frame
    pub offset2: Vector3,

    /// Undeformed offset from P1 to P2 in the body 1 frame.
    /// `None` captures it from the body states at reset.
    pub reference_separation: Option<Vector3>,

    /// Translational stiffness parameter; stiffness is `alpha^2`
    pub alpha: f64,

    /// Translational damping parameter; damping is `2 * beta`
    pub beta: f64,

    /// Rotational stiffness `K` acting on the relative MRP error
    pub attitude_stiffness: f64,

    /// Rotational damping `P` acting on the relative angular velocity
    pub attitude_damping: f64,

    /// Translational integral gain `kI`. Not applied by the force law; zeroed at reset.
    pub integral_gain: f64,

    /// Rotational integral gain `kI_att`. Not applied by the torque law; zeroed at reset.
    pub attitude_integral_gain: f64,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            offset1: Vector3::ZERO,
            offset2: Vector3::ZERO,
            reference_separation: None,
            alpha: 0.0,
            beta: 0.0,
            attitude_stiffness: 0.0,
            attitude_damping: 0.0,
            integral_gain: 0.0,
            attitude_integral_gain: 0.0,
        }
    }
}

impl ConstraintConfig {
    /// Checks that every value is finite
    pub fn validate(&self) -> Result<()> {
        let vectors = [
            ("offset1", Some(self.offset1)),
            ("offset2", Some(self.offset2)),
            ("reference_separation", self.reference_separation),
        ];
        for (name, value) in vectors {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ConstraintError::InvalidParameter(format!(
                        "{} must be finite, got {}",
                        name, v
                    )));
                }
            }
        }

        let scalars = [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("attitude_stiffness", self.attitude_stiffness),
            ("attitude_damping", self.attitude_damping),
            ("integral_gain", self.integral_gain),
            ("attitude_integral_gain", self.attitude_integral_gain),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConstraintError::InvalidParameter(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
