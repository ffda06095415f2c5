//! Attitude parameterizations and their conversions.
//!
//! Every direction cosine matrix produced or consumed here is a passive
//! `[BN]` matrix: it maps vector components expressed in the reference frame
//! `N` into components expressed in the rotated frame `B`.

use approx::{AbsDiffEq, RelativeEq};
use crate::math::{Matrix3, Vector3};
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Common interface of the attitude parameterizations
pub trait Rotation {
    /// Returns the `[BN]` direction cosine matrix of this attitude
    fn to_dcm(&self) -> Matrix3;

    /// Returns the principal rotation angle in radians
    fn angle(&self) -> f64;

    /// Returns the unit principal rotation axis, or zero for the identity
    fn axis(&self) -> Vector3;

    /// Maps the `N`-frame components of `v` into `B`-frame components
    fn rotate_vector(&self, v: Vector3) -> Vector3 {
        self.to_dcm().multiply_vector(v)
    }
}

/// How a modified Rodrigues parameter set is chosen among itself and its shadow.
///
/// An MRP `sigma` and its shadow `-sigma / |sigma|^2` describe the same
/// attitude. The original set is singular at a 360 degree rotation and the
/// shadow set at the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ShadowSetPolicy {
    /// Keep `|sigma| <= 1`, switching to the shadow set whenever the norm
    /// exceeds one. This is the short-rotation branch and stays bounded for
    /// every attitude, including a rotation of exactly 180 degrees.
    #[default]
    ShortRotation,

    /// Return the parameters untouched.
    Unbounded,
}

/// Modified Rodrigues parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Mrp {
    sigma: Vector3,
}

impl Mrp {
    /// Creates a new MRP set from its three components
    #[inline]
    pub const fn new(s1: f64, s2: f64, s3: f64) -> Self {
        Self { sigma: Vector3::new(s1, s2, s3) }
    }

    /// Creates an MRP set from a vector of components
    #[inline]
    pub const fn from_vector(sigma: Vector3) -> Self {
        Self { sigma }
    }

    /// The identity attitude
    #[inline]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Returns the components as a vector
    #[inline]
    pub fn as_vector(&self) -> Vector3 {
        self.sigma
    }

    /// Returns `|sigma|^2`
    #[inline]
    pub fn norm_squared(&self) -> f64 {
        self.sigma.length_squared()
    }

    /// Returns the shadow set `-sigma / |sigma|^2`.
    ///
    /// The identity has no finite shadow; it is returned unchanged.
    pub fn shadow(&self) -> Self {
        let s2 = self.norm_squared();
        if s2 == 0.0 {
            return *self;
        }
        Self { sigma: -self.sigma / s2 }
    }

    /// Applies a shadow-set policy
    pub fn with_policy(&self, policy: ShadowSetPolicy) -> Self {
        match policy {
            ShadowSetPolicy::ShortRotation if self.norm_squared() > 1.0 => self.shadow(),
            _ => *self,
        }
    }

    /// Extracts the MRP set of a `[BN]` matrix under
    /// [`ShadowSetPolicy::ShortRotation`].
    pub fn from_dcm(dcm: &Matrix3) -> Self {
        Self::from_dcm_with_policy(dcm, ShadowSetPolicy::ShortRotation)
    }

    /// Extracts the MRP set of a `[BN]` matrix and applies `policy`.
    ///
    /// The extraction goes through Euler parameters with a non-negative scalar
    /// part, so the `1 + q0` denominator never drops below one. Near 180
    /// degrees rounding can leave `|sigma|` a hair above one; the short
    /// rotation policy folds such sets back onto the bounded branch.
    pub fn from_dcm_with_policy(dcm: &Matrix3, policy: ShadowSetPolicy) -> Self {
        EulerParameters::from_dcm(dcm).to_mrp().with_policy(policy)
    }

    /// Converts to a principal rotation vector.
    pub fn to_prv(&self) -> PrincipalRotation {
        let norm = self.sigma.length();
        if norm == 0.0 {
            return PrincipalRotation::identity();
        }
        let angle = 4.0 * norm.atan();
        PrincipalRotation::from_vector(self.sigma * (angle / norm))
    }

    /// Builds an MRP set from a principal rotation vector.
    ///
    /// Angles above 180 degrees give `|sigma| > 1`; apply
    /// [`ShadowSetPolicy::ShortRotation`] to fold them back.
    pub fn from_prv(prv: &PrincipalRotation) -> Self {
        let angle = prv.angle();
        if angle == 0.0 {
            return Self::identity();
        }
        Self { sigma: prv.as_vector() * ((angle / 4.0).tan() / angle) }
    }

    /// Converts to Euler parameters
    pub fn to_euler_parameters(&self) -> EulerParameters {
        let s2 = self.norm_squared();
        let denom = 1.0 + s2;
        EulerParameters::new(
            (1.0 - s2) / denom,
            2.0 * self.sigma.x / denom,
            2.0 * self.sigma.y / denom,
            2.0 * self.sigma.z / denom,
        )
    }
}

impl Rotation for Mrp {
    fn to_dcm(&self) -> Matrix3 {
        let s2 = self.norm_squared();
        let tilde = Matrix3::tilde(self.sigma);
        let tilde2 = tilde.multiply_matrix(&tilde);
        let denom = (1.0 + s2) * (1.0 + s2);

        Matrix3::identity() + (tilde2.scale(8.0) - tilde.scale(4.0 * (1.0 - s2))).scale(1.0 / denom)
    }

    fn angle(&self) -> f64 {
        4.0 * self.sigma.length().atan()
    }

    fn axis(&self) -> Vector3 {
        self.sigma.normalize()
    }
}

impl fmt::Display for Mrp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MRP{}", self.sigma)
    }
}

impl AbsDiffEq for Mrp {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.sigma.abs_diff_eq(&other.sigma, epsilon)
    }
}

impl RelativeEq for Mrp {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.sigma.relative_eq(&other.sigma, epsilon, max_relative)
    }
}

/// Principal rotation vector: the unit rotation axis scaled by the angle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct PrincipalRotation {
    vector: Vector3,
}

impl PrincipalRotation {
    /// Creates a principal rotation from an axis (normalized here) and an angle
    pub fn from_axis_angle(axis: Vector3, angle: f64) -> Self {
        Self { vector: axis.normalize() * angle }
    }

    /// Creates a principal rotation from its axis-times-angle vector
    #[inline]
    pub const fn from_vector(vector: Vector3) -> Self {
        Self { vector }
    }

    /// The zero rotation
    #[inline]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Returns the axis-times-angle vector
    #[inline]
    pub fn as_vector(&self) -> Vector3 {
        self.vector
    }

    /// Extracts the principal rotation of a `[BN]` matrix, with the angle in `[0, pi]`
    pub fn from_dcm(dcm: &Matrix3) -> Self {
        EulerParameters::from_dcm(dcm).to_prv()
    }

    /// Converts to modified Rodrigues parameters
    #[inline]
    pub fn to_mrp(&self) -> Mrp {
        Mrp::from_prv(self)
    }
}

impl Rotation for PrincipalRotation {
    fn to_dcm(&self) -> Matrix3 {
        let angle = self.angle();
        if angle == 0.0 {
            return Matrix3::identity();
        }
        let e = self.vector / angle;
        let (s, c) = angle.sin_cos();

        Matrix3::identity().scale(c) + e.outer(&e).scale(1.0 - c) - Matrix3::tilde(e).scale(s)
    }

    fn angle(&self) -> f64 {
        self.vector.length()
    }

    fn axis(&self) -> Vector3 {
        self.vector.normalize()
    }
}

/// Euler parameters (unit quaternion, scalar first)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct EulerParameters {
    /// Scalar part, `cos(angle / 2)`
    pub q0: f64,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

impl EulerParameters {
    /// Creates new Euler parameters
    #[inline]
    pub const fn new(q0: f64, q1: f64, q2: f64, q3: f64) -> Self {
        Self { q0, q1, q2, q3 }
    }

    /// The identity attitude
    #[inline]
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Returns the vector part
    #[inline]
    pub fn vector(&self) -> Vector3 {
        Vector3::new(self.q1, self.q2, self.q3)
    }

    /// Extracts Euler parameters from a `[BN]` matrix.
    ///
    /// Uses the largest of the four squared parameters as the pivot so no
    /// division is ever taken by a small number. The sign is chosen so that
    /// `q0 >= 0`.
    pub fn from_dcm(dcm: &Matrix3) -> Self {
        let c = &dcm.data;
        let tr = dcm.trace();
        let squares = [
            (1.0 + tr) / 4.0,
            (1.0 + 2.0 * c[0][0] - tr) / 4.0,
            (1.0 + 2.0 * c[1][1] - tr) / 4.0,
            (1.0 + 2.0 * c[2][2] - tr) / 4.0,
        ];
        let mut pivot = 0;
        for i in 1..4 {
            if squares[i] > squares[pivot] {
                pivot = i;
            }
        }

        let q = match pivot {
            0 => {
                let q0 = squares[0].sqrt();
                Self::new(
                    q0,
                    (c[1][2] - c[2][1]) / (4.0 * q0),
                    (c[2][0] - c[0][2]) / (4.0 * q0),
                    (c[0][1] - c[1][0]) / (4.0 * q0),
                )
            }
            1 => {
                let q1 = squares[1].sqrt();
                Self::new(
                    (c[1][2] - c[2][1]) / (4.0 * q1),
                    q1,
                    (c[0][1] + c[1][0]) / (4.0 * q1),
                    (c[2][0] + c[0][2]) / (4.0 * q1),
                )
            }
            2 => {
                let q2 = squares[2].sqrt();
                Self::new(
                    (c[2][0] - c[0][2]) / (4.0 * q2),
                    (c[0][1] + c[1][0]) / (4.0 * q2),
                    q2,
                    (c[1][2] + c[2][1]) / (4.0 * q2),
                )
            }
            _ => {
                let q3 = squares[3].sqrt();
                Self::new(
                    (c[0][1] - c[1][0]) / (4.0 * q3),
                    (c[2][0] + c[0][2]) / (4.0 * q3),
                    (c[1][2] + c[2][1]) / (4.0 * q3),
                    q3,
                )
            }
        };

        q.short_rotation()
    }

    /// Returns the equivalent set with `q0 >= 0`
    #[inline]
    pub fn short_rotation(&self) -> Self {
        if self.q0 < 0.0 {
            Self::new(-self.q0, -self.q1, -self.q2, -self.q3)
        } else {
            *self
        }
    }

    /// Converts to modified Rodrigues parameters on the branch selected by the sign of `q0`
    pub fn to_mrp(&self) -> Mrp {
        let q = self.short_rotation();
        Mrp::from_vector(q.vector() / (1.0 + q.q0))
    }

    /// Converts to a principal rotation vector with the angle in `[0, pi]`
    pub fn to_prv(&self) -> PrincipalRotation {
        let q = self.short_rotation();
        let v = q.vector();
        let sin_half = v.length();
        if sin_half == 0.0 {
            return PrincipalRotation::identity();
        }
        let angle = 2.0 * sin_half.atan2(q.q0);
        PrincipalRotation::from_vector(v * (angle / sin_half))
    }
}

impl Rotation for EulerParameters {
    fn to_dcm(&self) -> Matrix3 {
        let Self { q0, q1, q2, q3 } = *self;

        Matrix3 {
            data: [
                [
                    q0 * q0 + q1 * q1 - q2 * q2 - q3 * q3,
                    2.0 * (q1 * q2 + q0 * q3),
                    2.0 * (q1 * q3 - q0 * q2),
                ],
                [
                    2.0 * (q1 * q2 - q0 * q3),
                    q0 * q0 - q1 * q1 + q2 * q2 - q3 * q3,
                    2.0 * (q2 * q3 + q0 * q1),
                ],
                [
                    2.0 * (q1 * q3 + q0 * q2),
                    2.0 * (q2 * q3 - q0 * q1),
                    q0 * q0 - q1 * q1 - q2 * q2 + q3 * q3,
                ],
            ],
        }
    }

    fn angle(&self) -> f64 {
        let q = self.short_rotation();
        2.0 * q.vector().length().atan2(q.q0)
    }

    fn axis(&self) -> Vector3 {
        self.short_rotation().vector().normalize()
    }
}

impl fmt::Display for EulerParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.q0, self.q1, self.q2, self.q3)
    }
}
