//! Frame-tagged vectors and direction cosine matrices.
//!
//! A [`FramedVector<F>`] carries the frame its components are expressed in,
//! and a [`Dcm<To, From>`] only accepts vectors expressed in `From`. Mixing
//! frames without an explicit rotation does not type-check.

use crate::math::{Matrix3, Mrp, Rotation, ShadowSetPolicy, Vector3};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Mul, Neg, Sub};

/// A reference frame marker
pub trait Frame: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// Short label used when formatting
    const NAME: &'static str;
}

/// The inertial frame `N`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inertial;

/// The body frame `B1` of the first attached body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Body1;

/// The body frame `B2` of the second attached body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Body2;

impl Frame for Inertial {
    const NAME: &'static str = "N";
}

impl Frame for Body1 {
    const NAME: &'static str = "B1";
}

impl Frame for Body2 {
    const NAME: &'static str = "B2";
}

/// A vector whose components are expressed in frame `F`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FramedVector<F: Frame> {
    vector: Vector3,
    _frame: PhantomData<F>,
}

impl<F: Frame> FramedVector<F> {
    /// Tags raw components with frame `F`
    #[inline]
    pub const fn new(vector: Vector3) -> Self {
        Self { vector, _frame: PhantomData }
    }

    #[inline]
    pub fn zero() -> Self {
        Self::new(Vector3::ZERO)
    }

    /// Returns the raw components
    #[inline]
    pub fn vector(&self) -> Vector3 {
        self.vector
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.vector.dot(&other.vector)
    }

    /// Cross product of two vectors expressed in the same frame
    #[inline]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(self.vector.cross(&other.vector))
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.vector.length()
    }
}

impl<F: Frame> fmt::Display for FramedVector<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.vector, F::NAME)
    }
}

impl<F: Frame> Add for FramedVector<F> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.vector + rhs.vector)
    }
}

impl<F: Frame> Sub for FramedVector<F> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.vector - rhs.vector)
    }
}

impl<F: Frame> Neg for FramedVector<F> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.vector)
    }
}

impl<F: Frame> Mul<f64> for FramedVector<F> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.vector * rhs)
    }
}

impl<F: Frame> Mul<FramedVector<F>> for f64 {
    type Output = FramedVector<F>;
    #[inline]
    fn mul(self, rhs: FramedVector<F>) -> Self::Output {
        FramedVector::new(rhs.vector * self)
    }
}

/// Direction cosine matrix `[To From]`, mapping `From` components into `To` components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dcm<To: Frame, From: Frame> {
    matrix: Matrix3,
    _frames: PhantomData<(To, From)>,
}

impl<To: Frame, From: Frame> Dcm<To, From> {
    /// Tags a raw rotation matrix. The caller asserts that `matrix` is `[To From]`.
    #[inline]
    pub fn new(matrix: Matrix3) -> Self {
        Self { matrix, _frames: PhantomData }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Builds `[To From]` from the MRP attitude of `To` relative to `From`
    #[inline]
    pub fn from_mrp(sigma: &Mrp) -> Self {
        Self::new(sigma.to_dcm())
    }

    /// Returns the raw matrix
    #[inline]
    pub fn matrix(&self) -> Matrix3 {
        self.matrix
    }

    /// Returns the inverse rotation `[From To]`
    #[inline]
    pub fn transpose(&self) -> Dcm<From, To> {
        Dcm::new(self.matrix.transpose())
    }

    /// Attitude of `To` relative to `From`, on the short-rotation branch
    #[inline]
    pub fn to_mrp(&self) -> Mrp {
        self.to_mrp_with_policy(ShadowSetPolicy::ShortRotation)
    }

    /// Attitude of `To` relative to `From` under the given shadow-set policy
    #[inline]
    pub fn to_mrp_with_policy(&self, policy: ShadowSetPolicy) -> Mrp {
        Mrp::from_dcm_with_policy(&self.matrix, policy)
    }
}

impl<To: Frame, From: Frame> Mul<FramedVector<From>> for Dcm<To, From> {
    type Output = FramedVector<To>;
    #[inline]
    fn mul(self, rhs: FramedVector<From>) -> Self::Output {
        FramedVector::new(self.matrix.multiply_vector(rhs.vector()))
    }
}

impl<To: Frame, Mid: Frame, From: Frame> Mul<Dcm<Mid, From>> for Dcm<To, Mid> {
    type Output = Dcm<To, From>;
    #[inline]
    fn mul(self, rhs: Dcm<Mid, From>) -> Self::Output {
        Dcm::new(self.matrix.multiply_matrix(&rhs.matrix))
    }
}
