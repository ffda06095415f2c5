mod vector;
mod matrix;
mod rotation;
mod frame;

pub use vector::Vector3;
pub use matrix::Matrix3;
pub use rotation::{EulerParameters, Mrp, PrincipalRotation, Rotation, ShadowSetPolicy};
pub use frame::{Body1, Body2, Dcm, Frame, FramedVector, Inertial};

/// Constant for a very small number, used for comparisons
pub const EPSILON: f64 = 1.0e-12;

