mod effector;
mod geometry;
mod runtime;
mod two_body;

pub use self::effector::DynamicEffector;
pub use self::geometry::{ConstraintGeometry, FeedbackGains};
pub use self::runtime::{CallPhase, ConstraintLoad, ConstraintRuntimeState, ConstraintViolation};
pub use self::two_body::{
    solve_constraint, ConstraintDynamicEffector, ConstraintSolution, MAX_BODIES,
};
