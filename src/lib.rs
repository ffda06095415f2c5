pub mod math;
pub mod core;
pub mod bodies;
pub mod constraints;

/// Re-export common types for easier usage
pub use crate::core::{ConstraintConfig, LogLevel, LogSink};
pub use crate::bodies::{BodySlot, BodyStateProvider, RigidBodyState, SharedBodyState};
pub use crate::constraints::{ConstraintDynamicEffector, ConstraintLoad, DynamicEffector};
pub use crate::math::{Mrp, Vector3};

/// Error types for the constraint effector
pub mod error {
    use crate::bodies::BodySlot;
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum ConstraintError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Tried to attach body number {attempted}, a constraint links at most 2 bodies")]
        TooManyBodies { attempted: usize },

        #[error("No state linked for {0}")]
        BodyNotAttached(BodySlot),
    }
}

/// Result type for constraint effector operations
pub type Result<T> = std::result::Result<T, error::ConstraintError>;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
