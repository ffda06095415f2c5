use crate::math::{Mrp, Vector3};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Snapshot of one rigid body's translational and rotational state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct RigidBodyState {
    /// Position of the body origin, inertial frame
    pub position: Vector3,

    /// Velocity of the body origin, inertial frame
    pub velocity: Vector3,

    /// Attitude of the body frame relative to the inertial frame
    pub attitude: Mrp,

    /// Angular velocity relative to the inertial frame, body frame components
    pub angular_velocity: Vector3,
}

impl RigidBodyState {
    /// Creates a body at rest at `position` with the identity attitude
    pub fn at_rest(position: Vector3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Sets the inertial velocity
    pub fn with_velocity(mut self, velocity: Vector3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the attitude
    pub fn with_attitude(mut self, attitude: Mrp) -> Self {
        self.attitude = attitude;
        self
    }

    /// Sets the body-frame angular velocity
    pub fn with_angular_velocity(mut self, angular_velocity: Vector3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }
}

/// Read-only access to a body's state, owned and integrated elsewhere.
///
/// The effector reads a fresh snapshot on every evaluation and never writes
/// through a provider.
pub trait BodyStateProvider: Send + Sync {
    /// Returns the current state of the body
    fn state(&self) -> RigidBodyState;
}

impl BodyStateProvider for RigidBodyState {
    fn state(&self) -> RigidBodyState {
        *self
    }
}

/// A body state shared between the integrator that owns it and any number of readers
#[derive(Clone, Default)]
pub struct SharedBodyState {
    inner: Arc<RwLock<RigidBodyState>>,
}

impl SharedBodyState {
    /// Creates a new shared cell holding `state`
    pub fn new(state: RigidBodyState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Replaces the stored state
    pub fn set(&self, state: RigidBodyState) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Modifies the stored state in place
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut RigidBodyState),
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard);
    }
}

impl BodyStateProvider for SharedBodyState {
    fn state(&self) -> RigidBodyState {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SharedBodyState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("SharedBodyState").field(&self.state()).finish()
    }
}
