use crate::bodies::BodySlot;
use crate::math::{Body2, FramedVector, Inertial, Mrp, Vector3};

/// Which half of an evaluation pair the next call performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallPhase {
    /// The next call measures both bodies and computes the full load
    #[default]
    AwaitingFirstCall,

    /// The next call hands out the load cached by the previous call
    AwaitingSecondCall,
}

impl CallPhase {
    /// Returns `+1` before the first call of a pair and `-1` before the second
    #[inline]
    pub fn flag(self) -> i8 {
        match self {
            CallPhase::AwaitingFirstCall => 1,
            CallPhase::AwaitingSecondCall => -1,
        }
    }

    /// Returns the phase that follows this one
    #[inline]
    pub fn next(self) -> Self {
        match self {
            CallPhase::AwaitingFirstCall => CallPhase::AwaitingSecondCall,
            CallPhase::AwaitingSecondCall => CallPhase::AwaitingFirstCall,
        }
    }

    /// Returns the body a call in this phase is attributed to
    #[inline]
    pub fn slot(self) -> BodySlot {
        match self {
            CallPhase::AwaitingFirstCall => BodySlot::First,
            CallPhase::AwaitingSecondCall => BodySlot::Second,
        }
    }
}

/// Load cached between the two calls of an evaluation pair
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConstraintRuntimeState {
    cached_force: FramedVector<Inertial>,
    cached_torque_on_body2: FramedVector<Body2>,
    phase: CallPhase,
}

impl ConstraintRuntimeState {
    /// Clears the cache and returns to [`CallPhase::AwaitingFirstCall`]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    /// Force on body 1 computed by the last first call, inertial frame
    pub fn cached_force(&self) -> FramedVector<Inertial> {
        self.cached_force
    }

    /// Torque on body 2 computed by the last first call, body 2 frame
    pub fn cached_torque_on_body2(&self) -> FramedVector<Body2> {
        self.cached_torque_on_body2
    }

    /// Stores the results of a first call and advances the phase
    pub(crate) fn store(
        &mut self,
        force: FramedVector<Inertial>,
        torque_on_body2: FramedVector<Body2>,
    ) {
        self.cached_force = force;
        self.cached_torque_on_body2 = torque_on_body2;
        self.phase = self.phase.next();
    }

    /// Advances the phase without touching the cache
    pub(crate) fn advance(&mut self) {
        self.phase = self.phase.next();
    }
}

/// Force and torque contribution for one body's equations of motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintLoad {
    /// The body this load is attributed to
    pub slot: BodySlot,

    /// Force on the body, inertial frame
    pub force: FramedVector<Inertial>,

    /// Torque about the body origin, in that body's own frame
    pub torque: Vector3,
}

/// Constraint error terms measured by the last first call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintViolation {
    /// Positional violation `psi`
    pub psi: FramedVector<Inertial>,

    /// Rate of the positional violation seen from body 1
    pub psi_dot: FramedVector<Inertial>,

    /// Attitude of body 2 relative to body 1
    pub attitude_error: Mrp,

    /// Angular velocity of body 2 relative to body 1
    pub rate_error: FramedVector<Body2>,
}
