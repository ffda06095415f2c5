use crate::bodies::{BodySlot, BodyStateProvider};
use crate::math::Vector3;
use crate::Result;
use std::any::Any;
use std::sync::Arc;

/// An effector that contributes external force and torque to attached bodies
pub trait DynamicEffector: Send + Sync + 'static {
    /// Returns the type name of the effector
    fn effector_type(&self) -> &'static str;

    /// Links the state of one more body to the effector
    fn link_in_states(&mut self, provider: Arc<dyn BodyStateProvider>) -> Result<BodySlot>;

    /// Prepares the effector for a new run
    fn reset(&mut self) -> Result<()>;

    /// Computes the force and torque for the body whose dynamics are being evaluated
    fn compute_force_torque(&mut self, integ_time: f64, time_step: f64) -> Result<()>;

    /// External force from the last computation, inertial frame
    fn force_external_n(&self) -> Vector3;

    /// External torque about the body origin from the last computation, body frame
    fn torque_external_pnt_b_b(&self) -> Vector3;

    /// Scheduled update outside the dynamics evaluation
    fn update_state(&mut self, _current_sim_nanos: u64) {}

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Returns a dynamic mutable reference to any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
