use crate::bodies::{BodySlot, BodyStateProvider, RigidBodyState};
use crate::constraints::{
    CallPhase, ConstraintGeometry, ConstraintLoad, ConstraintRuntimeState, ConstraintViolation,
    DynamicEffector, FeedbackGains,
};
use crate::core::{ConstraintConfig, LogLevel, LogSink, TracingSink};
use crate::error::ConstraintError;
use crate::math::{Body1, Body2, Dcm, FramedVector, Inertial, Vector3};
use crate::Result;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Maximum number of bodies a constraint links
pub const MAX_BODIES: usize = 2;

/// Loads produced by one full evaluation of the constraint law
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintSolution {
    /// Force on body 1; body 2 receives the negation
    pub force: FramedVector<Inertial>,

    /// Torque on body 1 about its origin
    pub torque_on_body1: FramedVector<Body1>,

    /// Torque on body 2 about its origin, including the attitude feedback
    pub torque_on_body2: FramedVector<Body2>,

    /// Error terms the loads were computed from
    pub violation: ConstraintViolation,
}

/// Evaluates the constraint law for a pair of body states.
///
/// The positional violation `psi` is the offset from P1 to P2 minus the
/// reference separation carried along with body 1. The force on body 1 is
/// `k psi + c psi_dot`, and body 2 receives its negation at P2 plus the
/// attitude feedback `-K sigma_B2B1 - P omega_B2B1`.
pub fn solve_constraint(
    geometry: &ConstraintGeometry,
    gains: &FeedbackGains,
    body1: &RigidBodyState,
    body2: &RigidBodyState,
) -> ConstraintSolution {
    let r_b1n_n = FramedVector::<Inertial>::new(body1.position);
    let r_b2n_n = FramedVector::<Inertial>::new(body2.position);
    let rdot_b1n_n = FramedVector::<Inertial>::new(body1.velocity);
    let rdot_b2n_n = FramedVector::<Inertial>::new(body2.velocity);
    let omega_b1n_b1 = FramedVector::<Body1>::new(body1.angular_velocity);
    let omega_b2n_b2 = FramedVector::<Body2>::new(body2.angular_velocity);

    let dcm_b1n: Dcm<Body1, Inertial> = Dcm::from_mrp(&body1.attitude);
    let dcm_b2n: Dcm<Body2, Inertial> = Dcm::from_mrp(&body2.attitude);
    let dcm_nb1 = dcm_b1n.transpose();
    let dcm_nb2 = dcm_b2n.transpose();

    let r_p1b1_b1 = geometry.offset1();
    let r_p2b2_b2 = geometry.offset2();

    // positional violation
    let r_p1b1_n = dcm_nb1 * r_p1b1_b1;
    let r_p2b2_n = dcm_nb2 * r_p2b2_b2;
    let r_p2p1_n = r_p2b2_n + r_b2n_n - r_p1b1_n - r_b1n_n;
    let psi_n = r_p2p1_n - dcm_nb1 * geometry.reference_separation();

    // rate of the violation as seen from body 1
    let rdot_p1n_n = rdot_b1n_n + dcm_nb1 * omega_b1n_b1.cross(&r_p1b1_b1);
    let rdot_p2n_n = rdot_b2n_n + dcm_nb2 * omega_b2n_b2.cross(&r_p2b2_b2);
    let omega_b1n_n = dcm_nb1 * omega_b1n_b1;
    let psi_dot_n = (rdot_p2n_n - rdot_p1n_n) - omega_b1n_n.cross(&r_p2p1_n);

    // relative attitude and rate, body 2 frame
    let dcm_b2b1 = dcm_b2n * dcm_nb1;
    let omega_b2b1_b2 = omega_b2n_b2 - dcm_b2b1 * omega_b1n_b1;
    let sigma_b2b1 = dcm_b2b1.to_mrp();

    let force_n = gains.stiffness() * psi_n + gains.damping() * psi_dot_n;

    let torque_b1 = r_p1b1_b1.cross(&(dcm_b1n * force_n));
    let torque_b2_translational = r_p2b2_b2.cross(&(dcm_b2n * -force_n));
    let torque_b2_attitude = FramedVector::<Body2>::new(sigma_b2b1.as_vector())
        * -gains.attitude_stiffness()
        - omega_b2b1_b2 * gains.attitude_damping();

    ConstraintSolution {
        force: force_n,
        torque_on_body1: torque_b1,
        torque_on_body2: torque_b2_translational + torque_b2_attitude,
        violation: ConstraintViolation {
            psi: psi_n,
            psi_dot: psi_dot_n,
            attitude_error: sigma_b2b1,
            rate_error: omega_b2b1_b2,
        },
    }
}

/// Compliant holonomic constraint joining two rigid bodies.
///
/// # Call protocol
///
/// Once per evaluation of the multi-body dynamics the host must call
/// [`ConstraintDynamicEffector::evaluate`] (or the
/// [`DynamicEffector::compute_force_torque`] wrapper) exactly twice: the
/// first call of the pair is attributed to body 1 and computes the full
/// load, the second is attributed to body 2 and receives the cached
/// reaction. Calls that skip or repeat a half of the pair are not detected
/// and silently hand the wrong load to the wrong body.
pub struct ConstraintDynamicEffector {
    geometry: ConstraintGeometry,
    gains: FeedbackGains,
    runtime: ConstraintRuntimeState,
    bodies: [Option<Arc<dyn BodyStateProvider>>; MAX_BODIES],
    logger: Arc<dyn LogSink>,
    force_external_n: Vector3,
    torque_external_pnt_b_b: Vector3,
    last_violation: Option<ConstraintViolation>,
}

impl ConstraintDynamicEffector {
    /// Creates an effector with the given configuration, logging through `tracing`
    pub fn new(config: ConstraintConfig) -> Result<Self> {
        Self::with_logger(config, Arc::new(TracingSink))
    }

    /// Creates an effector reporting configuration errors to `logger`
    pub fn with_logger(config: ConstraintConfig, logger: Arc<dyn LogSink>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            geometry: ConstraintGeometry::from_config(&config),
            gains: FeedbackGains::from_config(&config),
            runtime: ConstraintRuntimeState::default(),
            bodies: [None, None],
            logger,
            force_external_n: Vector3::ZERO,
            torque_external_pnt_b_b: Vector3::ZERO,
            last_violation: None,
        })
    }

    /// Links a body to the next free slot.
    ///
    /// A third attachment is logged as an error and rejected; the two
    /// existing links are left untouched.
    pub fn attach(&mut self, provider: Arc<dyn BodyStateProvider>) -> Result<BodySlot> {
        let count = self.attached_count();
        let slot = match BodySlot::from_index(count) {
            Some(slot) => slot,
            None => {
                self.logger.log(
                    LogLevel::Error,
                    "constraintDynamicEffector: tried to attach more than 2 bodies",
                );
                return Err(ConstraintError::TooManyBodies { attempted: count + 1 });
            }
        };

        self.bodies[slot.index()] = Some(provider);
        tracing::debug!("constraint effector linked {}", slot);
        Ok(slot)
    }

    /// Returns the number of linked bodies (0, 1 or 2)
    pub fn attached_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.is_some()).count()
    }

    /// Prepares a new run.
    ///
    /// Derives `k` and `c` from `alpha` and `beta`, zeroes the integral
    /// gains, captures the reference separation and clears the call cache.
    pub fn reset(&mut self) -> Result<()> {
        if self.geometry.needs_body_states() {
            let body1 = self.read_state(BodySlot::First)?;
            let body2 = self.read_state(BodySlot::Second)?;
            self.geometry.capture_reference(Some((&body1, &body2)));
        } else {
            self.geometry.capture_reference(None);
        }

        self.gains.reset();
        self.runtime.reset();
        self.force_external_n = Vector3::ZERO;
        self.torque_external_pnt_b_b = Vector3::ZERO;
        self.last_violation = None;

        tracing::debug!(
            stiffness = self.gains.stiffness(),
            damping = self.gains.damping(),
            "constraint effector reset, reference separation {}",
            self.geometry.reference_separation()
        );
        Ok(())
    }

    /// Performs one half of an evaluation pair and returns that body's load.
    ///
    /// See the type-level documentation for the required call order.
    pub fn evaluate(&mut self) -> Result<ConstraintLoad> {
        let phase = self.runtime.phase();
        let load = match phase {
            CallPhase::AwaitingFirstCall => {
                let body1 = self.read_state(BodySlot::First)?;
                let body2 = self.read_state(BodySlot::Second)?;
                let solution = solve_constraint(&self.geometry, &self.gains, &body1, &body2);

                self.runtime.store(solution.force, solution.torque_on_body2);
                self.last_violation = Some(solution.violation);

                ConstraintLoad {
                    slot: phase.slot(),
                    force: solution.force,
                    torque: solution.torque_on_body1.vector(),
                }
            }
            CallPhase::AwaitingSecondCall => {
                let load = ConstraintLoad {
                    slot: phase.slot(),
                    force: -self.runtime.cached_force(),
                    torque: self.runtime.cached_torque_on_body2().vector(),
                };
                self.runtime.advance();
                load
            }
        };

        self.force_external_n = load.force.vector();
        self.torque_external_pnt_b_b = load.torque;
        Ok(load)
    }

    /// Returns the phase the next call will run in
    pub fn call_phase(&self) -> CallPhase {
        self.runtime.phase()
    }

    /// Returns `+1` before the first call of a pair, `-1` before the second
    pub fn alternation_flag(&self) -> i8 {
        self.runtime.phase().flag()
    }

    /// Returns the cache shared between the two calls of a pair
    pub fn runtime_state(&self) -> &ConstraintRuntimeState {
        &self.runtime
    }

    /// Error terms measured by the most recent first call
    pub fn last_violation(&self) -> Option<&ConstraintViolation> {
        self.last_violation.as_ref()
    }

    pub fn get_geometry(&self) -> &ConstraintGeometry {
        &self.geometry
    }

    pub fn get_gains(&self) -> &FeedbackGains {
        &self.gains
    }

    /// Sets `alpha` and `beta`; `k` and `c` follow at the next reset
    pub fn set_translational_gains(&mut self, alpha: f64, beta: f64) -> Result<()> {
        if !alpha.is_finite() || !beta.is_finite() {
            return Err(ConstraintError::InvalidParameter(format!(
                "translational gains must be finite, got alpha={} beta={}",
                alpha, beta
            )));
        }
        self.gains.set_translational(alpha, beta);
        Ok(())
    }

    /// Sets the rotational stiffness `K` and damping `P`
    pub fn set_attitude_gains(&mut self, stiffness: f64, damping: f64) -> Result<()> {
        if !stiffness.is_finite() || !damping.is_finite() {
            return Err(ConstraintError::InvalidParameter(format!(
                "attitude gains must be finite, got K={} P={}",
                stiffness, damping
            )));
        }
        self.gains.set_rotational(stiffness, damping);
        Ok(())
    }

    fn read_state(&self, slot: BodySlot) -> Result<RigidBodyState> {
        self.bodies[slot.index()]
            .as_ref()
            .map(|provider| provider.state())
            .ok_or(ConstraintError::BodyNotAttached(slot))
    }
}

impl DynamicEffector for ConstraintDynamicEffector {
    fn effector_type(&self) -> &'static str {
        "ConstraintDynamicEffector"
    }

    fn link_in_states(&mut self, provider: Arc<dyn BodyStateProvider>) -> Result<BodySlot> {
        self.attach(provider)
    }

    fn reset(&mut self) -> Result<()> {
        ConstraintDynamicEffector::reset(self)
    }

    fn compute_force_torque(&mut self, _integ_time: f64, _time_step: f64) -> Result<()> {
        self.evaluate().map(|_| ())
    }

    fn force_external_n(&self) -> Vector3 {
        self.force_external_n
    }

    fn torque_external_pnt_b_b(&self) -> Vector3 {
        self.torque_external_pnt_b_b
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for ConstraintDynamicEffector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ConstraintDynamicEffector")
            .field("geometry", &self.geometry)
            .field("gains", &self.gains)
            .field("runtime", &self.runtime)
            .field("attached", &self.attached_count())
            .finish()
    }
}
