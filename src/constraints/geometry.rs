use crate::bodies::RigidBodyState;
use crate::core::ConstraintConfig;
use crate::math::{Body1, Body2, Dcm, FramedVector, Inertial};

/// Attachment points and the undeformed separation of a two-body constraint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintGeometry {
    /// P1 relative to the body 1 origin
    offset1: FramedVector<Body1>,

    /// P2 relative to the body 2 origin
    offset2: FramedVector<Body2>,

    /// Fixed separation requested by the user, used instead of capturing one
    requested_separation: Option<FramedVector<Body1>>,

    /// Offset from P1 to P2 at which the constraint exerts no force
    reference_separation: FramedVector<Body1>,
}

impl ConstraintGeometry {
    /// Creates the geometry from a configuration. The reference separation
    /// stays zero until [`ConstraintGeometry::capture_reference`] runs.
    pub fn from_config(config: &ConstraintConfig) -> Self {
        Self {
            offset1: FramedVector::new(config.offset1),
            offset2: FramedVector::new(config.offset2),
            requested_separation: config.reference_separation.map(FramedVector::new),
            reference_separation: FramedVector::zero(),
        }
    }

    /// Returns the P1 offset in the body 1 frame
    pub fn offset1(&self) -> FramedVector<Body1> {
        self.offset1
    }

    /// Returns the P2 offset in the body 2 frame
    pub fn offset2(&self) -> FramedVector<Body2> {
        self.offset2
    }

    /// Returns the separation captured at the last reset
    pub fn reference_separation(&self) -> FramedVector<Body1> {
        self.reference_separation
    }

    /// Whether the reference must be measured from body states at reset
    pub fn needs_body_states(&self) -> bool {
        self.requested_separation.is_none()
    }

    /// Fixes the reference separation for the coming run.
    ///
    /// A requested separation is taken verbatim; otherwise the current offset
    /// from P1 to P2 is measured and expressed in the body 1 frame.
    pub fn capture_reference(&mut self, states: Option<(&RigidBodyState, &RigidBodyState)>) {
        self.reference_separation = match (self.requested_separation, states) {
            (Some(requested), _) => requested,
            (None, Some((body1, body2))) => self.measure_separation(body1, body2),
            (None, None) => FramedVector::zero(),
        };
    }

    fn measure_separation(
        &self,
        body1: &RigidBodyState,
        body2: &RigidBodyState,
    ) -> FramedVector<Body1> {
        let dcm_b1n: Dcm<Body1, Inertial> = Dcm::from_mrp(&body1.attitude);
        let dcm_b2n: Dcm<Body2, Inertial> = Dcm::from_mrp(&body2.attitude);

        let r_p1n_n =
            FramedVector::<Inertial>::new(body1.position) + dcm_b1n.transpose() * self.offset1;
        let r_p2n_n =
            FramedVector::<Inertial>::new(body2.position) + dcm_b2n.transpose() * self.offset2;

        dcm_b1n * (r_p2n_n - r_p1n_n)
    }
}

/// Proportional-derivative gains of the constraint
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeedbackGains {
    alpha: f64,
    beta: f64,
    stiffness: f64,
    damping: f64,
    attitude_stiffness: f64,
    attitude_damping: f64,
    integral_gain: f64,
    attitude_integral_gain: f64,
}

impl FeedbackGains {
    /// Creates the gains from a configuration. The derived stiffness and
    /// damping stay zero until [`FeedbackGains::reset`] runs.
    pub fn from_config(config: &ConstraintConfig) -> Self {
        Self {
            alpha: config.alpha,
            beta: config.beta,
            stiffness: 0.0,
            damping: 0.0,
            attitude_stiffness: config.attitude_stiffness,
            attitude_damping: config.attitude_damping,
            integral_gain: config.integral_gain,
            attitude_integral_gain: config.attitude_integral_gain,
        }
    }

    /// Derives `k = alpha^2` and `c = 2 beta` and zeroes both integral gains
    pub fn reset(&mut self) {
        self.stiffness = self.alpha * self.alpha;
        self.damping = 2.0 * self.beta;
        self.integral_gain = 0.0;
        self.attitude_integral_gain = 0.0;
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Sets `alpha` and `beta`; takes effect at the next reset
    pub fn set_translational(&mut self, alpha: f64, beta: f64) {
        self.alpha = alpha;
        self.beta = beta;
    }

    /// Translational stiffness `k`
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Translational damping `c`
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Rotational stiffness `K`
    pub fn attitude_stiffness(&self) -> f64 {
        self.attitude_stiffness
    }

    /// Rotational damping `P`
    pub fn attitude_damping(&self) -> f64 {
        self.attitude_damping
    }

    /// Sets `K` and `P`; used directly by the next evaluation
    pub fn set_rotational(&mut self, attitude_stiffness: f64, attitude_damping: f64) {
        self.attitude_stiffness = attitude_stiffness;
        self.attitude_damping = attitude_damping;
    }

    /// Translational integral gain `kI`.
    ///
    /// Reserved: no integral action is folded into the force law yet.
    pub fn integral_gain(&self) -> f64 {
        self.integral_gain
    }

    /// Rotational integral gain `kI_att`.
    ///
    /// Reserved: no integral action is folded into the torque law yet.
    pub fn attitude_integral_gain(&self) -> f64 {
        self.attitude_integral_gain
    }
}
