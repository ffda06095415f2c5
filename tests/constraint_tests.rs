use constraint_effector::{
    constraints::{CallPhase, ConstraintDynamicEffector, DynamicEffector},
    core::{ConstraintConfig, LogLevel, MemorySink},
    error::ConstraintError,
    math::{PrincipalRotation, Rotation, Vector3},
    BodySlot, Mrp, RigidBodyState, SharedBodyState,
};
use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::sync::Arc;

fn linked(
    config: ConstraintConfig,
    body1: RigidBodyState,
    body2: RigidBodyState,
) -> ConstraintDynamicEffector {
    let mut effector = ConstraintDynamicEffector::new(config).unwrap();
    effector.attach(Arc::new(body1)).unwrap();
    effector.attach(Arc::new(body2)).unwrap();
    effector
}

fn random_vector(rng: &mut StdRng, scale: f64) -> Vector3 {
    Vector3::new(
        rng.gen_range(-scale..scale),
        rng.gen_range(-scale..scale),
        rng.gen_range(-scale..scale),
    )
}

fn random_state(rng: &mut StdRng) -> RigidBodyState {
    RigidBodyState::at_rest(random_vector(rng, 5.0))
        .with_velocity(random_vector(rng, 1.0))
        .with_attitude(Mrp::from_vector(random_vector(rng, 0.5)))
        .with_angular_velocity(random_vector(rng, 0.2))
}

#[test]
fn test_reset_derives_gains_and_zeroes_integral_terms() {
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..50 {
        let alpha = rng.gen_range(-10.0..10.0);
        let beta = rng.gen_range(-10.0..10.0);
        let config = ConstraintConfig {
            alpha,
            beta,
            integral_gain: 4.0,
            attitude_integral_gain: -2.5,
            ..ConstraintConfig::default()
        };
        let mut effector = linked(
            config,
            RigidBodyState::at_rest(Vector3::ZERO),
            RigidBodyState::at_rest(Vector3::unit_x()),
        );
        assert_eq!(effector.get_gains().integral_gain(), 4.0);

        effector.reset().unwrap();

        let gains = effector.get_gains();
        assert_eq!(gains.stiffness(), alpha * alpha);
        assert_eq!(gains.damping(), 2.0 * beta);
        assert_eq!(gains.integral_gain(), 0.0);
        assert_eq!(gains.attitude_integral_gain(), 0.0);
    }
}

#[test]
fn test_gains_are_not_derived_before_reset() {
    let config = ConstraintConfig { alpha: 3.0, beta: 1.0, ..ConstraintConfig::default() };
    let effector = ConstraintDynamicEffector::new(config).unwrap();

    assert_eq!(effector.get_gains().stiffness(), 0.0);
    assert_eq!(effector.get_gains().damping(), 0.0);
}

#[test]
fn test_undeformed_joint_at_rest_produces_no_load() {
    let config = ConstraintConfig {
        offset1: Vector3::new(0.25, 0.5, 0.0),
        offset2: Vector3::new(-0.25, 0.0, 1.0),
        alpha: 2.0,
        beta: 0.5,
        attitude_stiffness: 3.0,
        attitude_damping: 1.0,
        ..ConstraintConfig::default()
    };
    let mut effector = linked(
        config,
        RigidBodyState::at_rest(Vector3::new(1.0, -2.0, 0.5)),
        RigidBodyState::at_rest(Vector3::new(3.0, 0.5, -1.0)),
    );
    effector.reset().unwrap();

    let first = effector.evaluate().unwrap();
    let second = effector.evaluate().unwrap();

    assert!(first.force.vector().is_zero());
    assert!(first.torque.is_zero());
    assert!(second.force.vector().is_zero());
    assert!(second.torque.is_zero());
}

#[test]
fn test_rigid_corotation_is_not_damped() {
    let config = ConstraintConfig {
        alpha: 1.0,
        beta: 2.0,
        attitude_stiffness: 1.0,
        attitude_damping: 1.0,
        ..ConstraintConfig::default()
    };
    let spin = Vector3::new(0.0, 0.0, 0.5);
    let body1 = RigidBodyState::at_rest(Vector3::ZERO).with_angular_velocity(spin);
    let body2 = RigidBodyState::at_rest(Vector3::unit_x())
        .with_velocity(spin.cross(&Vector3::unit_x()))
        .with_angular_velocity(spin);
    let mut effector = linked(config, body1, body2);
    effector.reset().unwrap();

    let first = effector.evaluate().unwrap();

    let violation = effector.last_violation().unwrap();
    assert!(violation.psi.vector().is_zero());
    assert!(violation.psi_dot.vector().is_zero());
    assert!(violation.rate_error.vector().is_zero());
    assert!(first.force.vector().is_zero());
}

#[test]
fn test_rigid_corotation_with_offset_attachments_is_not_damped() {
    let config = ConstraintConfig {
        offset1: Vector3::new(0.3, 0.7, -0.2),
        offset2: Vector3::new(-0.4, 0.1, 0.5),
        alpha: 1.5,
        beta: 2.0,
        attitude_stiffness: 1.0,
        attitude_damping: 1.0,
        ..ConstraintConfig::default()
    };
    let axis = Vector3::new(1.0, 2.0, 3.0);
    let attitude = Mrp::from_prv(&PrincipalRotation::from_axis_angle(axis, 0.8));
    let omega_b = Vector3::new(0.1, -0.2, 0.5);
    let omega_n = attitude.to_dcm().transpose() * omega_b;
    let r_b2 = Vector3::new(1.2, -0.6, 0.9);

    let body1 = RigidBodyState::at_rest(Vector3::ZERO)
        .with_attitude(attitude)
        .with_angular_velocity(omega_b);
    let body2 = RigidBodyState::at_rest(r_b2)
        .with_velocity(omega_n.cross(&r_b2))
        .with_attitude(attitude)
        .with_angular_velocity(omega_b);
    let mut effector = linked(config, body1, body2);
    effector.reset().unwrap();

    let first = effector.evaluate().unwrap();
    let second = effector.evaluate().unwrap();

    let violation = effector.last_violation().unwrap();
    assert_abs_diff_eq!(violation.psi_dot.vector(), Vector3::ZERO, epsilon = 1e-12);
    assert_abs_diff_eq!(first.force.vector(), Vector3::ZERO, epsilon = 1e-12);
    assert_abs_diff_eq!(first.torque, Vector3::ZERO, epsilon = 1e-12);
    assert_abs_diff_eq!(second.torque, Vector3::ZERO, epsilon = 1e-12);
}

#[test]
fn test_spin_about_offset_attachment_is_damped() {
    let config = ConstraintConfig {
        offset2: Vector3::unit_y(),
        beta: 0.5,
        ..ConstraintConfig::default()
    };
    // body 2 spins about z, carrying P2 along -x
    let mut effector = linked(
        config,
        RigidBodyState::at_rest(Vector3::ZERO),
        RigidBodyState::at_rest(Vector3::unit_x()).with_angular_velocity(Vector3::unit_z()),
    );
    effector.reset().unwrap();

    let first = effector.evaluate().unwrap();
    let second = effector.evaluate().unwrap();

    let violation = effector.last_violation().unwrap();
    assert!(violation.psi.vector().is_zero());
    assert_eq!(violation.psi_dot.vector(), Vector3::new(-1.0, 0.0, 0.0));
    assert_eq!(first.force.vector(), Vector3::new(-1.0, 0.0, 0.0));
    assert!(first.torque.is_zero());
    // the reaction acts through P2
    assert_eq!(second.force.vector(), Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(second.torque, Vector3::new(0.0, 0.0, -1.0));
}

#[test]
fn test_reaction_is_exact_negation() {
    let mut rng = StdRng::seed_from_u64(21);

    for _ in 0..100 {
        let config = ConstraintConfig {
            offset1: random_vector(&mut rng, 1.0),
            offset2: random_vector(&mut rng, 1.0),
            alpha: rng.gen_range(0.0..3.0),
            beta: rng.gen_range(0.0..3.0),
            attitude_stiffness: rng.gen_range(0.0..3.0),
            attitude_damping: rng.gen_range(0.0..3.0),
            ..ConstraintConfig::default()
        };
        let body1 = SharedBodyState::new(random_state(&mut rng));
        let body2 = SharedBodyState::new(random_state(&mut rng));
        let mut effector = ConstraintDynamicEffector::new(config).unwrap();
        effector.attach(Arc::new(body1.clone())).unwrap();
        effector.attach(Arc::new(body2.clone())).unwrap();
        effector.reset().unwrap();

        // move away from the captured reference
        body1.set(random_state(&mut rng));
        body2.set(random_state(&mut rng));

        let first = effector.evaluate().unwrap();
        let second = effector.evaluate().unwrap();

        assert_eq!(first.slot, BodySlot::First);
        assert_eq!(second.slot, BodySlot::Second);
        assert_eq!(second.force, -first.force);
        assert_eq!(
            second.torque,
            effector.runtime_state().cached_torque_on_body2().vector()
        );
    }
}

#[test]
fn test_calls_alternate_between_recompute_and_reuse() {
    let config = ConstraintConfig { alpha: 1.0, ..ConstraintConfig::default() };
    let body2 = SharedBodyState::new(RigidBodyState::at_rest(Vector3::unit_x()));
    let mut effector = ConstraintDynamicEffector::new(config).unwrap();
    effector.attach(Arc::new(RigidBodyState::at_rest(Vector3::ZERO))).unwrap();
    effector.attach(Arc::new(body2.clone())).unwrap();
    effector.reset().unwrap();
    assert_eq!(effector.call_phase(), CallPhase::AwaitingFirstCall);

    let mut previous_force = Vector3::ZERO;
    for step in 0..8 {
        let expected_flag = if step % 2 == 0 { 1 } else { -1 };
        assert_eq!(effector.alternation_flag(), expected_flag);

        // the joint stretches a little more before every call
        body2.update(|s| s.position.x += 0.25);
        let load = effector.evaluate().unwrap();

        if step % 2 == 0 {
            assert_eq!(load.slot, BodySlot::First);
            // recomputed from the current stretch
            assert_eq!(load.force.vector(), Vector3::new(0.25 * (step as f64 + 1.0), 0.0, 0.0));
        } else {
            assert_eq!(load.slot, BodySlot::Second);
            // reused from the first call, ignoring the newer stretch
            assert_eq!(load.force.vector(), -previous_force);
        }
        previous_force = load.force.vector();
    }
    assert_eq!(effector.call_phase(), CallPhase::AwaitingFirstCall);
}

/// Skipping the second half of a pair is a caller error: nothing panics, but
/// the next call hands out the stale reaction instead of recomputing.
#[test]
fn test_skipped_second_call_desynchronizes_the_pair() {
    let config = ConstraintConfig { alpha: 1.0, ..ConstraintConfig::default() };
    let body2 = SharedBodyState::new(RigidBodyState::at_rest(Vector3::new(2.0, 0.0, 0.0)));
    let mut effector = ConstraintDynamicEffector::new(config).unwrap();
    effector.attach(Arc::new(RigidBodyState::at_rest(Vector3::ZERO))).unwrap();
    effector.attach(Arc::new(body2.clone())).unwrap();
    effector.reset().unwrap();

    body2.update(|s| s.position.x = 3.0);
    let step1 = effector.evaluate().unwrap();
    assert_eq!(step1.force.vector(), Vector3::new(1.0, 0.0, 0.0));

    // the host only evaluates body 1 again in the next step
    body2.update(|s| s.position.x = 5.0);
    let step2 = effector.evaluate().unwrap();

    assert_eq!(step2.slot, BodySlot::Second);
    assert_eq!(step2.force.vector(), Vector3::new(-1.0, 0.0, 0.0));
    assert_ne!(step2.force.vector(), Vector3::new(3.0, 0.0, 0.0));

    // the following call recomputes, pairing the wrong calls from now on
    let step3 = effector.evaluate().unwrap();
    assert_eq!(step3.slot, BodySlot::First);
    assert_eq!(step3.force.vector(), Vector3::new(3.0, 0.0, 0.0));
}

#[test]
fn test_third_attachment_is_rejected_and_logged_once() {
    let sink = Arc::new(MemorySink::new());
    let mut effector =
        ConstraintDynamicEffector::with_logger(ConstraintConfig::default(), sink.clone()).unwrap();

    assert_eq!(effector.attach(Arc::new(RigidBodyState::default())).unwrap(), BodySlot::First);
    assert_eq!(effector.attach(Arc::new(RigidBodyState::default())).unwrap(), BodySlot::Second);
    assert_eq!(effector.attached_count(), 2);
    assert_eq!(sink.count(LogLevel::Error), 0);

    let third = effector.attach(Arc::new(RigidBodyState::default()));

    assert_eq!(third, Err(ConstraintError::TooManyBodies { attempted: 3 }));
    assert_eq!(effector.attached_count(), 2);
    assert_eq!(sink.count(LogLevel::Error), 1);
    assert_eq!(sink.records().len(), 1);
}

#[test]
fn test_unstretched_joint_without_gains_is_inert() {
    let config = ConstraintConfig {
        reference_separation: Some(Vector3::unit_x()),
        ..ConstraintConfig::default()
    };
    let mut effector = linked(
        config,
        RigidBodyState::at_rest(Vector3::ZERO),
        RigidBodyState::at_rest(Vector3::unit_x()),
    );
    effector.reset().unwrap();

    let first = effector.evaluate().unwrap();
    let second = effector.evaluate().unwrap();

    assert_eq!(first.force.vector(), Vector3::ZERO);
    assert_eq!(first.torque, Vector3::ZERO);
    assert_eq!(second.force.vector(), Vector3::ZERO);
    assert_eq!(second.torque, Vector3::ZERO);
}

#[test]
fn test_zero_reference_pulls_bodies_together() {
    let config = ConstraintConfig {
        reference_separation: Some(Vector3::ZERO),
        alpha: 1.0,
        beta: 0.0,
        ..ConstraintConfig::default()
    };
    let mut effector = linked(
        config,
        RigidBodyState::at_rest(Vector3::ZERO),
        RigidBodyState::at_rest(Vector3::unit_x()),
    );
    effector.reset().unwrap();

    let first = effector.evaluate().unwrap();
    let second = effector.evaluate().unwrap();

    // body 1 is pulled along +x towards body 2, body 2 back towards body 1
    assert_eq!(first.force.vector(), Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(second.force.vector(), Vector3::new(-1.0, 0.0, 0.0));
    assert!(first.torque.is_zero());
    assert!(second.torque.is_zero());
}

#[test]
fn test_forces_act_at_attachment_points() {
    let config = ConstraintConfig {
        offset1: Vector3::new(0.0, 1.0, 0.0),
        offset2: Vector3::new(0.0, -1.0, 0.0),
        reference_separation: Some(Vector3::ZERO),
        alpha: 1.0,
        ..ConstraintConfig::default()
    };
    let mut effector = linked(
        config,
        RigidBodyState::at_rest(Vector3::ZERO),
        RigidBodyState::at_rest(Vector3::new(1.0, 2.0, 0.0)),
    );
    effector.reset().unwrap();

    let first = effector.evaluate().unwrap();
    let second = effector.evaluate().unwrap();

    assert_eq!(first.force.vector(), Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(first.torque, Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(second.torque, Vector3::new(0.0, 0.0, -1.0));
}

#[test]
fn test_reference_rotates_with_body1() {
    let quarter_turn =
        Mrp::from_prv(&PrincipalRotation::from_axis_angle(Vector3::unit_z(), PI / 2.0));
    let config = ConstraintConfig {
        offset1: Vector3::unit_x(),
        reference_separation: Some(Vector3::unit_x()),
        alpha: 1.0,
        ..ConstraintConfig::default()
    };
    // body 1's x axis points along inertial y, so P1 sits at (0, 1, 0)
    let body2 = SharedBodyState::new(RigidBodyState::at_rest(Vector3::new(0.0, 2.0, 0.0)));
    let mut effector = ConstraintDynamicEffector::new(config).unwrap();
    effector
        .attach(Arc::new(RigidBodyState::at_rest(Vector3::ZERO).with_attitude(quarter_turn)))
        .unwrap();
    effector.attach(Arc::new(body2.clone())).unwrap();
    effector.reset().unwrap();

    let settled = effector.evaluate().unwrap();
    effector.evaluate().unwrap();
    assert_abs_diff_eq!(settled.force.vector(), Vector3::ZERO, epsilon = 1e-12);

    body2.update(|s| s.position.y = 3.0);
    let stretched = effector.evaluate().unwrap();
    assert_abs_diff_eq!(stretched.force.vector(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    // the force acts along body 1's own x axis, through P1
    assert_abs_diff_eq!(stretched.torque, Vector3::ZERO, epsilon = 1e-12);
}

#[test]
fn test_attitude_feedback_acts_on_body2_only() {
    let sigma2 = Mrp::from_prv(&PrincipalRotation::from_axis_angle(Vector3::unit_z(), 0.3));
    let config = ConstraintConfig {
        alpha: 1.0,
        attitude_stiffness: 2.0,
        attitude_damping: 0.5,
        ..ConstraintConfig::default()
    };
    let mut effector = linked(
        config,
        RigidBodyState::at_rest(Vector3::ZERO),
        RigidBodyState::at_rest(Vector3::unit_x())
            .with_attitude(sigma2)
            .with_angular_velocity(Vector3::new(0.0, 0.0, 0.1)),
    );
    effector.reset().unwrap();

    let first = effector.evaluate().unwrap();
    let second = effector.evaluate().unwrap();

    assert!(first.force.vector().is_zero());
    assert!(first.torque.is_zero());

    let violation = effector.last_violation().unwrap();
    assert_abs_diff_eq!(violation.attitude_error, sigma2, epsilon = 1e-12);
    assert_abs_diff_eq!(
        violation.rate_error.vector(),
        Vector3::new(0.0, 0.0, 0.1),
        epsilon = 1e-15
    );

    let expected = sigma2.as_vector() * -2.0 - Vector3::new(0.0, 0.0, 0.1) * 0.5;
    assert_abs_diff_eq!(second.torque, expected, epsilon = 1e-12);
}

#[test]
fn test_half_turn_relative_attitude_gives_bounded_torque() {
    let half_turn = Mrp::from_prv(&PrincipalRotation::from_axis_angle(Vector3::unit_y(), PI));
    let config = ConstraintConfig { attitude_stiffness: 1.0, ..ConstraintConfig::default() };
    let mut effector = linked(
        config,
        RigidBodyState::at_rest(Vector3::ZERO),
        RigidBodyState::at_rest(Vector3::unit_x()).with_attitude(half_turn),
    );
    effector.reset().unwrap();

    effector.evaluate().unwrap();
    let second = effector.evaluate().unwrap();

    assert!(second.torque.is_finite());
    assert_abs_diff_eq!(second.torque.length(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_reset_requires_both_bodies_when_capturing() {
    let mut effector = ConstraintDynamicEffector::new(ConstraintConfig::default()).unwrap();
    assert_eq!(effector.reset(), Err(ConstraintError::BodyNotAttached(BodySlot::First)));

    effector.attach(Arc::new(RigidBodyState::default())).unwrap();
    assert_eq!(effector.reset(), Err(ConstraintError::BodyNotAttached(BodySlot::Second)));
}

#[test]
fn test_requested_reference_needs_no_bodies_at_reset() {
    let config = ConstraintConfig {
        reference_separation: Some(Vector3::new(0.0, 0.0, 2.0)),
        ..ConstraintConfig::default()
    };
    let mut effector = ConstraintDynamicEffector::new(config).unwrap();

    effector.reset().unwrap();

    assert_eq!(
        effector.get_geometry().reference_separation().vector(),
        Vector3::new(0.0, 0.0, 2.0)
    );
    assert_eq!(effector.evaluate(), Err(ConstraintError::BodyNotAttached(BodySlot::First)));
    // a failed first call does not advance the pair
    assert_eq!(effector.call_phase(), CallPhase::AwaitingFirstCall);
}

#[test]
fn test_reset_clears_cache_and_recaptures_reference() {
    let config = ConstraintConfig { alpha: 1.0, ..ConstraintConfig::default() };
    let body2 = SharedBodyState::new(RigidBodyState::at_rest(Vector3::unit_x()));
    let mut effector = ConstraintDynamicEffector::new(config).unwrap();
    effector.attach(Arc::new(RigidBodyState::at_rest(Vector3::ZERO))).unwrap();
    effector.attach(Arc::new(body2.clone())).unwrap();
    effector.reset().unwrap();

    body2.update(|s| s.position = Vector3::new(2.0, 1.0, 0.0));
    effector.evaluate().unwrap();
    assert_eq!(effector.call_phase(), CallPhase::AwaitingSecondCall);
    assert!(!effector.runtime_state().cached_force().vector().is_zero());

    effector.reset().unwrap();

    assert_eq!(effector.call_phase(), CallPhase::AwaitingFirstCall);
    assert_eq!(effector.alternation_flag(), 1);
    assert!(effector.runtime_state().cached_force().vector().is_zero());
    assert!(effector.runtime_state().cached_torque_on_body2().vector().is_zero());
    assert!(effector.last_violation().is_none());
    assert_eq!(effector.force_external_n(), Vector3::ZERO);
    assert_eq!(
        effector.get_geometry().reference_separation().vector(),
        Vector3::new(2.0, 1.0, 0.0)
    );

    let load = effector.evaluate().unwrap();
    assert!(load.force.vector().is_zero());
}

#[test]
fn test_host_drives_effector_through_trait() {
    let config = ConstraintConfig {
        reference_separation: Some(Vector3::ZERO),
        alpha: 2.0,
        ..ConstraintConfig::default()
    };
    let mut effector: Box<dyn DynamicEffector> =
        Box::new(ConstraintDynamicEffector::new(config).unwrap());
    assert_eq!(effector.effector_type(), "ConstraintDynamicEffector");

    effector.link_in_states(Arc::new(RigidBodyState::at_rest(Vector3::ZERO))).unwrap();
    effector
        .link_in_states(Arc::new(RigidBodyState::at_rest(Vector3::new(0.0, 0.5, 0.0))))
        .unwrap();
    effector.reset().unwrap();
    effector.update_state(0);

    effector.compute_force_torque(0.0, 0.1).unwrap();
    assert_eq!(effector.force_external_n(), Vector3::new(0.0, 2.0, 0.0));
    assert_eq!(effector.torque_external_pnt_b_b(), Vector3::ZERO);

    effector.compute_force_torque(0.0, 0.1).unwrap();
    assert_eq!(effector.force_external_n(), Vector3::new(0.0, -2.0, 0.0));

    let concrete = effector
        .as_any()
        .downcast_ref::<ConstraintDynamicEffector>()
        .unwrap();
    assert_eq!(concrete.alternation_flag(), 1);
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let config = ConstraintConfig { alpha: f64::NAN, ..ConstraintConfig::default() };
    assert!(matches!(
        ConstraintDynamicEffector::new(config),
        Err(ConstraintError::InvalidParameter(_))
    ));

    let config = ConstraintConfig {
        offset2: Vector3::new(0.0, f64::INFINITY, 0.0),
        ..ConstraintConfig::default()
    };
    assert!(matches!(
        ConstraintDynamicEffector::new(config),
        Err(ConstraintError::InvalidParameter(_))
    ));

    let mut effector = ConstraintDynamicEffector::new(ConstraintConfig::default()).unwrap();
    assert!(effector.set_attitude_gains(f64::NAN, 1.0).is_err());
    effector.set_translational_gains(3.0, 0.5).unwrap();
    assert_eq!(effector.get_gains().alpha(), 3.0);
}
