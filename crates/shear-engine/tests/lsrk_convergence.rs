//! Integration test: temporal order of accuracy and failure handling.
//!
//! Drives the stepper directly with the scalar forced-decay protocol,
//! whose exact solution is known, and checks that halving `dt` shrinks
//! the error by `2^order` for every built-in method. The forcing is
//! time dependent, so wrong stage abscissae show up as lost order.

use shear_comm::SelfComm;
use shear_core::{Real, TagSet};
use shear_domain::{Geometry, Subdomain};
use shear_engine::{LsrkMethod, LsrkStepper, SetupError, StepError, StepperState, Tableau};
use shear_protocol::{Operation, RateError};
use shear_test_utils::{decay_domain, FailingRates, ForcedDecay, DECAY_FIELD};

const U0: Real = 1.0;
const END: Real = 1.0;

fn error_at(problem: ForcedDecay, tableau: Tableau, dt: Real) -> Real {
    let mut domain = decay_domain(2, 3, U0);
    let mut stepper = LsrkStepper::new(
        &mut domain,
        Box::new(problem),
        Box::new(SelfComm::new()),
        tableau,
    )
    .unwrap();
    let steps = (END / dt).round() as usize;
    for _ in 0..steps {
        stepper.step(&mut domain, dt).unwrap();
    }
    let exact = problem.exact(U0, stepper.time());
    let mut worst: Real = 0.0;
    for sub in &domain.subdomains()[..2] {
        for u in sub.field(DECAY_FIELD).unwrap() {
            worst = worst.max((u - exact).abs());
        }
    }
    worst
}

#[test]
fn observed_order_matches_formal_order() {
    let problem = ForcedDecay::new(1.0, 1.0);
    for method in LsrkMethod::ALL {
        let coarse = error_at(problem, method.tableau(), 0.1);
        let fine = error_at(problem, method.tableau(), 0.05);
        let observed = (coarse / fine).log2();
        let formal = Real::from(method.order());
        assert!(
            (observed - formal).abs() < 0.35,
            "{method}: observed order {observed:.3}, formal {formal}"
        );
    }
}

#[test]
fn custom_tableau_runs() {
    // Heun written out by hand.
    let heun = Tableau::new(vec![0.0, -1.0], vec![1.0, 0.5]).unwrap();
    let problem = ForcedDecay::new(2.0, 0.0);
    let a = error_at(problem, heun, 0.05);
    let b = error_at(problem, LsrkMethod::Heun.tableau(), 0.05);
    assert_eq!(a, b);
}

#[test]
fn rate_failure_is_terminal() {
    let mut domain = decay_domain(1, 2, U0);
    // KC54 calls intra once per volume per stage: the fourth stage fails.
    let rates = FailingRates::new(ForcedDecay::new(1.0, 0.0), 3);
    let mut stepper = LsrkStepper::new(
        &mut domain,
        Box::new(rates),
        Box::new(SelfComm::new()),
        LsrkMethod::Kc54.tableau(),
    )
    .unwrap();

    match stepper.step(&mut domain, 0.1) {
        Err(StepError::Rate { stage, source }) => {
            assert_eq!(stage, 3);
            assert_eq!(source.operation(), Operation::IntraRhs);
            assert_eq!(source.subdomain(), "volume 0");
        }
        other => panic!("expected a rate failure, got {other:?}"),
    }
    assert_eq!(stepper.state(), StepperState::Failed);
    assert_eq!(stepper.steps(), 0);
    assert_eq!(stepper.time(), 0.0);
    assert!(matches!(
        stepper.step(&mut domain, 0.1),
        Err(StepError::Failed)
    ));
}

#[test]
fn ambiguous_role_is_reported_at_setup() {
    let mut domain = decay_domain(1, 1, U0);
    let tags: TagSet = ["volume", "glue-local"].into_iter().collect();
    domain
        .insert(Subdomain::new(
            shear_core::SubdomainId(99),
            "both",
            tags,
            1,
            1,
            Geometry::Detached,
        ))
        .unwrap();
    let err = LsrkStepper::new(
        &mut domain,
        Box::new(ForcedDecay::new(1.0, 0.0)),
        Box::new(SelfComm::new()),
        LsrkMethod::Kc54.tableau(),
    )
    .unwrap_err();
    match err {
        SetupError::Rate(e @ RateError::UnknownRole { .. }) => {
            assert_eq!(e.subdomain(), "both");
            assert_eq!(e.operation(), Operation::AllocateRateStorage);
        }
        other => panic!("expected an unknown role, got {other:?}"),
    }
}

#[test]
fn unknown_role_fails_the_first_stage() {
    let mut domain = decay_domain(1, 1, U0);
    let mut stepper = LsrkStepper::new(
        &mut domain,
        Box::new(ForcedDecay::new(1.0, 0.0)),
        Box::new(SelfComm::new()),
        LsrkMethod::Heun.tableau(),
    )
    .unwrap();
    domain
        .insert(Subdomain::new(
            shear_core::SubdomainId(50),
            "untagged",
            TagSet::new(),
            1,
            1,
            Geometry::Detached,
        ))
        .unwrap();
    match stepper.step(&mut domain, 0.1) {
        Err(StepError::Rate { stage: 0, source }) => {
            assert_eq!(source.operation(), Operation::ScaleRates);
            assert_eq!(source.subdomain(), "untagged");
        }
        other => panic!("expected an unknown role, got {other:?}"),
    }
}
