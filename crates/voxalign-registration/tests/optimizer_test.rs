use nalgebra::SVector;
use proptest::prelude::*;
use voxalign_registration::optimizer::{ParameterScales, RegularStepGradientDescent, StopReason};
use voxalign_registration::Result;

type Vec3 = SVector<f64, 3>;

proptest! {
    #[test]
    fn test_cost_increase_always_shrinks_step_on_bowl(
        tx in -5.0f64..5.0, ty in -5.0f64..5.0, tz in -5.0f64..5.0,
        step in 0.05f64..2.0
    ) {
        let target = Vec3::new(tx, ty, tz);
        let mut bowl = |p: &Vec3| -> Result<(f64, Vec3)> {
            let d = p - target;
            Ok((d.norm_squared(), d * 2.0))
        };

        let mut optimizer = RegularStepGradientDescent::new(ParameterScales::<3>::uniform())
            .with_maximum_step_length(step)
            .with_maximum_iterations(2000);
        optimizer.initialize(Vec3::zeros()).unwrap();

        let mut records = Vec::new();
        while optimizer.state().stop_reason().is_none() {
            if let Some(record) = optimizer.step(&mut bowl).unwrap() {
                records.push(record);
            }
        }

        for pair in records.windows(2) {
            if pair[1].value > pair[0].value {
                prop_assert!(pair[1].step_length < pair[0].step_length);
            }
        }
        let reason = optimizer.state().stop_reason().unwrap();
        prop_assert!(reason.is_converged(), "stopped with {:?}", reason);
        prop_assert!((optimizer.state().position - target).norm() < 1e-3);
    }
}

#[test]
fn test_scales_weight_the_direction() {
    // Both parameters are 1 away from the minimum. A small scale on the
    // second one makes its scaled gradient dominate the step.
    let mut bowl = |p: &SVector<f64, 2>| -> Result<(f64, SVector<f64, 2>)> {
        let d = p - SVector::<f64, 2>::new(1.0, 1.0);
        Ok((d.norm_squared(), d * 2.0))
    };
    let scales = ParameterScales::new(SVector::<f64, 2>::new(1.0, 0.001)).unwrap();
    let mut optimizer = RegularStepGradientDescent::new(scales);
    optimizer.initialize(SVector::zeros()).unwrap();
    optimizer.step(&mut bowl).unwrap();

    let position = optimizer.state().position;
    assert!(position[1] > 0.0999);
    assert!(position[0] < 1e-3);
}

#[test]
fn test_step_too_small_stops_on_first_short_step() {
    let mut line = |p: &SVector<f64, 1>| -> Result<(f64, SVector<f64, 1>)> {
        Ok((p[0].abs(), SVector::<f64, 1>::new(if p[0] >= 0.0 { 1.0 } else { -1.0 })))
    };
    let minimum = 0.1;
    let mut optimizer = RegularStepGradientDescent::new(ParameterScales::<1>::uniform())
        .with_maximum_step_length(1.0)
        .with_minimum_step_length(minimum);
    optimizer.initialize(SVector::<f64, 1>::new(0.25)).unwrap();

    let mut records = Vec::new();
    while let Some(record) = optimizer.step(&mut line).unwrap() {
        records.push(record);
        assert!(records.len() < 50, "optimizer did not stop");
    }

    // |g| = 1 never falls under the tolerance, so only the step length stops it,
    // and it does so in the very record where the step first drops below the minimum.
    let first_short = records.iter().position(|r| r.step_length < minimum).unwrap();
    assert_eq!(first_short, records.len() - 1);
    assert_eq!(records[first_short].stop_reason, Some(StopReason::StepTooSmall));
    assert!(records[..first_short].iter().all(|r| r.stop_reason.is_none()));

    assert_eq!(optimizer.state().stop_reason(), Some(StopReason::StepTooSmall));
    let description = optimizer.state().stop_description.clone().unwrap();
    assert!(description.starts_with("Step too small"), "{}", description);
    let iterations = optimizer.state().iteration;
    assert_eq!(optimizer.step(&mut line).unwrap(), None);
    assert_eq!(optimizer.state().iteration, iterations);
}
