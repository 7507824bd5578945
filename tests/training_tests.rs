use hyperplane_tracker::sampling::{intensity_vector, SamplePoints};
use hyperplane_tracker::{train, SamplingStrategy, Template, TrackError, TrackerConfig, Warp};
use image::{GrayImage, Luma};

fn textured_patch(size: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| {
        let fx = x as f64;
        let fy = y as f64;
        let v = 127.5
            + 60.0 * (fx * 0.35).sin() * (fy * 0.28).cos()
            + 40.0 * (0.12 * fx + 0.2 * fy).sin();
        Luma([v.clamp(0.0, 255.0) as u8])
    })
}

fn fast_config() -> TrackerConfig {
    let mut config = TrackerConfig::default();
    config.sampling.sample_count = 100;
    config.sampling.strategy = SamplingStrategy::Grid;
    config.training.perturbation_count = 200;
    config.training.motion_scales = vec![1.0, 0.5];
    config
}

#[test]
fn test_training_produces_complete_model() {
    let template = Template::from_patch(textured_patch(48)).unwrap();
    let config = fast_config();
    let model = train(&template, &config).unwrap();

    assert_eq!(model.samples().len(), 100);
    assert_eq!(model.reference().len(), 100);
    assert_eq!(model.stages().len(), 2);
    for stage in model.stages() {
        assert_eq!(stage.matrix.dim(), (8, 100));
        assert!(stage.condition.is_finite());
        assert!(stage.matrix.iter().all(|v| v.is_finite()));
    }
    assert!(model.validate().is_ok());
}

#[test]
fn test_training_is_deterministic_for_fixed_seed() {
    let template = Template::from_patch(textured_patch(48)).unwrap();
    let config = fast_config();
    let a = train(&template, &config).unwrap();
    let b = train(&template, &config).unwrap();

    assert_eq!(a.samples(), b.samples());
    assert_eq!(a.reference(), b.reference());
    for (sa, sb) in a.stages().iter().zip(b.stages().iter()) {
        assert_eq!(sa.matrix, sb.matrix);
    }
}

#[test]
fn test_identity_perturbation_yields_zero_difference() {
    let template = Template::from_patch(textured_patch(48)).unwrap();
    let points = SamplePoints::generate(100, 48, 48, SamplingStrategy::Grid, 0).unwrap();
    let (reference, _) = intensity_vector(template.patch(), &points, &Warp::identity());
    let (resampled, _) = intensity_vector(template.patch(), &points, &Warp::identity());
    let diff: f64 = reference
        .iter()
        .zip(resampled.iter())
        .map(|(a, b)| (a - b).abs())
        .sum();
    assert_eq!(diff, 0.0);
}

#[test]
fn test_constant_template_fails_ill_conditioned() {
    let template = Template::from_patch(GrayImage::from_pixel(48, 48, Luma([128]))).unwrap();
    let err = train(&template, &fast_config()).unwrap_err();
    assert!(matches!(err, TrackError::IllConditionedTemplate { .. }));
}

#[test]
fn test_tight_condition_threshold_fails_ill_conditioned() {
    let template = Template::from_patch(textured_patch(48)).unwrap();
    let mut config = fast_config();
    config.training.condition_threshold = 1.5;
    let err = train(&template, &config).unwrap_err();
    assert!(matches!(err, TrackError::IllConditionedTemplate { .. }));
}

#[test]
fn test_undersized_sample_count_fails_with_insufficient_samples() {
    let template = Template::from_patch(textured_patch(48)).unwrap();
    let mut config = fast_config();
    config.sampling.sample_count = 8;
    let err = train(&template, &config).unwrap_err();
    assert!(matches!(err, TrackError::InsufficientSamples { .. }));
}

#[test]
fn test_undersized_perturbation_count_fails_with_insufficient_samples() {
    let template = Template::from_patch(textured_patch(48)).unwrap();
    let mut config = fast_config();
    config.training.perturbation_count = 20;
    let err = train(&template, &config).unwrap_err();
    assert!(matches!(err, TrackError::InsufficientSamples { .. }));
}

#[test]
fn test_invalid_config_is_rejected_before_training() {
    let template = Template::from_patch(textured_patch(48)).unwrap();
    let mut config = fast_config();
    config.training.motion_scales.clear();
    let err = train(&template, &config).unwrap_err();
    assert!(matches!(err, TrackError::InvalidConfig(_)));
}
