use criterion::{criterion_group, criterion_main, Criterion};
use hyperplane_tracker::{
    train, HyperplaneTracker, SamplingStrategy, Template, TrackerConfig,
};
use image::{GrayImage, Luma};

fn scene(x: f64, y: f64) -> f64 {
    127.5 + 60.0 * (x * 0.35).sin() * (y * 0.28).cos() + 40.0 * (0.12 * x + 0.2 * y).sin()
}

fn base_frame(size: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| {
        Luma([scene(x as f64, y as f64).clamp(0.0, 255.0) as u8])
    })
}

fn bench_config() -> TrackerConfig {
    let mut config = TrackerConfig::default();
    config.sampling.sample_count = 144;
    config.sampling.strategy = SamplingStrategy::Grid;
    config.training.perturbation_count = 300;
    config
}

fn bench_training(c: &mut Criterion) {
    let template = Template::from_patch(base_frame(64)).unwrap();
    let config = bench_config();

    c.bench_function("train_64x64_template", |b| {
        b.iter(|| train(&template, &config).unwrap())
    });
}

fn bench_tracking(c: &mut Criterion) {
    let frame = base_frame(128);
    let corners = [[40.0, 40.0], [87.0, 40.0], [87.0, 87.0], [40.0, 87.0]];
    let template = Template::from_frame(&frame, corners, (48, 48)).unwrap();
    let model = train(&template, &bench_config()).unwrap().into_shared();
    let initial = template.initial_warp().unwrap();

    c.bench_function("track_static_frame", |b| {
        let mut tracker = HyperplaneTracker::with_initial_warp(model.clone(), initial);
        b.iter(|| tracker.track(&frame))
    });

    // Slightly shifted frame: the tracker pays the full iteration budget.
    let shifted = GrayImage::from_fn(128, 128, |x, y| {
        Luma([scene(x as f64 - 1.5, y as f64 - 1.5).clamp(0.0, 255.0) as u8])
    });
    c.bench_function("track_shifted_frame", |b| {
        b.iter(|| {
            let mut tracker = HyperplaneTracker::with_initial_warp(model.clone(), initial);
            tracker.track(&shifted)
        })
    });
}

criterion_group!(benches, bench_training, bench_tracking);
criterion_main!(benches);
