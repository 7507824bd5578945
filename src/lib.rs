//! Planar template tracking via hyperplane approximation.
//!
//! An offline training stage learns a linear mapping from intensity
//! differences at fixed sample points to warp-parameter updates; the online
//! tracker applies that mapping iteratively per frame, replacing per-frame
//! non-linear optimization with a precomputed linear predictor.
//!
//! ```no_run
//! use hyperplane_tracker::{train, HyperplaneTracker, Template, TrackerConfig};
//!
//! # fn main() -> hyperplane_tracker::Result<()> {
//! let frame = image::open("first_frame.png")?.to_luma8();
//! let corners = [[120.0, 80.0], [220.0, 82.0], [218.0, 180.0], [118.0, 178.0]];
//! let template = Template::from_frame(&frame, corners, (64, 64))?;
//!
//! let model = train(&template, &TrackerConfig::default())?.into_shared();
//! let mut tracker =
//!     HyperplaneTracker::with_initial_warp(model, template.initial_warp()?);
//! let result = tracker.track(&frame);
//! println!("corners: {:?} ({:?})", result.corners, result.status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod sampling;
pub mod template;
pub mod tracking;
pub mod training;
pub mod warp;

pub use config::*;
pub use error::*;
pub use model::*;
pub use sampling::{SamplePoints, SamplingStrategy, MIN_SAMPLES};
pub use template::*;
pub use tracking::*;
pub use training::{
    train, ParameterBounds, PerturbationGenerator, PredictorStage, MIN_PERTURBATIONS,
};
pub use warp::*;
