//! Synthetic telemetry for exercising the collector without a real user

pub mod synth;

pub use synth::{InputSynthesizer, MotionProfile};
