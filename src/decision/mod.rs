//! Rendering of risk decisions

pub mod renderer;

pub use renderer::{
    challenge_verdict_line, decision_line, render_decision, DecisionView, Dispatch,
    ACTION_BEHAVIOR_CHALLENGE, ACTION_STRONG_AUTH,
};
