//! Decision Renderer
//!
//! Turns a risk decision into one display line and picks the follow-up
//! flow. Rendering is a pure function of the decision; side effects go
//! through [`DecisionView`].

use crate::submit::payload::Decision;
use tracing::info;

/// Action that asks for the drag challenge
pub const ACTION_BEHAVIOR_CHALLENGE: &str = "step_up_behavior_challenge";
/// Action that asks for strong authentication
pub const ACTION_STRONG_AUTH: &str = "step_up_webauthn";

/// Follow-up chosen for a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Open the drag challenge
    OpenChallenge,
    /// Hand over to an external strong-auth flow
    StrongAuth,
    /// Final answer (allow, deny, or anything unrecognized)
    Terminal(String),
}

impl Dispatch {
    pub fn for_action(action: &str) -> Self {
        match action {
            ACTION_BEHAVIOR_CHALLENGE => Dispatch::OpenChallenge,
            ACTION_STRONG_AUTH => Dispatch::StrongAuth,
            other => Dispatch::Terminal(other.to_string()),
        }
    }
}

/// Output side of the protected form
pub trait DecisionView {
    fn show_decision(&mut self, line: &str);
    fn prompt_strong_auth(&mut self);
    fn reset_form(&mut self);
    fn show_error(&mut self, message: &str);
}

/// "Action: allow | Reasons: low_risk"
pub fn decision_line(decision: &Decision) -> String {
    format!(
        "Action: {} | Reasons: {}",
        decision.action,
        decision.reasons.join(", ")
    )
}

/// Line shown once the challenge verdict arrives
pub fn challenge_verdict_line(passed: bool) -> &'static str {
    if passed {
        "Action: allow (post-challenge)"
    } else {
        "Action: deny (post-challenge)"
    }
}

/// Render `decision` and perform the view side of its dispatch.
///
/// Terminal decisions reset the form. Opening the challenge is left to the
/// caller, which owns the challenge runner.
pub fn render_decision<V: DecisionView + ?Sized>(decision: &Decision, view: &mut V) -> Dispatch {
    view.show_decision(&decision_line(decision));
    let dispatch = Dispatch::for_action(&decision.action);
    info!(action = %decision.action, reasons = ?decision.reasons, "Decision received");
    match &dispatch {
        Dispatch::OpenChallenge => {}
        Dispatch::StrongAuth => view.prompt_strong_auth(),
        Dispatch::Terminal(_) => view.reset_form(),
    }
    dispatch
}
