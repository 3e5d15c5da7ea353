//! Protected Form Flow
//!
//! Ties passive telemetry to a user action: on submit, a behavior snapshot
//! goes to `/collect`, the decision is rendered, and a behavior step-up
//! hands over to the drag challenge.

use crate::capture::recorder::TelemetryRecorder;
use crate::challenge::detector::CompletionDetector;
use crate::challenge::runner::{ChallengeCommand, ChallengeOutcome, ChallengeRunner, ChallengeView};
use crate::challenge::state::DragChallenge;
use crate::decision::renderer::{challenge_verdict_line, render_decision, DecisionView, Dispatch};
use crate::session::context::SessionContext;
use crate::session::flags::FlagSource;
use crate::submit::client::{CollectorClient, Transport};
use crate::submit::payload::{
    BehaviorSnapshotPayload, BehaviorSummary, Journey, DEFAULT_CHANNEL, SNAPSHOT_KEY_SAMPLES,
    SNAPSHOT_MOUSE_SAMPLES,
};
use crate::{Error, Result};
use rand::Rng;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Snapshot shape for form submissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptions {
    pub channel: String,
    pub mouse_samples: usize,
    pub key_samples: usize,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            mouse_samples: SNAPSHOT_MOUSE_SAMPLES,
            key_samples: SNAPSHOT_KEY_SAMPLES,
        }
    }
}

/// A form whose submission is gated by the risk decision
pub struct ProtectedForm<'a, T, F> {
    client: &'a CollectorClient<T>,
    session: &'a SessionContext,
    flags: &'a F,
    options: FormOptions,
}

impl<'a, T, F> ProtectedForm<'a, T, F>
where
    T: Transport + 'a,
    F: FlagSource,
{
    pub fn new(client: &'a CollectorClient<T>, session: &'a SessionContext, flags: &'a F) -> Self {
        Self {
            client,
            session,
            flags,
            options: FormOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Snapshot of the recorder as it is now, with freshly sampled flags
    pub fn snapshot(&self, recorder: &TelemetryRecorder, journey: Journey) -> BehaviorSnapshotPayload {
        BehaviorSnapshotPayload::build(
            self.session,
            self.flags.current(),
            &self.options.channel,
            BehaviorSummary::from_recorder(recorder, self.options.mouse_samples, self.options.key_samples),
            journey,
        )
    }

    /// Submit the form.
    ///
    /// On success the decision is rendered and its dispatch returned. On
    /// failure the error is shown and the form is left untouched so the user
    /// can resubmit.
    pub async fn submit<V>(&self, recorder: &TelemetryRecorder, journey: Journey, view: &mut V) -> Result<Dispatch>
    where
        V: DecisionView + ?Sized,
    {
        let payload = self.snapshot(recorder, journey);
        info!(
            session_id = %payload.session_id,
            amount = %payload.journey.amount,
            "Form submitted"
        );
        match self.client.submit_behavior_snapshot(&payload).await {
            Ok(decision) => Ok(render_decision(&decision, view)),
            Err(e) => {
                warn!("Behavior snapshot rejected: {}", e);
                let message = match &e {
                    Error::Network(message) => message.clone(),
                    other => other.to_string(),
                };
                view.show_error(&format!("Error: {}", message));
                Err(e)
            }
        }
    }

    /// Run the behavior step-up and show the post-challenge line.
    pub async fn step_up<R, V>(
        &self,
        challenge: DragChallenge<R>,
        detector: CompletionDetector,
        commands: mpsc::Receiver<ChallengeCommand>,
        dismiss_delay: Duration,
        view: &mut V,
    ) -> Result<ChallengeOutcome>
    where
        R: Rng,
        V: DecisionView + ChallengeView,
    {
        let runner = ChallengeRunner::new(challenge, detector, self.client, self.session, self.flags)
            .with_dismiss_delay(dismiss_delay);
        let outcome = runner.run(commands, view).await?;
        if let ChallengeOutcome::Completed { passed, .. } = outcome {
            view.show_decision(challenge_verdict_line(passed));
        }
        Ok(outcome)
    }
}
