//! Terminal views for the form, the challenge and the live log

use crate::challenge::render::{GuideStyle, SvgSurface};
use crate::challenge::runner::ChallengeView;
use crate::challenge::state::ChallengeAttempt;
use crate::decision::renderer::DecisionView;
use crate::stream::live_log::LiveEventLog;
use std::io::{Stdout, Write};

/// Line-oriented view writing to stdout (or any writer)
///
/// The terminal only gets progress lines. With [`ConsoleView::with_guide`]
/// every redraw also paints the guide and marker onto an SVG frame.
#[derive(Debug)]
pub struct ConsoleView<W: Write = Stdout> {
    out: W,
    form_resets: usize,
    redraws: usize,
    challenge_visible: bool,
    guide: Option<GuideFrame>,
}

#[derive(Debug)]
struct GuideFrame {
    style: GuideStyle,
    canvas: (f64, f64),
    surface: SvgSurface,
    drawn: bool,
}

impl ConsoleView<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }
}

impl Default for ConsoleView<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleView<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            form_resets: 0,
            redraws: 0,
            challenge_visible: false,
            guide: None,
        }
    }

    /// Also render each challenge frame onto a `width` x `height` canvas
    pub fn with_guide(mut self, style: GuideStyle, canvas: (f64, f64)) -> Self {
        self.guide = Some(GuideFrame {
            style,
            canvas,
            surface: SvgSurface::new(),
            drawn: false,
        });
        self
    }

    /// Last rendered challenge frame as an SVG document
    pub fn frame_svg(&self) -> Option<String> {
        self.guide
            .as_ref()
            .filter(|g| g.drawn)
            .map(|g| g.surface.finish())
    }

    pub fn form_resets(&self) -> usize {
        self.form_resets
    }

    pub fn challenge_visible(&self) -> bool {
        self.challenge_visible
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print the newest log entry
    pub fn show_log_update(&mut self, log: &LiveEventLog) {
        if let Some(entry) = log.newest() {
            let _ = writeln!(self.out, "{}", entry.render());
        }
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", text);
    }
}

impl<W: Write> DecisionView for ConsoleView<W> {
    fn show_decision(&mut self, line: &str) {
        self.line(line);
    }

    fn prompt_strong_auth(&mut self) {
        self.line("Step-up suggested: WebAuthn (strong authentication continues outside this tool)");
    }

    fn reset_form(&mut self) {
        self.form_resets += 1;
        self.line("Form reset.");
    }

    fn show_error(&mut self, message: &str) {
        self.line(message);
    }
}

impl<W: Write> ChallengeView for ConsoleView<W> {
    fn show_status(&mut self, status: &str) {
        self.challenge_visible = true;
        let _ = writeln!(self.out, "  [challenge] {}", status);
    }

    fn redraw(&mut self, attempt: &ChallengeAttempt) {
        self.challenge_visible = true;
        self.redraws += 1;
        if let Some(guide) = self.guide.as_mut() {
            guide
                .style
                .draw(&mut guide.surface, guide.canvas, attempt.path(), attempt.marker());
            guide.drawn = true;
        }
        // Progress every 10th frame
        if self.redraws % 10 == 0 && !attempt.trail().is_empty() {
            let marker = attempt.marker();
            let to_end = marker.distance_to(&attempt.path().end);
            let off_path = attempt.polyline().nearest_distance(&marker);
            let _ = writeln!(
                self.out,
                "  [challenge] trail={} marker=({:.0},{:.0}) to_end={:.1} off_path={:.1}",
                attempt.trail().len(),
                marker.x,
                marker.y,
                to_end,
                off_path
            );
        }
    }

    fn hide(&mut self) {
        self.challenge_visible = false;
        self.line("  [challenge] closed");
    }
}
