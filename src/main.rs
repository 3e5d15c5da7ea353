//! Liveness Collector - behavioral telemetry and drag-path liveness challenge
//!
//! Drives the protected payment form and the step-up challenge from the
//! terminal, feeding them synthetic human-like or bot-like input.

use liveness_collector::app::cli::{Cli, Commands, ConfigAction, FlagArgs};
use liveness_collector::app::config::Config;
use liveness_collector::app::console::ConsoleView;
use liveness_collector::capture::TelemetryRecorder;
use liveness_collector::challenge::{
    ChallengeCommand, ChallengeOutcome, ChallengeRunner, DragChallenge, PathGenerator, PathSpec,
    SvgSurface,
};
use liveness_collector::challenge::runner::DEFAULT_DISMISS_DELAY;
use liveness_collector::decision::Dispatch;
use liveness_collector::session::{
    EnvFlagSource, FixedFlags, FlagSource, SessionContext, SimulatedFlags,
};
use liveness_collector::simulate::{InputSynthesizer, MotionProfile};
use liveness_collector::stream::{self, LiveEventLog};
use liveness_collector::submit::{resolve_base_url, CollectorClient, HttpTransport, Journey};
use liveness_collector::time::MonotonicClock;
use liveness_collector::workflow::ProtectedForm;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Session clock starts here
    MonotonicClock::init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    // Execute command
    match cli.command {
        Commands::Submit {
            amount,
            beneficiary,
            profile,
            flags,
        } => {
            runtime.block_on(run_submit(&amount, &beneficiary, profile, flags, &config))?;
        }
        Commands::Challenge {
            profile,
            seed,
            frame,
            flags,
        } => {
            runtime.block_on(run_challenge(profile, seed, frame.as_deref(), flags, &config))?;
        }
        Commands::Preview { output, seed } => {
            run_preview(&output, seed, &config)?;
        }
        Commands::Watch { url } => {
            runtime.block_on(run_watch(url, &config))?;
        }
        Commands::Config { action } => {
            run_config(action, cli.config, &config)?;
        }
    }

    Ok(())
}

/// CLI switches win; otherwise the `LIVENESS_SIM_*` variables are read
/// each time a payload is built.
enum Flags {
    Cli(FixedFlags),
    Env(EnvFlagSource),
}

impl Flags {
    fn from_args(args: FlagArgs) -> Self {
        if args.any() {
            Flags::Cli(FixedFlags(args.to_flags()))
        } else {
            Flags::Env(EnvFlagSource)
        }
    }
}

impl FlagSource for Flags {
    fn current(&self) -> SimulatedFlags {
        match self {
            Flags::Cli(fixed) => fixed.current(),
            Flags::Env(env) => env.current(),
        }
    }
}

fn collector_client(config: &Config) -> anyhow::Result<CollectorClient<HttpTransport>> {
    let transport = HttpTransport::new(config.request_timeout())?;
    let base = resolve_base_url(&config.collector.base_url);
    info!("Collector: {}", base);
    Ok(CollectorClient::new(transport, base))
}

fn path_generator(seed: Option<u64>, config: &Config) -> PathGenerator {
    match seed {
        Some(s) => PathGenerator::seeded(s),
        None => PathGenerator::new(),
    }
    .with_margin(config.challenge.margin)
}

/// Open an attempt and script a synthetic drag over its path.
fn prepare_challenge(
    profile: MotionProfile,
    seed: Option<u64>,
    config: &Config,
) -> anyhow::Result<(DragChallenge, Vec<ChallengeCommand>)> {
    let mut challenge = DragChallenge::with_generator(path_generator(seed, config), config.challenge_params());
    let path: PathSpec = *challenge.open()?.path();

    let mut synth = match seed {
        Some(s) => InputSynthesizer::seeded(profile, s),
        None => InputSynthesizer::new(profile),
    };
    let commands = synth
        .drag_gesture(&path, config.drag_steps(), MonotonicClock::now())
        .into_iter()
        .map(ChallengeCommand::Pointer)
        .collect();
    Ok((challenge, commands))
}

/// Send commands paced by their own timestamps, then close the channel so
/// the runner settles on the finished trail.
async fn feed_commands(tx: mpsc::Sender<ChallengeCommand>, commands: Vec<ChallengeCommand>) {
    let mut last_t: Option<f64> = None;
    for command in commands {
        if let ChallengeCommand::Pointer(event) = &command {
            if let Some(prev) = last_t {
                let gap = (event.t - prev).max(0.0);
                tokio::time::sleep(Duration::from_secs_f64(gap / 1000.0)).await;
            }
            last_t = Some(event.t);
        }
        if tx.send(command).await.is_err() {
            break;
        }
    }
}

async fn run_submit(
    amount: &str,
    beneficiary: &str,
    profile: MotionProfile,
    flags: FlagArgs,
    config: &Config,
) -> anyhow::Result<()> {
    let session = SessionContext::new(config.screen_info());
    info!("Session {} ({:?} profile)", session.session_id(), profile);

    let mut recorder =
        TelemetryRecorder::with_capacities(config.capture.mouse_capacity, config.capture.key_capacity);
    let mut synth = InputSynthesizer::new(profile);
    for event in synth.form_fill(amount, beneficiary, MonotonicClock::now()) {
        recorder.observe(&event);
    }
    info!(
        "Captured {} pointer samples, {} keys, {} pastes",
        recorder.mouse_len(),
        recorder.keys_len(),
        recorder.paste_count()
    );

    let client = collector_client(config)?;
    let flags = Flags::from_args(flags);
    let form = ProtectedForm::new(&client, &session, &flags).with_options(config.form_options());
    let mut view = ConsoleView::new();

    let dispatch = form
        .submit(&recorder, Journey::new(amount, beneficiary), &mut view)
        .await?;

    if dispatch == Dispatch::OpenChallenge {
        info!("Behavior step-up requested");
        let (challenge, commands) = prepare_challenge(profile, None, config)?;
        let (tx, rx) = mpsc::channel(commands.len() + 1);
        let (outcome, ()) = tokio::join!(
            form.step_up(
                challenge,
                config.detector(),
                rx,
                DEFAULT_DISMISS_DELAY,
                &mut view,
            ),
            feed_commands(tx, commands),
        );
        report_outcome(outcome?);
    }

    Ok(())
}

async fn run_challenge(
    profile: MotionProfile,
    seed: Option<u64>,
    frame: Option<&Path>,
    flags: FlagArgs,
    config: &Config,
) -> anyhow::Result<()> {
    let session = SessionContext::new(config.screen_info());
    info!("Session {} ({:?} profile)", session.session_id(), profile);

    let client = collector_client(config)?;
    let flags = Flags::from_args(flags);
    let (challenge, commands) = prepare_challenge(profile, seed, config)?;
    let runner = ChallengeRunner::new(challenge, config.detector(), &client, &session, &flags);

    let params = config.challenge_params();
    let mut view = ConsoleView::new().with_guide(
        config.guide_style(),
        (params.canvas_width, params.canvas_height),
    );
    let (tx, rx) = mpsc::channel(commands.len() + 1);
    let (outcome, ()) = tokio::join!(runner.run(rx, &mut view), feed_commands(tx, commands));

    if let (Some(path), Some(svg)) = (frame, view.frame_svg()) {
        std::fs::write(path, svg)?;
        info!("Last challenge frame written to {:?}", path);
    }
    report_outcome(outcome?);

    Ok(())
}

fn report_outcome(outcome: ChallengeOutcome) {
    match outcome {
        ChallengeOutcome::Completed { passed, trail_len } => {
            info!("Challenge completed: passed={} trail={} points", passed, trail_len);
        }
        ChallengeOutcome::Cancelled => {
            warn!("Challenge cancelled");
        }
    }
}

fn run_preview(output: &PathBuf, seed: Option<u64>, config: &Config) -> anyhow::Result<()> {
    let params = config.challenge_params();
    let path = path_generator(seed, config).generate(params.canvas_width, params.canvas_height)?;

    let mut surface = SvgSurface::new();
    config
        .guide_style()
        .draw(&mut surface, (params.canvas_width, params.canvas_height), &path, path.start);
    std::fs::write(output, surface.finish())?;

    info!("Path preview written to {:?}", output);
    println!("{}", serde_json::to_string_pretty(&path)?);
    Ok(())
}

async fn run_watch(url: Option<String>, config: &Config) -> anyhow::Result<()> {
    let url = url.unwrap_or_else(|| config.stream.url.clone());
    info!("Following {} (Ctrl+C to stop)", url);

    let mut log = LiveEventLog::new(config.stream.max_entries);
    let mut view = ConsoleView::new();

    tokio::select! {
        result = stream::follow(&url, &mut log, |log| view.show_log_update(log)) => result?,
        _ = tokio::signal::ctrl_c() => info!("Stopped"),
    }

    Ok(())
}

fn run_config(action: ConfigAction, path: Option<PathBuf>, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Init { force } => {
            let path = path.unwrap_or_else(Config::default_path);
            if path.exists() && !force {
                println!("Config already exists at {:?}. Use --force to overwrite.", path);
                return Ok(());
            }
            Config::default().save(&path)?;
            println!("Wrote default configuration to {:?}", path);
        }
    }

    Ok(())
}
