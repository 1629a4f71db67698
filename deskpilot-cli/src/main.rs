use anyhow::{Context, bail};
use clap::Parser;
use deskpilot_core::config::PilotConfig;
use deskpilot_engine::session::{SessionOutcome, SessionReport};
use deskpilot_engine::traits::Automation;
use deskpilot_platform::recording::RecordingAutomation;
use deskpilot_runtime::config_store::ConfigStore;
use deskpilot_runtime::instruction::{load_instruction, non_empty_instruction};
use deskpilot_runtime::runtime_engine::build_driver_from_config;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "deskpilot")]
#[command(about = "Let a model drive the desktop to carry out a written instruction")]
struct Cli {
    /// Instruction text. Takes precedence over --instruction-file.
    #[arg(long, conflicts_with = "instruction_file")]
    instruction: Option<String>,

    /// File holding the instruction.
    #[arg(long, default_value = "prompt.txt")]
    instruction_file: PathBuf,

    /// JSON config file (see PilotConfig).
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON array of Messages API response bodies to replay as the model.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Record actions instead of touching the real desktop.
    #[arg(long)]
    dry_run: bool,

    /// Stop after this many model turns.
    #[arg(long)]
    max_turns: Option<u32>,

    /// Write the effective config (defaults, --config, overrides) to this path and exit.
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .init();
}

fn resolve_config(cli: &Cli) -> anyhow::Result<PilotConfig> {
    let mut cfg = match &cli.config {
        Some(path) => ConfigStore::at_path(path).load()?,
        None => PilotConfig::default(),
    };
    if let Some(n) = cli.max_turns {
        cfg.max_turns = Some(n);
    }
    Ok(cfg)
}

fn resolve_instruction(cli: &Cli) -> anyhow::Result<String> {
    match &cli.instruction {
        Some(text) => non_empty_instruction(text).context("--instruction is empty"),
        None => load_instruction(&cli.instruction_file),
    }
}

#[cfg(feature = "desktop")]
fn desktop_automation() -> anyhow::Result<Arc<dyn Automation>> {
    Ok(Arc::new(deskpilot_platform::desktop::DesktopAutomation::new()))
}

#[cfg(not(feature = "desktop"))]
fn desktop_automation() -> anyhow::Result<Arc<dyn Automation>> {
    bail!("built without the `desktop` feature; rerun with --dry-run")
}

fn print_report(report: &SessionReport) {
    match &report.outcome {
        SessionOutcome::Completed => println!("Completed."),
        SessionOutcome::Failed(e) => println!("Failed: {e}"),
        SessionOutcome::Interrupted => println!("Interrupted."),
        SessionOutcome::TurnLimitReached { limit } => {
            println!("Stopped after {limit} model turns.")
        }
    }
    if let Some(text) = &report.final_text {
        println!("\n{text}");
    }
    println!(
        "\n{} model turns, {} actions ({} failed), {} ms",
        report.stats.model_turns,
        report.stats.actions_dispatched,
        report.stats.action_failures,
        report.elapsed_ms
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = resolve_config(&cli)?;
    if let Some(path) = &cli.write_config {
        let store = ConfigStore::at_path(path);
        store.save(&cfg)?;
        println!("Wrote config to {}", store.path().display());
        return Ok(ExitCode::SUCCESS);
    }

    let instruction = resolve_instruction(&cli)?;
    let Some(script) = &cli.script else {
        bail!("no model client configured; pass --script with recorded responses");
    };

    let recorder = cli.dry_run.then(|| Arc::new(RecordingAutomation::new()));
    let automation: Arc<dyn Automation> = match &recorder {
        Some(r) => r.clone() as Arc<dyn Automation>,
        None => desktop_automation()?,
    };

    let driver = build_driver_from_config(cfg, script, automation)?;

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            log::warn!("could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let report = driver.run_until(&instruction, interrupt).await;

    if let Some(r) = &recorder {
        for event in r.events() {
            println!("[dry-run] {event:?}");
        }
    }
    print_report(&report);

    Ok(if report.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
