//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the signal handler and
//! dispatches the subcommand.

use anyhow::{bail, Context, Result};
use std::io::{self, Read};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use atomic_replace::cli::{Args, Command, SweepArgs, WriteArgs};
use atomic_replace::config::{create_template_config, load_config, LoadResult, CONFIG_ENV};
use atomic_replace::output as out;
use atomic_replace::{
    copy_into, default_config_path, shutdown, sweep_orphans, AtomicReplacer, Config, ReplaceError,
    TracingDiagnostics,
};

use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handled before logging init
    if args.print_config {
        print_config_location();
        return Ok(());
    }
    if args.init_config {
        let Some(path) = default_config_path() else {
            bail!("could not determine a config path; set {CONFIG_ENV}");
        };
        create_template_config(&path)?;
        out::print_success(&format!("A template atomic_replace config was written to: {}", path.display()));
        return Ok(());
    }

    let loaded = load_config()?;
    if let LoadResult::Loaded(_, path) = &loaded {
        debug!(path = %path.display(), "Using config file");
    }
    let mut cfg = loaded.into_config();
    args.apply_overrides(&mut cfg)?;

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json_logs).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {}", e));
        e
    })?;

    // Guard is dropped on a second SIGINT so buffered file logs get flushed
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            if shutdown::request() {
                if let Ok(mut g) = guard_slot.lock() {
                    let _ = g.take();
                }
                std::process::exit(130);
            }
            out::print_warn("Received interrupt; finishing current chunk and aborting (press again to exit now)...");
        })
        .context("install signal handler")?;
    }

    debug!(?args, ?cfg, "Starting atomic_replace");

    let result = match &args.command {
        Some(Command::Write(w)) => run_write(&cfg, w),
        Some(Command::Sweep(s)) => run_sweep(&cfg, s),
        None => Err(anyhow::anyhow!("no command given; try `atomic_replace --help`")),
    };

    if let Err(e) = &result {
        log_failure(e);
    }

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}

fn print_config_location() {
    if let Ok(cfg_env) = std::env::var(CONFIG_ENV)
        && !cfg_env.is_empty()
    {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {}\n", cfg_env));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default atomic_replace config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run with --init-config to create a template.");
            }
        }
        None => out::print_error("Could not determine a default config path"),
    }
}

fn replacer_for(cfg: &Config) -> AtomicReplacer {
    AtomicReplacer::new(cfg.replace_options(Arc::new(TracingDiagnostics)))
}

fn run_write(cfg: &Config, w: &WriteArgs) -> Result<()> {
    let replacer = replacer_for(cfg);
    let stdin = io::stdin();

    if w.json {
        let opts = w.json_options().map_err(ReplaceError::from)?;
        debug!(target_path = %w.target.display(), "Reading JSON from stdin");
        let mut text = String::new();
        stdin.lock().read_to_string(&mut text).map_err(|source| ReplaceError::Input { source })?;
        let value: serde_json::Value = serde_json::from_str(&text).context("parse stdin as JSON")?;
        // Ctrl-C while stdin was being read.
        shutdown::check()?;
        replacer.write_json(&w.target, &value, &opts)?;
        info!(target_path = %w.target.display(), "JSON written");
        return Ok(());
    }

    let encoding = w.encoding().map_err(ReplaceError::from)?;
    let mut session = replacer.begin(&w.target, w.mode(), encoding)?;
    let copied = copy_into(&mut stdin.lock(), &mut session)?;
    let target = session.commit()?;
    info!(target_path = %target.display(), bytes_in = copied, "File replaced");
    Ok(())
}

fn run_sweep(cfg: &Config, s: &SweepArgs) -> Result<()> {
    let report = sweep_orphans(&s.dir, &s.sweep_options(cfg))?;
    out::print_sweep_report(&s.dir, &report);
    if !report.is_clean() {
        bail!("{} staging file(s) could not be removed", report.failed.len());
    }
    Ok(())
}

fn log_failure(e: &anyhow::Error) {
    let Some(re) = e.downcast_ref::<ReplaceError>() else {
        error!(error = %format!("{e:#}"), "Command failed");
        return;
    };
    let code = re.code();
    let kind = re.kind();
    match re {
        ReplaceError::Commit { staging, target, .. } => {
            error!(code, kind, staging = %staging.display(), target_path = %target.display(), error = %re, "Rename failed; staging file kept for inspection")
        }
        ReplaceError::Interrupted => error!(code, kind, "Write aborted by user; target unchanged"),
        _ => error!(code, kind, error = %re, "Command failed"),
    }
}

/// Process exit status for a failed run.
pub fn exit_code(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<ReplaceError>()
        .and_then(|re| u8::try_from(re.code()).ok())
        .unwrap_or(1)
}
