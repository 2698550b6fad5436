#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod console;
mod error_fmt;
mod logging;
mod parse_cmd;
mod session_cmd;

use clap::Parser;
use eyre::WrapErr;

use crate::cli::{Cli, Commands, JSON_MODE};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = run(cli) {
        if cli::json_mode() {
            println!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        tracing::error!(error = %err, "venitrain failed");
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    color_eyre::install()?;

    let cfg = venitrain_config::load_path(&cli.config).wrap_err("invalid configuration")?;
    cfg.validate().wrap_err("invalid configuration")?;
    let level = cli
        .log_level
        .clone()
        .or_else(|| cfg.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    logging::init(cli.json, &level, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run(args) => session_cmd::run_session(&cfg, &args),
        Commands::Parse { file, interval_ms } => parse_cmd::parse_capture(&file, interval_ms),
        Commands::SelfCheck => parse_cmd::self_check(&cfg),
    }
}
