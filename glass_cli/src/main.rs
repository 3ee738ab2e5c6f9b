#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod actuator;
mod cli;
mod error_fmt;
mod logging;
mod rt;
mod run;
mod self_check;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use logging::Role;
use rt::RtOptions;

fn report_and_exit(err: &eyre::Report) -> ! {
    let json = JSON_MODE.get().copied().unwrap_or(false);
    tracing::error!(error = %err, "exiting");
    if json {
        println!("{}", error_fmt::format_error_json(err));
    } else {
        eprintln!("{}", error_fmt::humanize(err));
    }
    std::process::exit(error_fmt::exit_code_for_error(err));
}

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("color-eyre not installed: {e}");
    }

    let (cfg, mtime) = match glass_config::load_path(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => report_and_exit(&e),
    };

    let role = match cli.cmd {
        Commands::Actuator { .. } => Role::Actuator,
        Commands::Run | Commands::SelfCheck => Role::Orchestrator,
    };
    logging::init(role, cli.json, cli.log_level.as_deref(), &cfg.logging);

    let result = match cli.cmd {
        Commands::Run => run::run_orchestrator(
            &cli.config,
            &cfg,
            mtime,
            cli.json,
            cli.log_level.as_deref(),
        ),
        Commands::Actuator {
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
        } => {
            let rt = rt.then_some(RtOptions {
                prio: rt_prio,
                lock: rt_lock,
                cpu: rt_cpu,
            });
            actuator::run_actuator(&cli.config, &cfg, mtime, rt)
        }
        Commands::SelfCheck => {
            print!("{}", self_check::summary(&cli.config, &cfg));
            Ok(())
        }
    };

    if let Err(e) = result {
        report_and_exit(&e);
    }
}
