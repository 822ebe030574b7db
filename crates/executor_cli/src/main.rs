//! Inspection CLI for an executor database.
//!
//! # Responsibility
//! - Open an existing executor state and print registry, ledger,
//!   executive and journal views.
//! - Never run governance operations; those flow through a host.
//!
//! # Invariants
//! - A missing database file is reported, never created.
//! - Opening an older database still applies pending schema migrations.

use clap::{Parser, Subcommand};
use executor_core::db::open_db;
use executor_core::{
    init_logging_from_config, Executor, ExecutorConfig, GovernanceEvent, LocalHost, Principal,
};
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "executor_cli")]
#[command(about = "Inspect the governance state of an executor database")]
#[command(version)]
struct Cli {
    /// Path to the executor JSON config
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show executor identity, phase and counts
    Status,

    /// List every registry entry
    Extensions,

    /// List executed proposals with their block height
    Executions,

    /// List journaled governance events
    Events {
        /// Only show events of this kind
        #[arg(short, long, value_parser = ["extension", "execute"])]
        kind: Option<String>,
    },

    /// Print whether a principal is an enabled extension
    IsExtension {
        /// Principal as `ADDRESS` or `ADDRESS.contract-name`
        #[arg(value_parser = parse_principal)]
        principal: Principal,
    },

    /// Print the block height a proposal was executed at
    ExecutedAt {
        /// Proposal principal
        #[arg(value_parser = parse_principal)]
        principal: Principal,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(
                "event=cli_command module=cli status=error command={:?} error={err}",
                cli.command
            );
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = ExecutorConfig::load(&cli.config)?;
    init_logging_from_config(&config)?;

    if !config.db_path.is_file() {
        return Err(format!(
            "no executor database at `{}`",
            config.db_path.display()
        )
        .into());
    }
    let conn = open_db(&config.db_path)?;
    let host = LocalHost::new();
    let dao = Executor::try_new(&conn, &host, config.executor.clone(), config.deployer.clone())?;

    match &cli.command {
        Command::Status => {
            let executive = dao.executive()?;
            println!("executor={}", dao.identity());
            println!("phase={}", executive.phase().as_str());
            println!("executive={}", executive.holder());
            println!("extensions={}", dao.extensions()?.len());
            println!("executions={}", dao.executions()?.len());
            println!("core_version={}", executor_core::core_version());
        }
        Command::Extensions => {
            for entry in dao.extensions()? {
                println!("{} enabled={}", entry.principal, entry.enabled);
            }
        }
        Command::Executions => {
            for record in dao.executions()? {
                println!("{} executed_at={}", record.proposal, record.executed_at);
            }
        }
        Command::Events { kind } => {
            let events = match kind {
                Some(kind) => dao.events_of_kind(kind)?,
                None => dao.events()?,
            };
            for recorded in events {
                println!(
                    "#{} height={} {}",
                    recorded.seq,
                    recorded.block_height,
                    describe_event(&recorded.event)
                );
            }
        }
        Command::IsExtension { principal } => {
            println!("{}", dao.is_extension(principal)?);
        }
        Command::ExecutedAt { principal } => match dao.executed_at(principal)? {
            Some(height) => println!("{height}"),
            None => println!("none"),
        },
    }
    Ok(())
}

fn parse_principal(raw: &str) -> Result<Principal, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

fn describe_event(event: &GovernanceEvent) -> String {
    match event {
        GovernanceEvent::Extension { extension, enabled } => {
            format!("extension {extension} enabled={enabled}")
        }
        GovernanceEvent::Execute { proposal } => format!("execute {proposal}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{run, Cli, Command};
    use clap::Parser;

    #[test]
    fn principal_arguments_are_parsed_up_front() {
        let cli = Cli::try_parse_from([
            "executor_cli",
            "cfg.json",
            "executed-at",
            "ST1DEPLOYER.edp000-bootstrap",
        ])
        .expect("valid arguments");
        match cli.command {
            Command::ExecutedAt { principal } => {
                assert_eq!(principal.contract_name(), Some("edp000-bootstrap"));
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["executor_cli", "cfg.json", "is-extension"]).is_err());
        assert!(
            Cli::try_parse_from(["executor_cli", "cfg.json", "is-extension", "lower.case"])
                .is_err()
        );
    }

    #[test]
    fn events_kind_filter_is_restricted() {
        let cli = Cli::try_parse_from(["executor_cli", "cfg.json", "events", "--kind", "execute"])
            .expect("known kind");
        assert!(matches!(
            cli.command,
            Command::Events { kind: Some(ref kind) } if kind == "execute"
        ));
        assert!(Cli::try_parse_from(["executor_cli", "cfg.json", "events", "--kind", "mint"]).is_err());
    }

    #[test]
    fn missing_database_is_reported_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("absent.sqlite3");
        let config_path = dir.path().join("executor.json");
        std::fs::write(
            &config_path,
            format!(
                r#"{{"executor": "ST1DEPLOYER.executor-dao", "deployer": "ST1DEPLOYER", "db_path": {:?}}}"#,
                db_path.display().to_string()
            ),
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "executor_cli".to_string(),
            config_path.display().to_string(),
            "status".to_string(),
        ])
        .unwrap();
        let err = run(&cli).expect_err("absent database must fail");
        assert!(err.to_string().contains("no executor database"));
        assert!(!db_path.exists());
    }
}
