//! xavyo-policy - manage access-policy assignments from the command line
//!
//! Each subcommand maps onto one reconciler operation:
//! - `target create|read|update|delete|import` for instance targets
//! - `principal create|read|update|delete|import` for users, groups and roles
//!
//! The API endpoint and token are read from `ACCESS_POLICY_API_URL` and
//! `ACCESS_POLICY_API_TOKEN`.

use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod error;
mod logging;

use error::CliResult;

/// Access-policy assignment management
#[derive(Parser, Debug)]
#[command(name = "xavyo-policy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(flatten)]
    engine: commands::EngineArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage instance target assignments
    Target(commands::target::TargetArgs),

    /// Manage principal assignments
    Principal(commands::principal::PrincipalArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_logging(logging::default_filter(cli.verbose), cli.json_logs);

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Target(args) => commands::target::execute(args, &cli.engine).await,
        Commands::Principal(args) => commands::principal::execute(args, &cli.engine).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::principal::PrincipalCommands;
    use commands::target::TargetCommands;
    use commands::OutputFormat;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_target_create() {
        let cli = Cli::try_parse_from(["xavyo-policy", "target", "create", "@assignment.json"])
            .unwrap();
        match cli.command {
            Commands::Target(args) => match args.command {
                TargetCommands::Create { config } => assert_eq!(config, "@assignment.json"),
                other => panic!("Expected Create, got: {other:?}"),
            },
            other => panic!("Expected Target, got: {other:?}"),
        }
        assert!(!cli.engine.strict);
        assert_eq!(cli.engine.output, OutputFormat::Pretty);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "xavyo-policy",
            "principal",
            "read",
            "P1:USER:u-7",
            "--strict",
            "--partition-key",
            "AWS",
            "--output",
            "compact",
            "-vv",
        ])
        .unwrap();
        assert!(cli.engine.strict);
        assert_eq!(cli.engine.partition_key.as_deref(), Some("AWS"));
        assert_eq!(cli.engine.output, OutputFormat::Compact);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Principal(args) => {
                assert!(matches!(args.command, PrincipalCommands::Read { ref id } if id == "P1:USER:u-7"));
            }
            other => panic!("Expected Principal, got: {other:?}"),
        }
    }

    #[test]
    fn test_parse_update_requires_config() {
        assert!(Cli::try_parse_from(["xavyo-policy", "target", "update", "P1:42"]).is_err());
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["xavyo-policy", "target", "rename", "P1:42"]).is_err());
    }
}
