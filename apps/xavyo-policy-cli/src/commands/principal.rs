//! Principal assignment commands

use clap::{Args, Subcommand};
use xavyo_access_policy::assignment::{PrincipalAssignmentConfig, ReadOutcome};

use super::{build_reconciler, load_json, print_json, EngineArgs};
use crate::error::{CliError, CliResult};

/// Principal assignment commands
#[derive(Args, Debug)]
pub struct PrincipalArgs {
    #[command(subcommand)]
    pub command: PrincipalCommands,
}

#[derive(Subcommand, Debug)]
pub enum PrincipalCommands {
    /// Assign a user, group or role to a policy and print the assignment id
    Create {
        /// Assignment JSON (inline or @filename)
        config: String,
    },
    /// Show the current state of an assignment (`policy_id:type:principal_id`)
    Read {
        /// Assignment id
        id: String,
    },
    /// Replace the name and directory fields of an assignment
    Update {
        /// Assignment id
        id: String,
        /// Assignment JSON (inline or @filename)
        config: String,
    },
    /// Remove a principal from a policy
    Delete {
        /// Assignment id
        id: String,
    },
    /// Print an existing assignment as assignment JSON
    Import {
        /// Assignment id
        id: String,
    },
}

pub async fn execute(args: PrincipalArgs, engine: &EngineArgs) -> CliResult<()> {
    let (reconciler, _) = build_reconciler(engine)?;
    let principals = reconciler.principals();

    match args.command {
        PrincipalCommands::Create { config } => {
            let desired: PrincipalAssignmentConfig = load_json(&config)?;
            let id = principals.create(&desired).await?;
            println!("{id}");
        }
        PrincipalCommands::Read { id } => match principals.read(&id).await? {
            ReadOutcome::Found(state) => print_json(&state, engine.output)?,
            ReadOutcome::Removed => return Err(CliError::Removed(id)),
        },
        PrincipalCommands::Update { id, config } => {
            let desired: PrincipalAssignmentConfig = load_json(&config)?;
            let state = principals.update(&id, &desired).await?;
            print_json(&state, engine.output)?;
        }
        PrincipalCommands::Delete { id } => {
            principals.delete(&id).await?;
            tracing::info!(assignment = %id, "Principal removed");
        }
        PrincipalCommands::Import { id } => {
            let state = principals.import(&id).await?;
            print_json(&state, engine.output)?;
        }
    }

    Ok(())
}
