//! Instance target assignment commands

use clap::{Args, Subcommand};
use xavyo_access_policy::assignment::{ReadOutcome, TargetAssignmentConfig};

use super::{build_reconciler, load_json, print_json, EngineArgs};
use crate::error::{CliError, CliResult};

/// Instance target assignment commands
#[derive(Args, Debug)]
pub struct TargetArgs {
    #[command(subcommand)]
    pub command: TargetCommands,
}

#[derive(Subcommand, Debug)]
pub enum TargetCommands {
    /// Assign an instance to a policy and print the assignment id
    Create {
        /// Assignment JSON (inline or @filename)
        config: String,
    },
    /// Show the current state of an assignment (`policy_id:instance_id`)
    Read {
        /// Assignment id
        id: String,
    },
    /// Replace the authentication profile of an assignment
    Update {
        /// Assignment id
        id: String,
        /// Assignment JSON (inline or @filename)
        config: String,
    },
    /// Remove an instance from a policy
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

pub async fn execute(args: TargetArgs, engine: &EngineArgs) -> CliResult<()> {
    let (reconciler, client) = build_reconciler(engine)?;
    let targets = reconciler.targets(client);

    match args.command {
        TargetCommands::Create { config } => {
            let desired: TargetAssignmentConfig = load_json(&config)?;
            let id = targets.create(&desired).await?;
            println!("{id}");
        }
        TargetCommands::Read { id } => match targets.read(&id).await? {
            ReadOutcome::Found(state) => print_json(&state, engine.output)?,
            ReadOutcome::Removed => return Err(CliError::Removed(id)),
        },
        TargetCommands::Update { id, config } => {
            let desired: TargetAssignmentConfig = load_json(&config)?;
            let state = targets.update(&id, &desired).await?;
            print_json(&state, engine.output)?;
        }
        TargetCommands::Delete { id } => {
            targets.delete(&id).await?;
            tracing::info!(assignment = %id, "Instance target removed");
        }
        TargetCommands::Import { id } => {
            let state = targets.import(&id).await?;
            print_json(&state, engine.output)?;
        }
    }

    Ok(())
}
