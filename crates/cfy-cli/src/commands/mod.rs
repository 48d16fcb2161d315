mod login;
mod session;
mod simulate;
mod validate;

use crate::cli::{Commands, GlobalFlags};

/// Route a parsed command to its handler.
pub async fn dispatch(command: &Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Validate(args) => validate::handle(args, flags),
        Commands::Login(args) => login::handle(args, flags).await,
        Commands::Simulate(args) => simulate::handle(args, flags).await,
    }
}
