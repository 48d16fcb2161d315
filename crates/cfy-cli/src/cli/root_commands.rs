use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Check an email/password pair against the login form rules.
    Validate(CredentialArgs),
    /// Sign in with Firebase and resolve the session against Firestore.
    Login(CredentialArgs),
    /// Resolve a session offline against profiles loaded from a file.
    Simulate(SimulateArgs),
}

#[derive(Clone, Debug, Args)]
pub struct CredentialArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

#[derive(Clone, Debug, Args)]
pub struct SimulateArgs {
    /// JSON array of profile documents.
    #[arg(long)]
    pub profiles: PathBuf,
    /// Signed-in uid. Omit to simulate a signed-out visitor.
    #[arg(long)]
    pub uid: Option<String>,
    /// Artificial profile store latency in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,
}
