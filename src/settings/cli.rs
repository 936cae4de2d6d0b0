use super::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(name = "tokenkeeper", about = "Keeps the admin panel API session fresh")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show whether a session is stored and how long it has left.
    Status,
    /// Store tokens obtained from the login endpoint.
    Login {
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        refresh_token: String,
        /// Username recorded alongside the tokens.
        #[arg(long)]
        user: Option<String>,
    },
    /// Store a locally minted session; only accepted by the fake backend.
    DemoLogin {
        #[arg(long, default_value = "demo")]
        user: String,
    },
    /// Force one refresh round-trip.
    Refresh,
    /// Drop every stored credential.
    Logout,
    /// Keep the session alive until interrupted.
    Watch,
}
