use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "svc",
    about = "SecureVoyageChain: FHE-protected voyage and shipment tracking",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a client configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Connect this wallet account, overriding the configuration
    #[arg(long, global = true)]
    pub account: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new voyage
    CreateVoyage(CreateVoyageArgs),
    /// Add a shipment to an active voyage
    AddShipment(AddShipmentArgs),
    /// File an insurance claim against a voyage
    SubmitClaim(SubmitClaimArgs),
    /// Show a voyage as recorded on the ledger
    VoyageInfo(VoyageInfoArgs),
    /// Show wallet, loading, and error status
    Status,
    /// Run a scripted session against a local ledger
    Demo,
}

#[derive(Args)]
pub struct CreateVoyageArgs {
    pub origin: String,
    pub destination: String,
    /// Voyage duration in days
    pub duration_days: u64,
}

#[derive(Args)]
pub struct AddShipmentArgs {
    pub voyage_id: u64,
    pub cargo_type: String,
}

#[derive(Args)]
pub struct SubmitClaimArgs {
    pub voyage_id: u64,
    #[arg(default_value = "")]
    pub claim_reason: String,
}

#[derive(Args)]
pub struct VoyageInfoArgs {
    pub voyage_id: u64,
}
