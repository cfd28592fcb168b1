use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use svc_ledger::{
    ClientConfig, ClientStatus, InMemoryLedger, LedgerClient, ReadState, WalletSigner,
};
use svc_orchestrator::{
    ClaimForm, ShipmentForm, VoyageForm, VoyageOrchestrator, WorkflowKind, WorkflowOutcome,
};
use svc_types::{Address, Voyage, VoyageId};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let format = cli.format.clone();
    match cli.command {
        Command::CreateVoyage(args) => cmd_create_voyage(&config, &format, args).await,
        Command::AddShipment(args) => cmd_add_shipment(&config, &format, args).await,
        Command::SubmitClaim(args) => cmd_submit_claim(&config, &format, args).await,
        Command::VoyageInfo(args) => cmd_voyage_info(&config, &format, args).await,
        Command::Status => cmd_status(&config, &format),
        Command::Demo => cmd_demo(&config, &format).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(account) = &cli.account {
        let address = Address::from_hex(account)
            .with_context(|| format!("invalid account address {account:?}"))?;
        config.account = Some(address);
    }
    Ok(config)
}

/// A local ledger with the configured voyages preloaded, and the client and
/// orchestrator wired to it.
struct Session {
    ledger: Arc<InMemoryLedger>,
    orchestrator: VoyageOrchestrator,
}

fn open_session(config: &ClientConfig) -> anyhow::Result<Session> {
    let ledger = Arc::new(if config.contract_address.is_zero() {
        InMemoryLedger::default()
    } else {
        InMemoryLedger::new(config.contract_address)
    });

    let owner = config.account.unwrap_or_else(|| Address::from_label("carrier"));
    for seed in &config.voyages {
        let id = ledger
            .seed_voyage(owner, seed)
            .with_context(|| format!("seeding voyage {} -> {}", seed.origin, seed.destination))?;
        tracing::debug!(voyage_id = %id, origin = %seed.origin, "seeded voyage");
    }

    let signer = Arc::new(WalletSigner::new(ledger.clone(), config.account));
    let client = Arc::new(LedgerClient::new(ledger.contract_address(), signer, ledger.clone()));
    tracing::info!(
        contract = %ledger.contract_address(),
        chain_id = config.chain_id,
        connected = client.address().is_some(),
        "session opened"
    );
    Ok(Session {
        ledger,
        orchestrator: VoyageOrchestrator::new(client),
    })
}

#[derive(Debug, Serialize)]
struct OutcomeReport {
    workflow: WorkflowKind,
    result: &'static str,
    message: Option<String>,
    record_id: Option<u64>,
    tracking_number: Option<String>,
    status: ClientStatus,
}

impl OutcomeReport {
    fn new(kind: WorkflowKind, outcome: &WorkflowOutcome, status: ClientStatus) -> Self {
        let (result, message, record_id, tracking_number) = match outcome {
            WorkflowOutcome::Skipped => ("skipped", None, None, None),
            WorkflowOutcome::Busy => ("busy", None, None, None),
            WorkflowOutcome::Succeeded(ack) => (
                "succeeded",
                Some(ack.message.clone()),
                Some(ack.record_id),
                ack.tracking_number.as_ref().map(|t| t.to_string()),
            ),
            WorkflowOutcome::Failed(err) => ("failed", Some(err.message()), None, None),
        };
        Self {
            workflow: kind,
            result,
            message,
            record_id,
            tracking_number,
            status,
        }
    }
}

fn print_outcome(format: &OutputFormat, report: &OutcomeReport) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    match report.result {
        "succeeded" => {
            let message = report.message.as_deref().unwrap_or_default();
            let id = report.record_id.map(|id| format!("#{id}")).unwrap_or_default();
            println!("{} {} {}", "✓".green().bold(), message, id.yellow());
            if let Some(tracking) = &report.tracking_number {
                println!("  Tracking: {}", tracking.cyan());
            }
        }
        "failed" => {
            let message = report.message.as_deref().unwrap_or_default();
            println!("{} Error: {}", "✗".red().bold(), message.red());
        }
        "skipped" => println!(
            "{} Wallet not connected; pass {} to manage voyages.",
            "!".yellow().bold(),
            "--account".bold()
        ),
        _ => println!("{} {} is already in progress.", "…".dimmed(), report.workflow),
    }
    Ok(())
}

fn print_voyage(format: &OutputFormat, voyage: &Voyage) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(voyage)?);
        return Ok(());
    }
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    println!("Voyage {}", format!("#{}", voyage.id).yellow().bold());
    println!("  Route:     {} → {}", voyage.origin.bold(), voyage.destination.bold());
    println!("  Status:    {}", voyage.status().to_string().green());
    println!("  Owner:     {}", voyage.owner.short_id().cyan());
    if let (Some(departs), Some(arrives)) = (voyage.departs_at(), voyage.arrives_at()) {
        println!(
            "  Schedule:  {} to {} ({} days)",
            departs.format("%Y-%m-%d"),
            arrives.format("%Y-%m-%d"),
            voyage.duration_days()
        );
    }
    println!("  Progress:  {}%", voyage.progress_percent(now));
    println!("  Cargo value:      {}", voyage.cargo_value.to_string().dimmed());
    println!("  Insurance amount: {}", voyage.insurance_amount.to_string().dimmed());
    println!("  Risk score:       {}", voyage.risk_score.to_string().dimmed());
    Ok(())
}

async fn cmd_create_voyage(
    config: &ClientConfig,
    format: &OutputFormat,
    args: CreateVoyageArgs,
) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let o = &session.orchestrator;
    o.set_voyage_form(VoyageForm::new(args.origin, args.destination, args.duration_days));
    let outcome = o.create_voyage().await?;
    print_outcome(format, &OutcomeReport::new(WorkflowKind::CreateVoyage, &outcome, o.status()))
}

async fn cmd_add_shipment(
    config: &ClientConfig,
    format: &OutputFormat,
    args: AddShipmentArgs,
) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let o = &session.orchestrator;
    o.set_shipment_form(ShipmentForm::new(VoyageId::new(args.voyage_id), args.cargo_type));
    let outcome = o.add_shipment().await?;
    print_outcome(format, &OutcomeReport::new(WorkflowKind::AddShipment, &outcome, o.status()))
}

async fn cmd_submit_claim(
    config: &ClientConfig,
    format: &OutputFormat,
    args: SubmitClaimArgs,
) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let o = &session.orchestrator;
    o.set_claim_form(ClaimForm::new(VoyageId::new(args.voyage_id), args.claim_reason));
    let outcome = o.submit_claim().await?;
    print_outcome(format, &OutcomeReport::new(WorkflowKind::SubmitClaim, &outcome, o.status()))
}

async fn cmd_voyage_info(
    config: &ClientConfig,
    format: &OutputFormat,
    args: VoyageInfoArgs,
) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let query = session
        .orchestrator
        .client()
        .voyage_query(VoyageId::new(args.voyage_id));
    match query.refresh().await {
        ReadState::Ready(voyage) => print_voyage(format, &voyage),
        ReadState::Failed(reason) => {
            anyhow::bail!("failed to read voyage {}: {reason}", query.voyage_id())
        }
        other => anyhow::bail!("read of voyage {} did not settle: {other:?}", query.voyage_id()),
    }
}

fn cmd_status(config: &ClientConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let session = open_session(config)?;
    let status = session.orchestrator.status();
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }
    println!("Contract: {}", session.ledger.contract_address().to_hex().cyan());
    println!("Chain ID: {}", config.chain_id);
    match status.address {
        Some(address) => println!(
            "Wallet:   {} ({})",
            "connected".green(),
            address.short_id().cyan()
        ),
        None => println!("Wallet:   {}", "not connected".yellow()),
    }
    println!("Voyages:  {}", session.ledger.voyage_count().to_string().bold());
    println!("Loading:  {}", status.is_loading);
    if let Some(error) = status.error {
        println!("Error:    {}", error.red());
    }
    Ok(())
}

/// Scripted session: create a voyage, ship on it, file a claim, trip a
/// revert, then verify delivery and reveal the sealed values.
async fn cmd_demo(config: &ClientConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let mut config = config.clone();
    let carrier = *config.account.get_or_insert_with(|| Address::from_label("demo-carrier"));
    let session = open_session(&config)?;
    let o = &session.orchestrator;
    let mut reports = Vec::new();

    o.set_voyage_form(VoyageForm::new("Shanghai Port", "Los Angeles Port", 14));
    let created = o.create_voyage().await?;
    reports.push(OutcomeReport::new(WorkflowKind::CreateVoyage, &created, o.status()));
    let voyage_id = created
        .acknowledgment()
        .map(|ack| VoyageId::new(ack.record_id))
        .context("demo voyage was not created")?;

    o.set_shipment_form(ShipmentForm::new(voyage_id, "Electronics"));
    let shipped = o.add_shipment().await?;
    reports.push(OutcomeReport::new(WorkflowKind::AddShipment, &shipped, o.status()));

    o.set_claim_form(ClaimForm::new(voyage_id, "Container damaged in transit"));
    let claimed = o.submit_claim().await?;
    reports.push(OutcomeReport::new(WorkflowKind::SubmitClaim, &claimed, o.status()));

    o.set_voyage_form(VoyageForm::new("Rotterdam", "New York", 0));
    let rejected = o.create_voyage().await?;
    reports.push(OutcomeReport::new(WorkflowKind::CreateVoyage, &rejected, o.status()));

    session.ledger.verify_voyage(voyage_id, carrier)?;
    let sealed = session.ledger.reveal(voyage_id)?;
    let voyage = o.voyage_info(voyage_id).await?;

    if let OutputFormat::Json = format {
        let summary = serde_json::json!({
            "workflows": reports,
            "voyage": voyage,
            "revealed": sealed,
            "requests": o.client().requests().records(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} Demo session as {}", "▶".bold(), carrier.short_id().cyan());
    for report in &reports {
        print_outcome(format, report)?;
    }
    println!();
    print_voyage(format, &voyage)?;
    println!(
        "  Revealed: cargo value {}, insurance {}, risk {}",
        sealed.cargo_value.to_string().bold(),
        sealed.insurance_amount.to_string().bold(),
        sealed.risk_score.to_string().bold()
    );
    println!();
    println!("Requests:");
    for record in o.client().requests().records() {
        let state = match record.state.error() {
            Some(err) => format!("failed: {err}").red(),
            None if record.state.is_pending() => "pending".yellow(),
            None => "confirmed".green(),
        };
        println!(
            "  {} {:<22} {}",
            record.id.short_id().dimmed(),
            record.operation.to_string(),
            state
        );
    }
    Ok(())
}
