//! `carelog` - CLI for the offline-first clinical records core
//!
//! This binary provides the command-line interface for recording
//! measurements and insurance cards and inspecting per-group trends.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;

use carelog::cli::{
    CardCommand, Cli, Command, ConfigCommand, HistoryCommand, MeasureCommand, OutputFormat,
    StatusCommand, TrendCommand,
};
use carelog::resolver::{resolve_card, ResolvedState};
use carelog::trend::{summarize, TrendConfig};
use carelog::{
    history, init_logging, Config, EntityKind, InsuranceCard, Measurement, RecordStore,
    SqliteStore, StoredRecord,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Measure(cmd) => handle_measure(&config, cmd).await,
        Command::Card(cmd) => handle_card(&config, cmd).await,
        Command::History(cmd) => handle_history(&config, &cmd).await,
        Command::Trend(cmd) => handle_trend(&config, &cmd).await,
        Command::Status(cmd) => handle_status(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    SqliteStore::open(config.database_path())
        .with_context(|| format!("opening record database {}", config.database_path().display()))
}

async fn handle_measure(config: &Config, cmd: MeasureCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;

    let measurement = Measurement::new(
        cmd.patient,
        cmd.measurement_type.into(),
        cmd.target,
        cmd.side.into(),
        cmd.value,
        cmd.recorded_by,
    );
    let saved = store
        .save(StoredRecord::Measurement(measurement))
        .await
        .context("saving measurement")?;

    if let StoredRecord::Measurement(m) = saved {
        println!(
            "Recorded {} {}/{} = {} for {} (id {})",
            m.measurement_type, m.target, m.side, m.value, m.patient_id, m.id
        );
    }
    Ok(())
}

async fn handle_card(config: &Config, cmd: CardCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;

    match cmd {
        CardCommand::Save {
            id,
            patient,
            provider,
            policy_number,
            plan,
            expires,
        } => {
            let expires_at = expires
                .as_deref()
                .map(parse_timestamp)
                .transpose()
                .context("parsing --expires")?;

            // A dangling or absent id silently becomes a create flow.
            let mut card = match resolve_card(&store, id.as_deref()).await {
                ResolvedState::Found(card) => card,
                ResolvedState::CreateMode => {
                    InsuranceCard::new(patient.clone(), provider.clone(), policy_number.clone())
                }
            };
            card.patient_id = patient;
            card.provider = provider;
            card.policy_number = policy_number;
            card.plan = plan;
            card.expires_at = expires_at;
            card.updated_at = Utc::now();

            let saved = store
                .save(StoredRecord::InsuranceCard(card))
                .await
                .context("saving insurance card")?;
            println!("Saved card {}", saved.id());
        }
        CardCommand::List { patient, format } => {
            let records = store
                .query_by_patient(&patient, EntityKind::InsuranceCard)
                .await
                .context("listing insurance cards")?;
            let cards: Vec<InsuranceCard> = records
                .into_iter()
                .filter_map(|record| match record {
                    StoredRecord::InsuranceCard(card) => Some(card),
                    StoredRecord::Measurement(_) => None,
                })
                .collect();

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&cards)?);
                }
                OutputFormat::Plain => {
                    if cards.is_empty() {
                        println!("No cards on file for {patient}");
                    }
                    for card in cards {
                        let plan = card.plan.as_deref().unwrap_or("-");
                        println!(
                            "{}  {}  {}  plan: {plan}",
                            card.id, card.provider, card.policy_number
                        );
                    }
                }
            }
        }
        CardCommand::Delete { id } => {
            if store.delete(&id).await.context("deleting card")? {
                println!("Deleted card {id}");
            } else {
                println!("No card with id {id}");
            }
        }
    }
    Ok(())
}

async fn handle_history(config: &Config, cmd: &HistoryCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let aggregated = history::aggregate(&store, &cmd.patient)
        .await
        .context("aggregating measurement history")?;

    match cmd.format {
        OutputFormat::Json => {
            let groups: Vec<serde_json::Value> = aggregated
                .iter()
                .map(|(key, group)| {
                    serde_json::json!({
                        "group": key.to_string(),
                        "measurements": group.as_slice(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&groups)?);
        }
        OutputFormat::Plain => {
            if aggregated.is_empty() {
                println!("No measurements on file for {}", cmd.patient);
            }
            for (key, group) in aggregated.iter() {
                println!("{key} ({} measurements)", group.len());
                for m in group {
                    println!(
                        "  {}  {:>7.1}  {}",
                        m.recorded_at.to_rfc3339(),
                        m.value,
                        m.recorded_by
                    );
                }
            }
        }
    }
    Ok(())
}

async fn handle_trend(config: &Config, cmd: &TrendCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;

    let mut trend_config: TrendConfig = config.trend.clone();
    if let Some(span) = cmd.span {
        trend_config.comparison_span = span;
    }
    if let Some(threshold) = cmd.rom_threshold {
        trend_config.rom_threshold = threshold;
    }
    if let Some(threshold) = cmd.mmt_threshold {
        trend_config.mmt_threshold = threshold;
    }

    let summaries = summarize(&store, &cmd.patient, &trend_config)
        .await
        .context("classifying trends")?;

    match cmd.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        OutputFormat::Plain => {
            if summaries.is_empty() {
                println!("No measurements on file for {}", cmd.patient);
            }
            for summary in summaries {
                let mut detail = format!("n={}", summary.samples);
                if let Some(latest) = summary.latest {
                    detail = format!("latest {latest}, {detail}");
                }
                if let Some(delta) = summary.delta {
                    detail = format!("{detail}, delta {delta:+}");
                }
                println!("{}: {} ({detail})", summary.key, summary.trend);
            }
        }
    }
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let measurements = store.count(EntityKind::Measurement)?;
    let cards = store.count(EntityKind::InsuranceCard)?;

    if cmd.json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "measurements": measurements,
            "insurance_cards": cards,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("carelog status");
        println!("--------------");
        println!("Database:        {}", config.database_path().display());
        println!("Measurements:    {measurements}");
        println!("Insurance cards: {cards}");
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:    {}", config.database_path().display());
                println!();
                println!("[Trend]");
                println!("  ROM threshold:    {} degrees", config.trend.rom_threshold);
                println!("  MMT threshold:    {} grades", config.trend.mmt_threshold);
                println!("  Comparison span:  {}", config.trend.comparison_span);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
