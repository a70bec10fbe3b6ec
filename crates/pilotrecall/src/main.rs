//! `pilotrec` - CLI for pilotrecall
//!
//! Manages recall items and flights and prints the checklist for a phase.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{bail, Context};
use chrono::DateTime;
use clap::Parser;
use tracing::debug;

use pilotrecall::cli::{
    Cli, Command, ConfigCommand, FlightCommand, ItemAddArgs, ItemCommand, ItemEditArgs,
    OutputFormat, StatusCommand, ViewCommand,
};
use pilotrecall::{
    filter_items, init_logging, Attachment, Config, FlightInput, FlightList, FlightPhase,
    RecallItem, RecallItemChanges, RecallItemInput, RecallManager, Repository, SqliteRepository,
    ViewState,
};

type Manager = RecallManager<SqliteRepository>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Item(cmd) => {
            let mut manager = open_manager(&config).await?;
            handle_item(&mut manager, cmd).await
        }
        Command::Flight(cmd) => {
            let mut manager = open_manager(&config).await?;
            handle_flight(&mut manager, cmd).await
        }
        Command::View(cmd) => {
            let mut manager = open_manager(&config).await?;
            handle_view(&mut manager, cmd).await
        }
        Command::Phases => {
            handle_phases();
            Ok(())
        }
        Command::Status(cmd) => handle_status(&config, &cmd).await,
        Command::Reset(cmd) => {
            if !cmd.yes {
                println!("This will delete every recall item and flight.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            open_manager(&config).await?.reset().await?;
            println!("All recall items and flights deleted.");
            Ok(())
        }
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn open_manager(config: &Config) -> anyhow::Result<Manager> {
    let path = config.database_path();
    let repo = SqliteRepository::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    let initial = ViewState::new(config.view.initial_phase, config.view.critical_only);
    let mut manager = RecallManager::new(repo, initial);
    manager.bootstrap(config.storage.request_persistence).await?;
    Ok(manager)
}

async fn handle_item(manager: &mut Manager, cmd: ItemCommand) -> anyhow::Result<()> {
    match cmd {
        ItemCommand::Add(args) => add_item(manager, args).await?,
        ItemCommand::List {
            phase,
            critical,
            format,
        } => {
            let all = &manager.state().recall_items;
            let items: Vec<&RecallItem> = match phase {
                Some(phase) => filter_items(phase, all, critical),
                None => all.iter().filter(|item| !critical || item.is_tier1).collect(),
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
                OutputFormat::Plain if items.is_empty() => println!("No recall items."),
                OutputFormat::Plain => items.iter().for_each(|item| print_item_line(item)),
            }
        }
        ItemCommand::Show { id, format } => {
            let Some(item) = manager.state().recall_item(id) else {
                bail!("recall item {id} not found");
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
                OutputFormat::Plain => print_item_detail(item),
            }
        }
        ItemCommand::Edit(args) => edit_item(manager, args).await?,
        ItemCommand::Delete { id } => {
            if manager.state().recall_item(id).is_none() {
                bail!("recall item {id} not found");
            }
            manager.delete_recall_item(id).await?;
            println!("Deleted recall item {id}");
        }
    }
    Ok(())
}

async fn add_item(manager: &mut Manager, args: ItemAddArgs) -> anyhow::Result<()> {
    let attachment = args
        .attachment
        .as_deref()
        .map(|path| read_attachment(path, &args.media_type))
        .transpose()?;

    if let Some(flight) = args.flight {
        if !manager.set_active_flight(Some(flight)).await? {
            bail!("flight {flight} not found");
        }
    }

    let input = RecallItemInput {
        title: args.title,
        description: args.description,
        phases: args.phases,
        reference: args.reference,
        threats: (!args.threats.is_empty()).then_some(args.threats),
        is_tier1: Some(args.tier1),
        is_deeplink: args.deeplink.then_some(true),
        attachment,
    };
    let item = manager.add_recall_item(input).await?;

    println!("Added recall item {}: {}", item.id, item.title);
    if let Some(flight) = manager.state().active_flight() {
        println!("  Linked to flight {} ({})", flight.id, flight.title);
    }
    Ok(())
}

async fn edit_item(manager: &mut Manager, args: ItemEditArgs) -> anyhow::Result<()> {
    let attachment = if args.remove_attachment {
        Some(None)
    } else {
        args.attachment
            .as_deref()
            .map(|path| read_attachment(path, &args.media_type))
            .transpose()?
            .map(Some)
    };

    let changes = RecallItemChanges {
        title: args.title,
        description: args.description,
        phases: (!args.phases.is_empty()).then_some(args.phases),
        reference: args.reference,
        threats: (!args.threats.is_empty()).then_some(args.threats),
        is_tier1: args.tier1,
        is_deeplink: None,
        attachment,
    };
    if changes.is_empty() {
        bail!("nothing to change");
    }

    let Some(item) = manager.update_recall_item(args.id, changes).await? else {
        bail!("recall item {} not found", args.id);
    };
    println!("Updated recall item {}: {}", item.id, item.title);
    Ok(())
}

fn read_attachment(path: &Path, media_type: &str) -> anyhow::Result<Attachment> {
    let data = std::fs::read(path)
        .with_context(|| format!("failed to read attachment {}", path.display()))?;
    debug!("Read {} byte attachment from {}", data.len(), path.display());
    Ok(Attachment::new(media_type, data))
}

async fn handle_flight(manager: &mut Manager, cmd: FlightCommand) -> anyhow::Result<()> {
    match cmd {
        FlightCommand::Create(args) => {
            let flight = manager
                .create_flight(FlightInput {
                    from_airport: args.from,
                    to_airport: args.to,
                    departure_time: args.departure,
                    arrival_time: args.arrival,
                    notes: args.notes,
                    active_item_ids: Vec::new(),
                })
                .await?;
            println!("Created flight {}: {} (active)", flight.id, flight.title);
        }
        FlightCommand::List { format } => {
            let state = manager.state();
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&state.flight_lists)?);
                }
                OutputFormat::Plain if state.flight_lists.is_empty() => println!("No flights."),
                OutputFormat::Plain => {
                    for flight in &state.flight_lists {
                        let marker = if state.active_flight_id == Some(flight.id) {
                            '*'
                        } else {
                            ' '
                        };
                        println!(
                            "{marker} {:>4}  {:<16} {:<9} {} items",
                            flight.id,
                            flight.title,
                            flight.status,
                            flight.active_item_ids.len()
                        );
                    }
                }
            }
        }
        FlightCommand::Show { id, format } => {
            let Some(flight) = manager.state().flight_list(id).cloned() else {
                bail!("flight {id} not found");
            };
            let items = manager.repository().get_flight_list_items(id).await?;
            match format {
                OutputFormat::Json => {
                    let value = serde_json::json!({ "flight": flight, "items": items });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                OutputFormat::Plain => print_flight_detail(&flight, &items),
            }
        }
        FlightCommand::Activate { id } => {
            if !manager.set_active_flight(Some(id)).await? {
                bail!("flight {id} not found");
            }
            println!("Flight {id} is now active");
        }
        FlightCommand::Complete { id } => {
            let Some(flight) = manager.complete_flight(id).await? else {
                bail!("flight {id} not found");
            };
            println!("Flight {} ({}) completed", flight.id, flight.title);
        }
        FlightCommand::Delete { id } => {
            if manager.state().flight_list(id).is_none() {
                bail!("flight {id} not found");
            }
            manager.delete_flight(id).await?;
            println!("Deleted flight {id}");
        }
    }
    Ok(())
}

async fn handle_view(manager: &mut Manager, cmd: ViewCommand) -> anyhow::Result<()> {
    if let Some(flight) = cmd.flight {
        if !manager.set_active_flight(Some(flight)).await? {
            bail!("flight {flight} not found");
        }
    }
    let flight_scoped = cmd.flight.is_some();
    if let Some(phase) = cmd.phase {
        manager.set_phase(phase);
    }
    if cmd.critical {
        manager.set_critical_only(true);
    }

    let state = manager.state();
    let items = if flight_scoped {
        manager.visible_flight_items()
    } else {
        manager.visible_items()
    };

    if cmd.format == OutputFormat::Json {
        let value = serde_json::json!({
            "phase": state.current_phase,
            "critical_only": state.critical_only,
            "active_flight": state.active_flight(),
            "flight_only": flight_scoped,
            "items": items,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let mode = if state.critical_only { " (critical)" } else { "" };
    println!("{}{mode}", state.current_phase);
    if let Some(flight) = state.active_flight() {
        println!("Flight: {} [{}]", flight.title, flight.status);
    }
    println!("{}", "=".repeat(40));
    if items.is_empty() {
        println!("No recall items for this phase.");
    }
    for item in items {
        print_item_line(item);
        if !item.reference.is_empty() {
            println!("        ref: {}", item.reference);
        }
    }
    Ok(())
}

fn handle_phases() {
    for phase in FlightPhase::ALL {
        println!("{:>2}. {phase}", phase.index() + 1);
    }
}

async fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let path = config.database_path();
    let repo = SqliteRepository::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;
    let stats = repo.stats().await?;

    if cmd.json {
        let status = serde_json::json!({
            "database_path": path,
            "storage": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        let persistence = match stats.persistence_granted {
            Some(true) => "granted",
            Some(false) => "not granted",
            None => "not requested",
        };
        println!("pilotrec status");
        println!("---------------");
        println!("Database:       {}", path.display());
        println!("Size:           {} bytes", stats.db_size_bytes);
        println!("Schema version: {}", stats.schema_version);
        println!("Persistence:    {persistence}");
        println!("Recall items:   {}", stats.recall_items);
        println!("Flights:        {}", stats.flight_lists);
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
                println!("  Database path:        {}", config.database_path().display());
                println!(
                    "  Request persistence:  {}",
                    config.storage.request_persistence
                );
                println!();
                println!("[View]");
                println!("  Initial phase:        {}", config.view.initial_phase);
                println!("  Critical only:        {}", config.view.critical_only);
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
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_item_line(item: &RecallItem) {
    let tier = if item.is_tier1 { "T1" } else { "  " };
    println!("{tier} {:>4}  {}", item.id, item.title);
}

fn print_item_detail(item: &RecallItem) {
    println!("#{} {}", item.id, item.title);
    let phases: Vec<&str> = item.phases.iter().map(|p| p.as_str()).collect();
    println!("  Phases:      {}", phases.join(", "));
    println!("  Tier 1:      {}", item.is_tier1);
    if item.is_deeplink {
        println!("  Deep link:   yes");
    }
    if !item.reference.is_empty() {
        println!("  Reference:   {}", item.reference);
    }
    if !item.threats.is_empty() {
        println!("  Threats:     {}", item.threats.join(", "));
    }
    if let Some(attachment) = &item.attachment {
        println!(
            "  Attachment:  {} ({} bytes, blake3 {})",
            attachment.media_type,
            attachment.len(),
            attachment.digest()
        );
    }
    println!("  Updated:     {}", format_time(item.updated_at));
    if !item.description.is_empty() {
        println!();
        println!("{}", item.description);
    }
}

fn print_flight_detail(flight: &FlightList, items: &[RecallItem]) {
    println!("#{} {} [{}]", flight.id, flight.title, flight.status);
    println!("  Depart:  {}", format_time(flight.departure_time));
    println!("  Arrive:  {}", format_time(flight.arrival_time));
    if let Some(notes) = &flight.notes {
        println!("  Notes:   {notes}");
    }
    println!();
    if items.is_empty() {
        println!("No recall items linked.");
    }
    for item in items {
        print_item_line(item);
    }
}

fn format_time(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms).map_or_else(
        || epoch_ms.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}
