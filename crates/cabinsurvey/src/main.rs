//! `cabinsurvey` - CLI for the survey launcher
//!
//! This binary wires the command line to the record store, the session flag
//! and the launch/sync workflows.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use cabinsurvey::cli::{
    Cli, Command, ConfigCommand, FlightCommand, LaunchCommand, OutputFormat, ProfileCommand,
    RecordsCommand, StoreCommand, SurveyCommand,
};
use cabinsurvey::config::is_web_url;
use cabinsurvey::dashboard::{self, DashboardView};
use cabinsurvey::{
    init_logging, sync_records, Config, FixedConnectivity, NewFlightNumber, NewSurvey,
    RecordStore, Session, SqliteRecordStore, StaticCredentials, SurveyRecord, SyncOptions,
    UserProfile,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    let session = Session::new(config.session_path());

    if cli.command.requires_login() {
        session.require()?;
    }

    match cli.command {
        Command::Login(cmd) => {
            let auth = StaticCredentials::from(&config.auth);
            session.login(&auth, &cmd.email, &cmd.password)?;
            println!("Logged in as {}", cmd.email.trim());
        }
        Command::Logout => {
            session.logout()?;
            println!("Logged out.");
        }
        Command::Whoami => match session.current_user() {
            Some(email) => println!("{email}"),
            None => println!("Not logged in."),
        },
        Command::Config(cmd) => handle_config(&config, cmd)?,
        Command::Store(command) => {
            let store = SqliteRecordStore::open(config.database_path())
                .await
                .with_context(|| {
                    format!("opening record store at {}", config.database_path().display())
                })?;
            handle_store_command(&config, &store, command).await?;
        }
    }

    Ok(())
}

async fn handle_store_command(
    config: &Config,
    store: &SqliteRecordStore,
    command: StoreCommand,
) -> anyhow::Result<()> {
    match command {
        StoreCommand::Dashboard(cmd) => {
            let view = dashboard::load_dashboard(store, &config.defaults).await?;
            print_dashboard(&view, cmd.format)?;
        }
        StoreCommand::Launch(cmd) => handle_launch(config, store, &cmd).await?,
        StoreCommand::Survey(cmd) => handle_survey(store, cmd).await?,
        StoreCommand::Flight(cmd) => handle_flight(store, cmd).await?,
        StoreCommand::Records(cmd) => handle_records(config, store, cmd).await?,
        StoreCommand::Profile(cmd) => handle_profile(config, store, cmd).await?,
        StoreCommand::Status(cmd) => {
            let stats = store.stats().await?;
            if cmd.json {
                let status = serde_json::json!({
                    "database_path": store.path(),
                    "stats": stats,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("cabinsurvey status");
                println!("------------------");
                println!("Database:        {}", store.path().display());
                println!("Schema version:  {}", stats.schema_version);
                println!("Surveys:         {}", stats.surveys);
                println!("Flight numbers:  {}", stats.flight_numbers);
                println!(
                    "Survey records:  {} ({} pending sync)",
                    stats.survey_records, stats.pending_records
                );
                println!("Profile saved:   {}", if stats.has_profile { "yes" } else { "no" });
                println!("Size:            {} bytes", stats.db_size_bytes);
            }
        }
    }
    Ok(())
}

async fn handle_launch(
    config: &Config,
    store: &SqliteRecordStore,
    cmd: &LaunchCommand,
) -> anyhow::Result<()> {
    let view = dashboard::load_dashboard(store, &config.defaults).await?;
    let survey_id = match cmd.survey {
        Some(id) => id,
        None => view.default_survey().context("no surveys configured")?.id,
    };
    let flight_id = match cmd.flight {
        Some(id) => id,
        None => view.default_flight().context("no flight numbers configured")?.id,
    };

    let survey = dashboard::launch(store, survey_id, flight_id).await?;
    println!("Survey: {} (Flight: {})", survey.survey_name, survey.flight_number);
    println!("Open:   {}", survey.survey_url);

    let online = !cmd.offline;
    if !online {
        println!("You are offline. Survey records will be stored locally.");
    }
    let id = dashboard::close_session(store, survey, online).await?;
    println!("Survey marked as completed (record {id}).");
    Ok(())
}

async fn handle_survey(store: &SqliteRecordStore, cmd: SurveyCommand) -> anyhow::Result<()> {
    match cmd {
        SurveyCommand::Add { name, url } => {
            if name.trim().is_empty() {
                anyhow::bail!("survey name must not be empty");
            }
            if !is_web_url(&url) {
                anyhow::bail!("survey URL must be an http(s) link: {url}");
            }
            let id = store.add_survey(NewSurvey::new(name, url)).await?;
            println!("Added survey {id}");
        }
        SurveyCommand::List { format } => {
            let surveys = store.list_surveys().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&surveys)?),
                _ if surveys.is_empty() => println!("No surveys added yet."),
                OutputFormat::Table => {
                    println!("{:>4}  {:<32}  URL", "ID", "NAME");
                    for s in &surveys {
                        println!("{:>4}  {:<32}  {}", s.id, s.name, s.url);
                    }
                }
                OutputFormat::Plain => {
                    for s in &surveys {
                        println!("{} {} {}", s.id, s.name, s.url);
                    }
                }
            }
        }
        SurveyCommand::Delete { id } => {
            store.delete_survey(id).await?;
            println!("Deleted survey {id}");
        }
    }
    Ok(())
}

async fn handle_flight(store: &SqliteRecordStore, cmd: FlightCommand) -> anyhow::Result<()> {
    match cmd {
        FlightCommand::Add { number } => {
            if number.trim().is_empty() {
                anyhow::bail!("flight number must not be empty");
            }
            let id = store
                .add_flight_number(NewFlightNumber::new(number.trim()))
                .await?;
            println!("Added flight number {id}");
        }
        FlightCommand::List { format } => {
            let flights = store.list_flight_numbers().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&flights)?),
                _ if flights.is_empty() => println!("No flight numbers added yet."),
                OutputFormat::Table => {
                    println!("{:>4}  NUMBER", "ID");
                    for f in &flights {
                        println!("{:>4}  {}", f.id, f.number);
                    }
                }
                OutputFormat::Plain => {
                    for f in &flights {
                        println!("{} {}", f.id, f.number);
                    }
                }
            }
        }
        FlightCommand::Delete { id } => {
            store.delete_flight_number(id).await?;
            println!("Deleted flight number {id}");
        }
    }
    Ok(())
}

async fn handle_records(
    config: &Config,
    store: &SqliteRecordStore,
    cmd: RecordsCommand,
) -> anyhow::Result<()> {
    match cmd {
        RecordsCommand::List { pending, format } => {
            let records = if pending {
                store.list_pending_records().await?
            } else {
                store.list_survey_records().await?
            };
            print_records(&records, format)?;
        }
        RecordsCommand::Delete { id } => {
            store.delete_survey_record(id).await?;
            println!("Deleted record {id}");
        }
        RecordsCommand::Sync { offline } => {
            let options = SyncOptions {
                pacing: config.sync_pacing(),
                strategy: config.sync.strategy,
            };
            match sync_records(store, &FixedConnectivity(!offline), options).await {
                Ok(report) if report.is_empty() => println!("No unsubmitted records to sync."),
                Ok(report) => println!("Sync complete! {} records submitted.", report.len()),
                Err(e) if e.is_offline() => println!("{e}"),
                Err(e) => return Err(e).context("sync stopped; records handled so far stay submitted"),
            }
        }
    }
    Ok(())
}

async fn handle_profile(
    config: &Config,
    store: &SqliteRecordStore,
    cmd: ProfileCommand,
) -> anyhow::Result<()> {
    match cmd {
        ProfileCommand::Show { json } => {
            let profile = dashboard::profile_or_default(store, &config.defaults).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("Name:  {}", profile.name);
                println!("Email: {}", profile.email);
            }
        }
        ProfileCommand::Set { name, email } => {
            store.set_user_profile(UserProfile::new(name, email)).await?;
            println!("Profile saved.");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:   {}", config.database_path().display());
                println!("  Session path:    {}", config.session_path().display());
                println!();
                println!("[Defaults]");
                println!(
                    "  Survey:          {} ({})",
                    config.defaults.survey_name, config.defaults.survey_url
                );
                println!("  Flight number:   {}", config.defaults.flight_number);
                println!("  Profile name:    {}", config.defaults.profile_name);
                println!();
                println!("[Sync]");
                println!("  Pacing (ms):     {}", config.sync.pacing_ms);
                println!("  Strategy:        {}", config.sync.strategy);
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

fn print_dashboard(view: &DashboardView, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    println!("Welcome, {}!", view.greeting_name);
    println!();
    println!("Surveys:");
    for s in &view.surveys {
        println!("  [{}] {}", s.id, s.name);
    }
    println!("Flight numbers:");
    for f in &view.flight_numbers {
        println!("  [{}] {}", f.id, f.number);
    }
    Ok(())
}

fn print_records(records: &[SurveyRecord], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        _ if records.is_empty() => println!("No survey records stored yet."),
        OutputFormat::Table => {
            println!(
                "{:>4}  {:<28}  {:<8}  {:<24}  STATUS",
                "ID", "SURVEY", "FLIGHT", "TIMESTAMP"
            );
            for r in records {
                println!(
                    "{:>4}  {:<28}  {:<8}  {:<24}  {}",
                    r.id,
                    r.survey_name,
                    r.flight_number,
                    r.timestamp,
                    r.status_label()
                );
            }
        }
        OutputFormat::Plain => {
            for r in records {
                println!(
                    "{} (Flight: {}) {} Status: {}",
                    r.survey_name,
                    r.flight_number,
                    r.timestamp,
                    r.status_label()
                );
            }
        }
    }
    Ok(())
}
