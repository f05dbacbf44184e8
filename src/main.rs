mod control;
mod history;
mod monitor;
mod scan;
mod schedule;
mod sidebar;
mod web;

use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use crate::control::{ControlApi, HttpControlClient};
use crate::scan::validator::validate_scan;
use crate::scan::{ScanId, ScanRequest, SubmissionForm, SubmitError};
use crate::schedule::{ScheduleService, ScheduleView};
use crate::web::Config;

#[derive(Parser)]
#[command(name = "srt-console")]
#[command(about = "Operator console for a small radio telescope")]
struct Cli {
    /// Configuration file (YAML). Built-in defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scan file without contacting the telescope
    Validate { scan: String },
    /// Submit a scan file to the control server
    Submit { scan: String },
    /// Print the control server's schedule
    Schedule,
    /// Remove a scan from the schedule
    Cancel { id: String },
    /// Print recently run scans and how they ended
    History,
    /// Run the operator console web service
    Serve,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    match cli.command {
        Commands::Validate { scan } => validate(&config, &scan),
        Commands::Submit { scan } => submit(&config, &scan).await,
        Commands::Schedule => print_schedule(&config).await,
        Commands::Cancel { id } => cancel(&config, &id).await,
        Commands::History => print_history(&config).await,
        Commands::Serve => match web::run_server(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Server error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn load_scan(path: &str) -> Option<ScanRequest> {
    let yaml = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return None;
        }
    };
    match ScanRequest::from_yaml(&yaml) {
        Ok(request) => Some(request),
        Err(e) => {
            eprintln!("Parse error: {}", e);
            None
        }
    }
}

fn schedule_service(config: &Config) -> Option<ScheduleService<HttpControlClient>> {
    match HttpControlClient::new(&config.control.base_url, config.control.request_timeout) {
        Ok(client) => Some(ScheduleService::new(Arc::new(client))),
        Err(e) => {
            eprintln!("Cannot create control client: {}", e);
            None
        }
    }
}

fn validate(config: &Config, path: &str) -> ExitCode {
    let Some(request) = load_scan(path) else {
        return ExitCode::FAILURE;
    };
    let system = config.station.coordinates;
    match validate_scan(&request.clone().normalized(system), system) {
        Ok(()) => {
            println!(
                "Scan '{}' is valid ({} scan, {} target)",
                request.name,
                request.kind,
                request.target_mode()
            );
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for error in &errors.errors {
                eprintln!("  {}: {}", error.field, error.message);
            }
            ExitCode::FAILURE
        }
    }
}

async fn submit(config: &Config, path: &str) -> ExitCode {
    let Some(request) = load_scan(path) else {
        return ExitCode::FAILURE;
    };
    let Some(schedule) = schedule_service(config) else {
        return ExitCode::FAILURE;
    };

    let mut form = SubmissionForm::new(config.station.coordinates, config.station.id_policy);
    form.open();
    form.fill(&request);
    match form.submit(&schedule).await {
        Ok(_) => {
            println!("Scan '{}' submitted", request.name);
            print_view(&schedule.view());
            ExitCode::SUCCESS
        }
        Err(SubmitError::Invalid(errors)) => {
            for error in &errors.errors {
                eprintln!("  {}: {}", error.field, error.message);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Submit failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn print_schedule(config: &Config) -> ExitCode {
    let Some(schedule) = schedule_service(config) else {
        return ExitCode::FAILURE;
    };
    match schedule.refresh().await {
        Ok(_) => {
            print_view(&schedule.view());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Cannot fetch schedule: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cancel(config: &Config, id: &str) -> ExitCode {
    let Some(schedule) = schedule_service(config) else {
        return ExitCode::FAILURE;
    };
    match schedule.cancel(&ScanId::from(id)).await {
        Ok(_) => {
            print_view(&schedule.view());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Cancel failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn print_history(config: &Config) -> ExitCode {
    let Some(schedule) = schedule_service(config) else {
        return ExitCode::FAILURE;
    };
    match schedule.api().history().await {
        Ok(entries) => {
            if entries.is_empty() {
                println!("No recent scans");
            }
            for entry in &entries {
                println!(
                    "  {} {} ({}) {}",
                    entry.date, entry.name, entry.kind, entry.status
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Cannot fetch history: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_view(view: &ScheduleView) {
    match &view.active {
        Some(scan) => println!(
            "Running: [{}] {} ({}) {} {}",
            scan.id,
            scan.name,
            scan.kind,
            scan.target(),
            scan.window()
        ),
        None => println!("Running: none"),
    }
    if view.queued.is_empty() {
        println!("Queue is empty");
    }
    for (i, scan) in view.queued.iter().enumerate() {
        println!(
            "  {}: [{}] {} ({}) {} {}",
            i + 1,
            scan.id,
            scan.name,
            scan.kind,
            scan.target(),
            scan.window()
        );
    }
}
