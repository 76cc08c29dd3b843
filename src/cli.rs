use crate::config::Config;
use crate::error::BatchError;
use crate::infrastructure::{locate_bridge, ProcessInvoker};
use crate::models::BatchReport;
use crate::orchestrator::{process_spreadsheet, BatchProcessor, SheetJob};
use crate::services::TemplateSession;
use crate::utils::logging::log_startup;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "ezmark",
    version,
    about = "Batch laser marking: spreadsheet rows into EZCAD2 templates via EZCADBridge"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file (default: ./ezmark.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to EZCADBridge.exe (overrides the config file)
    #[arg(long, global = true)]
    pub bridge: Option<PathBuf>,

    /// Per-command timeout in seconds, 0 disables it (overrides the config file)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Session(SessionCommand),
    /// Mark every row of a spreadsheet
    Process {
        /// Spreadsheet with the data (.csv, .xlsx, .xls, .ods)
        spreadsheet: PathBuf,
        /// Path to the EZD template
        template: PathBuf,
        /// Save the resulting EZD file here
        #[arg(long)]
        output: Option<PathBuf>,
        /// JSON file mapping spreadsheet columns to entity names
        #[arg(long)]
        mappings: Option<PathBuf>,
        /// Do not write the processed status back into the spreadsheet
        #[arg(long)]
        no_status_update: bool,
        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Commands that run against a single template session.
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Show bridge environment information
    Info,
    /// Open an EZD file
    Open {
        /// Path to the EZD file
        ezd_file: PathBuf,
    },
    /// Update the text of an entity
    Update {
        /// Entity name
        entity: String,
        /// New text
        text: String,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Execute marking (all entities unless one is named)
    Mark {
        /// Optional entity name
        entity: Option<String>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// List entities in the open template
    List {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Position the red light pointer
    Red {
        /// X coordinate
        #[arg(allow_negative_numbers = true)]
        x: f64,
        /// Y coordinate
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Save the open template to a new file
    Save {
        /// Output file path
        output: PathBuf,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Open a template and list its entities
    Entities {
        /// Path to the EZD template
        template: PathBuf,
    },
    /// Check the bridge: info, open template, list entities
    Test {
        /// Path to the EZD template
        template: PathBuf,
    },
}

/// Template to open in the same session before the operation.
#[derive(Debug, Clone, clap::Args)]
pub struct SessionArgs {
    /// Open this EZD template first
    #[arg(long)]
    pub template: Option<PathBuf>,
}

/// Build the effective config: file, environment, then CLI flags.
pub fn build_config(args: &Cli) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref()).context("failed to load config")?;
    if let Some(bridge) = &args.bridge {
        config.bridge_exe_path = Some(bridge.clone());
    }
    if let Some(timeout) = args.timeout {
        config.command_timeout_secs = timeout;
    }
    Ok(config)
}

fn build_invoker(config: &Config) -> Result<ProcessInvoker> {
    let exe = locate_bridge(config.bridge_exe_path.as_deref())?;
    log_startup(&exe, config.command_timeout_secs);
    Ok(ProcessInvoker::new(exe)
        .with_leading_args(config.bridge_args.clone())
        .with_timeout(config.command_timeout()))
}

fn result_word(ok: bool) -> &'static str {
    if ok {
        "Success"
    } else {
        "Failed"
    }
}

/// Run the selected command. Returns `false` when it failed.
pub async fn run(args: Cli, config: Config) -> Result<bool> {
    let invoker = build_invoker(&config)?;

    match args.command {
        Commands::Process {
            spreadsheet,
            template,
            output,
            mappings,
            no_status_update,
            json,
        } => {
            let job = SheetJob {
                spreadsheet,
                template,
                output,
                mappings,
                update_status: config.update_status && !no_status_update,
            };
            let mut processor = BatchProcessor::new(invoker);
            let report = process_spreadsheet(&mut processor, &config, &job).await?;
            print_report(&report, json)?;
            Ok(report.is_success())
        }
        Commands::Session(command) => {
            let mut session = TemplateSession::new(invoker);
            run_session_command(&mut session, command).await
        }
    }
}

async fn run_session_command(
    session: &mut TemplateSession<ProcessInvoker>,
    command: SessionCommand,
) -> Result<bool> {
    let ok = match command {
        SessionCommand::Info => {
            let result = session.info().await;
            if result.output_text.trim().is_empty() {
                println!("No information available");
            } else {
                println!("{}", result.output_text.trim_end());
            }
            result.succeeded
        }
        SessionCommand::Open { ezd_file } => {
            let ok = session.open(&ezd_file).await;
            println!("Open result: {}", result_word(ok));
            ok
        }
        SessionCommand::Update {
            entity,
            text,
            session: s,
        } => {
            open_first(session, s.template.as_deref()).await;
            let ok = session.update_text(&entity, &text).await;
            println!("Update result: {}", result_word(ok));
            ok
        }
        SessionCommand::Mark { entity, session: s } => {
            open_first(session, s.template.as_deref()).await;
            let ok = session.mark(entity.as_deref()).await;
            println!("Mark result: {}", result_word(ok));
            ok
        }
        SessionCommand::List { session: s } => {
            open_first(session, s.template.as_deref()).await;
            print_entities("Entities:", session.list_entities().await)
        }
        SessionCommand::Red { x, y, session: s } => {
            open_first(session, s.template.as_deref()).await;
            let ok = session.position_pointer(x, y).await;
            println!("Red light result: {}", result_word(ok));
            ok
        }
        SessionCommand::Save { output, session: s } => {
            open_first(session, s.template.as_deref()).await;
            let ok = session.save(&output).await;
            println!("Save result: {}", result_word(ok));
            ok
        }
        SessionCommand::Entities { template } => {
            if !session.open(&template).await {
                println!("Failed to open template: {}", template.display());
                return Ok(false);
            }
            print_entities("Template entities:", session.list_entities().await)
        }
        SessionCommand::Test { template } => {
            let info = session.info().await;
            tracing::info!("桥接信息: {}", info.output_text.trim());
            let ok = session.open(&template).await;
            if ok {
                match session.list_entities().await {
                    Some(entities) => tracing::info!("模板中的对象: {:?}", entities),
                    None => tracing::warn!("⚠️ 无法获取模板中的对象"),
                }
            }
            println!("Integration test: {}", result_word(ok));
            ok
        }
    };
    Ok(ok)
}

/// `--template` given: open it so the following operation has a session.
async fn open_first(session: &mut TemplateSession<ProcessInvoker>, template: Option<&Path>) {
    if let Some(t) = template {
        let ok = session.open(t).await;
        println!("Open result: {}", result_word(ok));
    }
}

/// Returns `false` when the listing itself failed.
fn print_entities(title: &str, entities: Option<Vec<String>>) -> bool {
    let Some(entities) = entities else {
        println!("Failed to list entities");
        return false;
    };
    println!("{}", title);
    for entity in &entities {
        println!("  - {}", entity);
    }
    true
}

fn print_report(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let stats = &report.stats;
    println!("Processing result: {}", result_word(report.is_success()));
    println!("Processed {}/{} items", stats.succeeded, stats.total);
    if stats.failed > 0 {
        println!("Failed: {}", stats.failed);
    }
    println!("Duration: {:.2} seconds", stats.duration_seconds);
    if let Some(saved) = report.saved {
        println!("Output saved: {}", if saved { "yes" } else { "no" });
    }
    if let Some(err) = &report.error {
        println!("Error: {}", err);
        if matches!(err, BatchError::TemplateOpenFailed { .. }) {
            println!("Check that EZCAD2 and MarkEzd.dll are available to the bridge.");
        }
    }
    Ok(())
}
