//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_indicator_store::FileIndicatorStore;
use crate::adapters::json_config_adapter::JsonConfigAdapter;
use crate::domain::error::GoInvestError;
use crate::domain::indicator::IndicatorName;
use crate::domain::pipeline::{Phase, Pipeline, Requirement};
use crate::domain::settings::{parse_date, Settings};
use crate::ports::calc_config_port::CalcConfigPort;

#[derive(Parser, Debug)]
#[command(
    name = "goinvest",
    about = "Support/resistance line indicator and pressure-area signals"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    /// Process only this instrument instead of the configured list
    #[arg(long)]
    pub code: Option<String>,
    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute then analyze every configured instrument
    Run(RunArgs),
    /// Compute and save today's SR lines
    Compute(RunArgs),
    /// Classify prices against the saved SR lines
    Analyze(RunArgs),
    /// Create the calculation config document and data directory
    Init {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run(args) => run_phase(&args, Phase::Full),
        Command::Compute(args) => run_phase(&args, Phase::Compute),
        Command::Analyze(args) => run_phase(&args, Phase::Analyze),
        Command::Init { config } => run_init(&config),
    }
}

fn fail(err: GoInvestError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

pub fn load_settings(path: &PathBuf) -> Result<Settings, ExitCode> {
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| {
        fail(GoInvestError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })?;
    Settings::from_config(&adapter).map_err(fail)
}

fn run_phase(args: &RunArgs, phase: Phase) -> ExitCode {
    eprintln!("Loading settings from {}", args.config.display());
    let settings = match load_settings(&args.config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let today = match args.date.as_deref().map(parse_date).transpose() {
        Ok(Some(date)) => date,
        Ok(None) => settings.today(),
        Err(e) => return fail(e),
    };

    let codes = match &args.code {
        Some(code) => vec![code.clone()],
        None => settings.codes.clone(),
    };
    if codes.is_empty() {
        eprintln!("error: no codes configured");
        return ExitCode::from(2);
    }

    let requirements: Vec<Requirement> = codes
        .iter()
        .map(|code| Requirement::new(code, settings.product_type))
        .collect();

    run_requirements(&settings, &requirements, today, phase)
}

fn run_requirements(
    settings: &Settings,
    requirements: &[Requirement],
    today: NaiveDate,
    phase: Phase,
) -> ExitCode {
    let prices = CsvAdapter::new(settings.data_root.clone());
    let store = FileIndicatorStore::new(settings.data_root.clone());
    let calc_config = JsonConfigAdapter::new(settings.config_json.clone());
    // created by `init`; a missing or sectionless document stops the run
    if let Err(e) = calc_config.read_indicator(IndicatorName::SrLine) {
        return fail(e);
    }

    let pipeline = Pipeline::new(&prices, &store, &calc_config, settings.met_line_policy);

    eprintln!("Processing {} instrument(s) as of {}", requirements.len(), today);
    let report = pipeline.run(requirements, today, phase);

    for skipped in &report.skipped {
        eprintln!("  {}: {} [SKIPPED]", skipped.code, skipped.reason);
    }
    eprintln!(
        "Done: {} processed, {} skipped",
        report.processed.len(),
        report.skipped.len()
    );

    if !report.skipped.is_empty() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_init(config_path: &PathBuf) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    if let Err(e) = fs::create_dir_all(&settings.data_root) {
        return fail(e.into());
    }

    let calc_config = JsonConfigAdapter::new(settings.config_json.clone());
    match calc_config.bootstrap() {
        Ok(true) => eprintln!("Created {}", settings.config_json.display()),
        Ok(false) => eprintln!("{} already initialised", settings.config_json.display()),
        Err(e) => return fail(e),
    }
    ExitCode::SUCCESS
}
