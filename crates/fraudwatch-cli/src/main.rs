mod cli;
mod error;
mod logging;
mod output;
mod pages;
mod session;
mod status;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use fraudwatch_warehouse::{ReadThroughQueryService, ReportCatalog, WarehouseConfig};
use tracing::info_span;
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::RenderOptions;
use crate::pages::PageContext;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            if let Some(hint) = error.hint() {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(error.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let span = info_span!("fraudwatch", session = %Uuid::new_v4());
    let _entered = span.enter();

    let config = match &cli.config {
        Some(path) => WarehouseConfig::load(path)?,
        None => WarehouseConfig::load_default()?,
    };
    let service = ReadThroughQueryService::open(&config)?;
    let catalog = ReportCatalog::new(config.schema.clone())?;
    let options = RenderOptions::from(cli);

    let result = dispatch(cli, &config, &service, &catalog, &options);
    service.close();
    result
}

fn dispatch(
    cli: &Cli,
    config: &WarehouseConfig,
    service: &ReadThroughQueryService,
    catalog: &ReportCatalog,
    options: &RenderOptions,
) -> Result<ExitCode, CliError> {
    match &cli.command {
        Command::Page(page) => {
            let report = pages::build(&PageContext::new(service, catalog), page)?;
            output::render(&report, options)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let report = status::check(service, &config.database, false);
            output::render_status(&report, options)?;
            Ok(if report.connected {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(3)
            })
        }
        Command::Session => {
            session::run(service, catalog, &config.database, options, io::stdin().lock())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
