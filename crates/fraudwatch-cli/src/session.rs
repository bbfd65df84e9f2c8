//! Interactive session: one service, many pages.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use clap::Parser;
use fraudwatch_warehouse::{Connector, ReadThroughQueryService, ReportCatalog};
use tracing::{debug, info};

use crate::cli::{SessionCommand, SessionLine};
use crate::error::CliError;
use crate::output::{self, RenderOptions};
use crate::pages::{self, PageContext};
use crate::status;

/// Read commands from `input` until `quit` or end of input.
///
/// Page errors are printed and the session continues; only output
/// failures end it early.
pub fn run<C: Connector>(
    service: &ReadThroughQueryService<C>,
    catalog: &ReportCatalog,
    database: &Path,
    options: &RenderOptions,
    input: impl BufRead,
) -> Result<(), CliError> {
    let context = PageContext::new(service, catalog);
    let interactive = io::stdin().is_terminal();
    info!("session started");

    prompt(interactive)?;
    for line in input.lines() {
        let line = line?;
        let words = line.split_whitespace().collect::<Vec<_>>();
        if words.is_empty() {
            prompt(interactive)?;
            continue;
        }

        let purged = service.purge_expired();
        if purged > 0 {
            debug!(purged, "expired cache entries dropped");
        }

        match SessionLine::try_parse_from(words) {
            Err(error) => error.print()?,
            Ok(SessionLine { command }) => match command {
                SessionCommand::Quit => break,
                SessionCommand::Refresh => {
                    service.refresh();
                    println!("cache cleared");
                }
                SessionCommand::Status => {
                    output::render_status(&status::check(service, database, true), options)?;
                }
                SessionCommand::Page(page) => match pages::build(&context, &page) {
                    Ok(report) => output::render(&report, options)?,
                    Err(error) => report_error(&CliError::from(error)),
                },
            },
        }
        prompt(interactive)?;
    }

    info!("session ended");
    Ok(())
}

fn report_error(error: &CliError) {
    eprintln!("error: {error}");
    if let Some(hint) = error.hint() {
        eprintln!("hint: {hint}");
    }
}

fn prompt(interactive: bool) -> io::Result<()> {
    if interactive {
        let mut stderr = io::stderr();
        write!(stderr, "fraudwatch> ")?;
        stderr.flush()?;
    }
    Ok(())
}
