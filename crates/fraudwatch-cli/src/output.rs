use std::io::{self, Write};

use fraudwatch_warehouse::tabular::display_value;
use fraudwatch_warehouse::TabularResult;
use serde::Serialize;

use crate::cli::{Cli, OutputFormat};
use crate::error::CliError;
use crate::pages::{PageReport, SectionBody};
use crate::status::StatusReport;

/// How pages and status reports are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    /// Rows shown per table section.
    pub rows: usize,
}

impl From<&Cli> for RenderOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            pretty: cli.pretty,
            rows: cli.rows,
        }
    }
}

/// Print a page to stdout.
pub fn render(report: &PageReport, options: &RenderOptions) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match options.format {
        OutputFormat::Json => write_json(&mut out, report, options.pretty)?,
        OutputFormat::Table => write_page(&mut out, report, options.rows)?,
    }
    Ok(())
}

pub fn render_status(status: &StatusReport, options: &RenderOptions) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match options.format {
        OutputFormat::Json => write_json(&mut out, status, options.pretty)?,
        OutputFormat::Table => write_status(&mut out, status)?,
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize>(
    out: &mut W,
    value: &T,
    pretty: bool,
) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{payload}")?;
    Ok(())
}

fn write_page<W: Write>(out: &mut W, report: &PageReport, rows: usize) -> io::Result<()> {
    writeln!(out, "== {} ==", report.title)?;

    for notice in &report.notices {
        writeln!(out, "! {notice}")?;
    }

    if !report.tiles.is_empty() {
        writeln!(out)?;
        let width = report
            .tiles
            .iter()
            .map(|tile| tile.label.chars().count())
            .max()
            .unwrap_or(0);
        for tile in &report.tiles {
            match &tile.delta {
                Some(delta) => writeln!(
                    out,
                    "{:<width$} : {} ({delta})",
                    tile.label, tile.value
                )?,
                None => writeln!(out, "{:<width$} : {}", tile.label, tile.value)?,
            }
        }
    }

    for section in &report.sections {
        writeln!(out)?;
        match &section.body {
            SectionBody::Table { data, cache } => {
                let cache = if cache.is_hit() { "cached" } else { "fresh" };
                writeln!(out, "-- {} [{cache}]", section.title)?;
                write_table(out, data, rows)?;
            }
            SectionBody::NoData => {
                writeln!(out, "-- {}", section.title)?;
                writeln!(out, "no data available")?;
            }
            SectionBody::Failed(failure) => {
                writeln!(out, "-- {}", section.title)?;
                writeln!(out, "query error: {}", failure.message)?;
                for line in failure.query.lines() {
                    writeln!(out, "    {line}")?;
                }
            }
        }
    }

    Ok(())
}

fn write_table<W: Write>(out: &mut W, data: &TabularResult, rows: usize) -> io::Result<()> {
    let shown = data
        .rows
        .iter()
        .take(rows)
        .map(|row| row.iter().map(display_value).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut widths = data
        .columns
        .iter()
        .map(|column| column.name.chars().count())
        .collect::<Vec<_>>();
    for row in &shown {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = data
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, &width)| format!("{:<width$}", column.name))
        .collect::<Vec<_>>();
    writeln!(out, "{}", header.join("  ").trim_end())?;
    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>();
    writeln!(out, "{}", rule.join("  "))?;

    for row in &shown {
        let cells = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>();
        writeln!(out, "{}", cells.join("  ").trim_end())?;
    }

    let hidden = data.row_count().saturating_sub(shown.len());
    if hidden > 0 {
        writeln!(out, "... {hidden} more rows")?;
    }
    if data.truncated {
        writeln!(out, "(result truncated by the row limit)")?;
    }
    Ok(())
}

fn write_status<W: Write>(out: &mut W, status: &StatusReport) -> io::Result<()> {
    if status.connected {
        writeln!(out, "connection  : Connected to warehouse")?;
    } else {
        writeln!(out, "connection  : Not connected")?;
    }
    if let Some(error) = &status.error {
        writeln!(out, "error       : {error}")?;
    }
    writeln!(out, "database    : {}", status.database)?;
    writeln!(out, "last_updated: {}", status.last_updated)?;
    if let Some(cache) = &status.cache {
        writeln!(out, "cache       : {} entries", cache.entries)?;
        writeln!(
            out,
            "cache_stats : hits={} misses={} clears={}",
            cache.stats.hits, cache.stats.misses, cache.stats.clears
        )?;
    }
    Ok(())
}
