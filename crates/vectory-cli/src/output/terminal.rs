//! Terminal output formatter

use super::{Block, Cell, Document, Panel, Table};
use std::io::{self, Write};
use termcolor::{Color, ColorSpec, WriteColor};
use vectory_core::StatusTone;

fn spec_for(tone: StatusTone) -> Option<ColorSpec> {
    let color = match tone {
        StatusTone::Good => Color::Green,
        StatusTone::Busy => Color::Yellow,
        StatusTone::Bad => Color::Red,
        StatusTone::Neutral => return None,
    };
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color)).set_bold(true);
    Some(spec)
}

fn write_cell<W: WriteColor>(out: &mut W, cell: &Cell, width: usize) -> io::Result<()> {
    let padding = width.saturating_sub(cell.text.chars().count());
    match spec_for(cell.tone) {
        Some(spec) => {
            out.set_color(&spec)?;
            write!(out, "{}", cell.text)?;
            out.reset()?;
        }
        None => write!(out, "{}", cell.text)?,
    }
    write!(out, "{}", " ".repeat(padding))
}

/// A line of text in the tone's colour
pub fn write_toned<W: WriteColor>(out: &mut W, text: &str, tone: StatusTone) -> io::Result<()> {
    write_cell(out, &Cell::toned(text, tone), 0)?;
    writeln!(out)
}

fn write_title<W: WriteColor>(out: &mut W, title: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "{}", title)?;
    out.reset()
}

pub fn write_table<W: WriteColor>(out: &mut W, table: &Table) -> io::Result<()> {
    if let Some(ref title) = table.title {
        write_title(out, title)?;
    }

    let columns = table.headers.len();
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(cell.text.chars().count());
        }
    }

    out.set_color(ColorSpec::new().set_bold(true))?;
    let header: Vec<String> = table
        .headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<width$}", h, width = *w))
        .collect();
    writeln!(out, "{}", header.join("  ").trim_end())?;
    out.reset()?;

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("  "))?;

    for row in &table.rows {
        for (i, width) in widths.iter().enumerate() {
            let last = i + 1 == columns;
            let empty = Cell::plain("");
            let cell = row.get(i).unwrap_or(&empty);
            write_cell(out, cell, if last { 0 } else { *width })?;
            if !last {
                write!(out, "  ")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_panel<W: WriteColor>(out: &mut W, panel: &Panel) -> io::Result<()> {
    write_title(out, &panel.title)?;
    let width = panel
        .rows
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0);
    for (key, value) in &panel.rows {
        write!(out, "  {:<width$}  ", format!("{}:", key), width = width + 1)?;
        write_cell(out, value, 0)?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_document<W: WriteColor>(out: &mut W, doc: &Document) -> io::Result<()> {
    for (i, block) in doc.blocks.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        match block {
            Block::Table(table) => write_table(out, table)?,
            Block::Panel(panel) => write_panel(out, panel)?,
            Block::Text(text) => writeln!(out, "{}", text)?,
            Block::Line(cell) => {
                write_cell(out, cell, 0)?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}
