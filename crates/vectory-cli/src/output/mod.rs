//! Output formatters
//!
//! Commands describe what to show as a [`Document`] of tables and panels plus
//! a serializable value. The terminal and CSV formatters render the document;
//! the JSON formatter prints the value.

pub mod csv;
pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::io::IsTerminal;
use termcolor::{BufferWriter, ColorChoice};
use vectory_core::StatusTone;

/// One table or panel cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub tone: StatusTone,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: StatusTone::Neutral,
        }
    }

    /// Coloured by the status it names
    pub fn status(text: impl Into<String>) -> Self {
        let text = text.into();
        let tone = StatusTone::of(&text);
        Self { text, tone }
    }

    pub fn toned(text: impl Into<String>, tone: StatusTone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::plain(s)
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::plain(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: None,
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn row(&mut self, cells: Vec<Cell>) {
        self.rows.push(cells);
    }
}

/// Titled key/value listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    pub title: String,
    pub rows: Vec<(String, Cell)>,
}

impl Panel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.rows.push((key.into(), value.into()));
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Cell>) {
        self.rows.push((key.into(), value.into()));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Table(Table),
    Panel(Panel),
    Text(String),
    /// Single coloured line
    Line(Cell),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: Table) -> Self {
        self.blocks.push(Block::Table(table));
        self
    }

    pub fn panel(mut self, panel: Panel) -> Self {
        self.blocks.push(Block::Panel(panel));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Text(text.into()));
        self
    }

    pub fn line(mut self, cell: Cell) -> Self {
        self.blocks.push(Block::Line(cell));
        self
    }
}

/// Prints documents in the selected format
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn color_choice() -> ColorChoice {
        if std::io::stdout().is_terminal() {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        }
    }

    /// Render `doc`, or `data` as JSON
    pub fn emit<T: Serialize>(&self, data: &T, doc: &Document) -> Result<()> {
        match self.format {
            OutputFormat::Json => print!("{}", json::format_value(data)?),
            OutputFormat::Csv => print!("{}", csv::format_document(doc)),
            OutputFormat::Cli => {
                let writer = BufferWriter::stdout(Self::color_choice());
                let mut buffer = writer.buffer();
                terminal::write_document(&mut buffer, doc)?;
                writer.print(&buffer)?;
            }
        }
        Ok(())
    }

    /// Confirmation of a completed action
    pub fn success(&self, message: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json => print!(
                "{}",
                json::format_value(&serde_json::json!({"success": true, "message": message}))?
            ),
            OutputFormat::Csv => println!("{}", message),
            OutputFormat::Cli => {
                let writer = BufferWriter::stdout(Self::color_choice());
                let mut buffer = writer.buffer();
                terminal::write_toned(&mut buffer, message, StatusTone::Good)?;
                writer.print(&buffer)?;
            }
        }
        Ok(())
    }

    /// Progress and hints; kept off stdout for machine formats
    pub fn note(&self, message: &str) {
        match self.format {
            OutputFormat::Cli => println!("{}", message),
            _ => eprintln!("{}", message),
        }
    }
}

/// Epoch milliseconds as `%Y-%m-%d %H:%M:%S` (UTC)
pub fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Compact display of a JSON value
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Shorten to `max` characters, marking the cut
pub fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}
