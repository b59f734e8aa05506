//! CLI command handlers

pub mod collection;
pub mod health;
pub mod objects;
pub mod schema;
pub mod search;

use crate::app::PropertiesInput;
use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Ask on stdin; only `y` or `yes` confirms
pub fn confirm(prompt: &str) -> Result<bool> {
    let stdin = io::stdin();
    confirm_from(prompt, &mut stdin.lock())
}

fn confirm_from<R: BufRead>(prompt: &str, input: &mut R) -> Result<bool> {
    eprint!("{} [y/N]: ", prompt);
    io::stderr().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

pub fn read_json_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn into_object(value: Value, source: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("{} must be a JSON object", source),
    }
}

/// Properties from `-p JSON` or `-f FILE`
pub fn read_properties(input: &PropertiesInput) -> Result<Map<String, Value>> {
    match (&input.properties, &input.file) {
        (Some(inline), None) => {
            let value: Value =
                serde_json::from_str(inline).context("Properties are not valid JSON")?;
            into_object(value, "Properties")
        }
        (None, Some(path)) => into_object(read_json_file(path)?, &path.display().to_string()),
        (Some(_), Some(_)) => bail!("Use either --properties or --file, not both"),
        (None, None) => bail!("Provide properties with --properties JSON or --file FILE"),
    }
}
