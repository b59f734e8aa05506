//! JSON output formatter

use anyhow::Result;
use serde::Serialize;

pub fn format_value<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)? + "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pretty_with_newline() {
        let text = format_value(&json!({"live": true})).unwrap();
        assert_eq!(text, "{\n  \"live\": true\n}\n");
    }
}
