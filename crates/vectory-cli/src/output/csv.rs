//! CSV output formatter
//!
//! Tables become header + rows; panels become `field,value` rows. Blocks are
//! separated by a blank line.

use super::{Block, Document, Panel, Table};

pub fn format_document(doc: &Document) -> String {
    doc.blocks
        .iter()
        .map(|block| match block {
            Block::Table(table) => format_table(table),
            Block::Panel(panel) => format_panel(panel),
            Block::Text(text) => format!("{}\n", escape_csv(text)),
            Block::Line(cell) => format!("{}\n", escape_csv(&cell.text)),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_table(table: &Table) -> String {
    let mut output = join_row(table.headers.iter().map(String::as_str));
    for row in &table.rows {
        output.push_str(&join_row(row.iter().map(|c| c.text.as_str())));
    }
    output
}

pub fn format_panel(panel: &Panel) -> String {
    let mut output = String::from("field,value\n");
    for (key, value) in &panel.rows {
        output.push_str(&join_row([key.as_str(), value.text.as_str()]));
    }
    output
}

fn join_row<'a, I>(cells: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let cells: Vec<String> = cells.into_iter().map(escape_csv).collect();
    cells.join(",") + "\n"
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Cell;

    #[test]
    fn test_table_escaping() {
        let mut table = Table::new(["id", "text"]);
        table.row(vec!["a".into(), Cell::plain("cats, \"dogs\"")]);
        assert_eq!(format_table(&table), "id,text\na,\"cats, \"\"dogs\"\"\"\n");
    }

    #[test]
    fn test_document_blocks() {
        let doc = Document::new()
            .panel(Panel::new("Docs").field("Objects", "3"))
            .table(Table::new(["name"]));
        assert_eq!(format_document(&doc), "field,value\nObjects,3\n\nname\n");
    }
}
