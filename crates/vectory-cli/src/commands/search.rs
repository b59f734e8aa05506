//! Search commands

use super::read_json_file;
use crate::app::{OutputFormat, SearchAction, SearchArgs, SearchCommon};
use crate::output::{display_value, truncate, Document, Output, Table};
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use vectory_core::{
    HybridParams, SearchHit, SearchMode, SearchOutcome, SearchRequest, VectoryClient, WhereFilter,
};

const CELL_WIDTH: usize = 60;

pub async fn run(args: SearchArgs, client: &VectoryClient, out: &Output) -> Result<()> {
    let request = build_request(args.action)?;
    let outcome = client.search.search(&request).await?;
    render(out, &request, &outcome)
}

fn build_request(action: SearchAction) -> Result<SearchRequest> {
    let (request, common) = match action {
        SearchAction::Text {
            collection,
            query,
            filter,
            vector_file,
            common,
        } => (
            SearchRequest::text(collection, query)
                .with_filter(parse_filter(filter.as_deref())?)
                .with_vector(vector_file.as_deref().map(load_vector).transpose()?),
            common,
        ),
        SearchAction::Hybrid {
            collection,
            query,
            alpha,
            fusion_type,
            properties,
            filter,
            vector_file,
            common,
        } => {
            let params = HybridParams::new(query)
                .alpha(alpha)
                .fusion_type(fusion_type)
                .properties(properties);
            (
                SearchRequest::hybrid(collection, params)
                    .with_filter(parse_filter(filter.as_deref())?)
                    .with_vector(vector_file.as_deref().map(load_vector).transpose()?),
                common,
            )
        }
        SearchAction::Vector {
            collection,
            vector_file,
            filter,
            common,
        } => (
            SearchRequest::vector(collection, load_vector(&vector_file)?)
                .with_filter(parse_filter(filter.as_deref())?),
            common,
        ),
        SearchAction::Filter {
            collection,
            filter,
            common,
        } => (
            SearchRequest::filter(collection, WhereFilter::parse(&filter)?),
            common,
        ),
    };
    Ok(apply_common(request, common))
}

fn apply_common(request: SearchRequest, common: SearchCommon) -> SearchRequest {
    request
        .with_limit(common.limit)
        .with_tenant(common.tenant)
        .with_return_properties(common.return_properties)
}

pub(crate) fn parse_filter(filter: Option<&str>) -> Result<Option<WhereFilter>> {
    filter
        .map(|raw| WhereFilter::parse(raw).context("Invalid filter"))
        .transpose()
}

/// Query vector from a file holding `[...]` or `{"vector": [...]}`
pub(crate) fn load_vector(path: &Path) -> Result<Vec<f32>> {
    let value = match read_json_file(path)? {
        Value::Object(mut map) => match map.remove("vector") {
            Some(vector) => vector,
            None => bail!("{} has no \"vector\" field", path.display()),
        },
        other => other,
    };
    serde_json::from_value(value)
        .with_context(|| format!("{} must hold an array of numbers", path.display()))
}

fn describe(request: &SearchRequest) -> String {
    match request.mode.query() {
        Some(query) => format!(
            "{} search for '{}' in '{}'",
            request.mode.name(),
            query,
            request.collection
        ),
        None => format!("{} search in '{}'", request.mode.name(), request.collection),
    }
}

fn render(out: &Output, request: &SearchRequest, outcome: &SearchOutcome) -> Result<()> {
    if let Some(ref error) = outcome.error {
        if out.format == OutputFormat::Json {
            return out.emit(outcome, &Document::new());
        }
        eprintln!("Search failed: {}", error);
        return Ok(());
    }

    out.note(&format!("{} ({})", describe(request), outcome.strategy));
    if outcome.objects.is_empty() {
        out.note("No results found");
        return out.emit(outcome, &Document::new());
    }

    let doc = Document::new().table(hit_table(&outcome.objects, &request.mode));
    out.emit(outcome, &doc)
}

fn metric(hit: &SearchHit) -> String {
    let additional = &hit.additional;
    if let Some(score) = additional.score {
        format!("{:.4}", score)
    } else if let Some(distance) = additional.distance {
        format!("{:.4}", distance)
    } else if let Some(certainty) = additional.certainty {
        format!("{:.4}", certainty)
    } else {
        "-".to_string()
    }
}

fn hit_table(hits: &[SearchHit], mode: &SearchMode) -> Table {
    let metric_header = match mode {
        SearchMode::Vector => "Distance",
        SearchMode::Filter => "Match",
        _ => "Score",
    };
    let mut table = Table::new(["#", "Id", metric_header, "Properties"])
        .titled(format!("Results ({})", hits.len()));
    for (rank, hit) in hits.iter().enumerate() {
        let summary = hit
            .properties
            .iter()
            .map(|(k, v)| format!("{}={}", k, display_value(v)))
            .collect::<Vec<_>>()
            .join(" ");
        table.row(vec![
            (rank + 1).to_string().into(),
            hit.id.clone().unwrap_or_else(|| "-".into()).into(),
            metric(hit).into(),
            truncate(&summary, CELL_WIDTH).into(),
        ]);
    }
    table
}
