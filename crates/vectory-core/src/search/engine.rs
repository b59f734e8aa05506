//! Strategy selection and query execution

use super::fallback;
use super::fields::{additional_fields, select_fields};
use super::normalize::normalize;
use super::{SearchMode, SearchOutcome, SearchRequest, SearchStrategy};
use crate::error::{Result, VectoryError};
use crate::graphql::{self, validate_name, FusionType, GetQuery, GraphQlRequest, SearchClause};
use crate::objects::ObjectsClient;
use crate::schema::{CollectionSchema, SchemaClient};
use crate::transport::Transport;
use std::sync::Arc;

/// Pick how a request is answered
///
/// A supplied vector always yields a vector-bearing query. Without one, a
/// vectorizer enables server-side semantic search and its absence means
/// client-side emulation.
pub fn plan_strategy(mode: &SearchMode, has_vector: bool, has_vectorizer: bool) -> SearchStrategy {
    if has_vector {
        return match mode {
            SearchMode::Hybrid(_) => SearchStrategy::HybridVector,
            _ => SearchStrategy::NearVector,
        };
    }

    if !has_vectorizer {
        return SearchStrategy::ClientSide;
    }

    match mode {
        SearchMode::Text { query } if query.trim().is_empty() => SearchStrategy::Where,
        SearchMode::Text { .. } => SearchStrategy::NearText,
        SearchMode::Hybrid(_) => SearchStrategy::Hybrid,
        SearchMode::Vector | SearchMode::Filter => SearchStrategy::Where,
    }
}

#[derive(Clone)]
pub struct SearchEngine {
    transport: Arc<dyn Transport>,
    schema: SchemaClient,
    objects: ObjectsClient,
}

impl SearchEngine {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            schema: SchemaClient::new(transport.clone()),
            objects: ObjectsClient::new(transport.clone()),
            transport,
        }
    }

    /// Run a search
    ///
    /// Invalid requests fail before any network call. GraphQL-level errors
    /// are reported in [`SearchOutcome::error`].
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        let fusion = validate(request)?;

        let schema = match self.schema.get_collection(&request.collection).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("schema for {} unavailable: {}", request.collection, e);
                None
            }
        };
        let has_vectorizer = schema.as_ref().map_or(false, CollectionSchema::has_vectorizer);

        let strategy = plan_strategy(&request.mode, request.vector.is_some(), has_vectorizer);
        tracing::debug!(
            "{} search on {} (vectorizer: {}) using {}",
            request.mode.name(),
            request.collection,
            has_vectorizer,
            strategy
        );

        if strategy == SearchStrategy::ClientSide {
            let hits = fallback::search(&self.objects, request, schema.as_ref()).await?;
            return Ok(SearchOutcome::hits(strategy, hits));
        }

        let query = build_query(request, strategy, fusion, schema.as_ref())?.render()?;
        let graphql_request =
            GraphQlRequest::new(query).with_tenant(request.tenant.as_deref());
        let response = graphql::execute(self.transport.as_ref(), &graphql_request).await?;

        let outcome = normalize(response, &request.collection, strategy);
        if let Some(ref error) = outcome.error {
            tracing::debug!("search on {} returned errors: {}", request.collection, error);
        }
        Ok(outcome)
    }
}

fn invalid(message: impl Into<String>) -> VectoryError {
    VectoryError::InvalidInput(message.into())
}

/// Local checks; returns the parsed fusion type for hybrid requests
fn validate(request: &SearchRequest) -> Result<FusionType> {
    validate_name(&request.collection)?;
    for property in &request.return_properties {
        validate_name(property)?;
    }

    if let Some(ref vector) = request.vector {
        if vector.is_empty() {
            return Err(invalid("vector must not be empty"));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(invalid("vector must contain only finite numbers"));
        }
    }

    match &request.mode {
        SearchMode::Hybrid(params) => {
            if !params.alpha.is_finite() {
                return Err(invalid(format!("alpha must be a finite number (got {})", params.alpha)));
            }
            for property in &params.properties {
                validate_name(property)?;
            }
            params.fusion_type.parse()
        }
        SearchMode::Vector if request.vector.is_none() => {
            Err(invalid("vector search requires a vector"))
        }
        SearchMode::Filter if request.filter.is_none() => {
            Err(invalid("filter search requires a filter"))
        }
        _ => Ok(FusionType::default()),
    }
}

fn build_query(
    request: &SearchRequest,
    strategy: SearchStrategy,
    fusion: FusionType,
    schema: Option<&CollectionSchema>,
) -> Result<GetQuery> {
    let clause = match (strategy, &request.mode) {
        (SearchStrategy::Hybrid | SearchStrategy::HybridVector, SearchMode::Hybrid(params)) => {
            Some(SearchClause::Hybrid {
                query: params.query.clone(),
                alpha: params.alpha,
                fusion,
                vector: request.vector.clone(),
                properties: params.properties.clone(),
            })
        }
        (SearchStrategy::NearVector, _) => Some(SearchClause::NearVector {
            vector: request.vector.clone().unwrap_or_default(),
        }),
        (SearchStrategy::NearText, SearchMode::Text { query }) => Some(SearchClause::NearText {
            concepts: vec![query.clone()],
        }),
        (SearchStrategy::Where, _) => None,
        (other, mode) => {
            return Err(invalid(format!(
                "{} strategy cannot answer a {} search",
                other,
                mode.name()
            )))
        }
    };

    let mut query = GetQuery::new(request.collection.clone())
        .limit(request.limit)
        .filter(request.filter.clone())
        .fields(select_fields(&request.return_properties, schema))
        .additional(additional_fields(strategy));
    if let Some(clause) = clause {
        query = query.search(clause);
    }
    Ok(query)
}
