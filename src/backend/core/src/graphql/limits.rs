//! Request-cost limits.
//!
//! Depth and complexity are enforced by async-graphql itself (see
//! [`super::build_schema`]). Document length, alias count and directive count
//! are checked here, in the parse phase, before any resolver runs.

use async_graphql::extensions::{Extension, ExtensionContext, ExtensionFactory, NextParseQuery};
use async_graphql::parser::types::{ExecutableDocument, Selection, SelectionSet};
use async_graphql::{ServerError, ServerResult, Variables};
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::error::{ErrorCode, KineticError};

/// `[graphql]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryLimitsConfig {
    pub max_depth: usize,
    pub max_complexity: usize,
    pub max_aliases: usize,
    pub max_directives: usize,
    /// Longest accepted document, in bytes
    pub max_query_bytes: usize,
    /// Allow `__schema` / `__type` queries
    pub introspection: bool,
}

impl Default for QueryLimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_complexity: 5000,
            max_aliases: 15,
            max_directives: 50,
            max_query_bytes: 10_000,
            introspection: true,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Document Statistics
// ═══════════════════════════════════════════════════════════════════════════════

/// Alias and directive counts over a whole document, fragments included once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStats {
    pub aliases: usize,
    pub directives: usize,
}

impl DocumentStats {
    pub fn of(doc: &ExecutableDocument) -> Self {
        let mut stats = Self::default();

        for (_, op) in doc.operations.iter() {
            stats.directives += op.node.directives.len();
            stats.visit(&op.node.selection_set.node);
        }
        for fragment in doc.fragments.values() {
            stats.directives += fragment.node.directives.len();
            stats.visit(&fragment.node.selection_set.node);
        }

        stats
    }

    fn visit(&mut self, set: &SelectionSet) {
        for item in &set.items {
            match &item.node {
                Selection::Field(field) => {
                    if field.node.alias.is_some() {
                        self.aliases += 1;
                    }
                    self.directives += field.node.directives.len();
                    self.visit(&field.node.selection_set.node);
                }
                Selection::FragmentSpread(spread) => {
                    self.directives += spread.node.directives.len();
                }
                Selection::InlineFragment(inline) => {
                    self.directives += inline.node.directives.len();
                    self.visit(&inline.node.selection_set.node);
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Extension
// ═══════════════════════════════════════════════════════════════════════════════

/// Extension factory registered on the schema.
pub struct QueryLimits {
    config: Arc<QueryLimitsConfig>,
}

impl QueryLimits {
    pub fn new(config: QueryLimitsConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl ExtensionFactory for QueryLimits {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(QueryLimitsExtension {
            config: self.config.clone(),
        })
    }
}

struct QueryLimitsExtension {
    config: Arc<QueryLimitsConfig>,
}

impl QueryLimitsExtension {
    fn reject(limit: &'static str, message: String) -> ServerError {
        warn!(limit, %message, "GraphQL document rejected");
        counter!("kinetic_query_limit_rejected_total", "limit" => limit).increment(1);

        let graphql_error = KineticError::new(ErrorCode::QueryLimitExceeded, message).into_graphql();
        let mut error = ServerError::new(graphql_error.message, None);
        error.extensions = graphql_error.extensions;
        error
    }
}

#[async_trait::async_trait]
impl Extension for QueryLimitsExtension {
    async fn parse_query(
        &self,
        ctx: &ExtensionContext<'_>,
        query: &str,
        variables: &Variables,
        next: NextParseQuery<'_>,
    ) -> ServerResult<ExecutableDocument> {
        if query.len() > self.config.max_query_bytes {
            return Err(Self::reject(
                "length",
                format!(
                    "Query is {} bytes, the maximum is {}",
                    query.len(),
                    self.config.max_query_bytes
                ),
            ));
        }

        let doc = next.run(ctx, query, variables).await?;
        let stats = DocumentStats::of(&doc);

        if stats.aliases > self.config.max_aliases {
            return Err(Self::reject(
                "aliases",
                format!(
                    "Query uses {} aliases, the maximum is {}",
                    stats.aliases, self.config.max_aliases
                ),
            ));
        }
        if stats.directives > self.config.max_directives {
            return Err(Self::reject(
                "directives",
                format!(
                    "Query uses {} directives, the maximum is {}",
                    stats.directives, self.config.max_directives
                ),
            ));
        }

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::parser::parse_query;
    use async_graphql::{EmptyMutation, EmptySubscription, Object, Schema};

    struct Query;

    #[Object]
    impl Query {
        async fn ping(&self) -> &'static str {
            "pong"
        }
    }

    fn schema(config: QueryLimitsConfig) -> Schema<Query, EmptyMutation, EmptySubscription> {
        Schema::build(Query, EmptyMutation, EmptySubscription)
            .extension(QueryLimits::new(config))
            .finish()
    }

    fn aliased(count: usize) -> String {
        let fields: Vec<String> = (0..count).map(|i| format!("a{i}: ping")).collect();
        format!("{{ {} }}", fields.join(" "))
    }

    #[test]
    fn test_document_stats() {
        let doc = parse_query(
            r#"
            query Q @a { x: ping ...F ... on Query @b { y: ping @c } }
            fragment F on Query @d { z: ping @e }
            "#,
        )
        .unwrap();

        assert_eq!(
            DocumentStats::of(&doc),
            DocumentStats {
                aliases: 3,
                directives: 5
            }
        );
    }

    #[tokio::test]
    async fn test_within_limits_executes() {
        let response = schema(QueryLimitsConfig::default()).execute(aliased(15)).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
    }

    #[tokio::test]
    async fn test_too_many_aliases_rejected() {
        let response = schema(QueryLimitsConfig::default()).execute(aliased(16)).await;

        assert_eq!(response.errors.len(), 1);
        let code = response.errors[0]
            .extensions
            .as_ref()
            .and_then(|e| e.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("QUERY_LIMIT_EXCEEDED")));
    }

    #[tokio::test]
    async fn test_too_many_directives_rejected() {
        let config = QueryLimitsConfig {
            max_directives: 2,
            ..Default::default()
        };
        let response = schema(config)
            .execute("{ ping @skip(if: false) @include(if: true) a: ping @skip(if: false) }")
            .await;
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].message.contains("directives"));
    }

    #[tokio::test]
    async fn test_oversized_document_rejected() {
        let config = QueryLimitsConfig {
            max_query_bytes: 8,
            ..Default::default()
        };
        let response = schema(config).execute("{ ping ping }").await;
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].message.contains("bytes"));
    }
}
