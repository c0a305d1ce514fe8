//! HTTP client for the Kinetic GraphQL API.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// A GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphqlError {
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }
}

impl GraphqlResponse {
    /// Fail with every error message, or return `data`.
    pub fn into_data(self) -> Result<Value> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self
                .errors
                .iter()
                .map(|e| match e.code() {
                    Some(code) => format!("{} ({})", e.message, code),
                    None => e.message.clone(),
                })
                .collect();
            anyhow::bail!("GraphQL error: {}", messages.join("; "));
        }

        self.data
            .ok_or_else(|| anyhow::anyhow!("API returned no data"))
    }
}

/// Client for a Kinetic server.
pub struct GraphqlClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl GraphqlClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a document to `/graphql` and return the raw envelope.
    pub async fn execute(&self, query: &str, variables: Option<Value>) -> Result<GraphqlResponse> {
        let url = format!("{}/graphql", self.base_url);
        let mut body = json!({ "query": query });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }

        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        let status = resp.status();
        if !status.is_success() && !status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        let text = resp.text().await.unwrap_or_default();
        serde_json::from_str(&text).with_context(|| {
            format!("Unexpected response from {} ({}): {}", url, status, text)
        })
    }

    /// Run a document and deserialize `data[field]`.
    pub async fn query_field<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        field: &str,
    ) -> Result<T> {
        let mut data = self.execute(query, Some(variables)).await?.into_data()?;
        let value = data
            .get_mut(field)
            .map(Value::take)
            .unwrap_or(Value::Null);
        serde_json::from_value(value)
            .with_context(|| format!("Failed to parse `{}` from response", field))
    }

    /// GET a plain JSON endpoint such as `/health`. Non-2xx bodies are still returned.
    pub async fn get_raw(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        resp.json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_joined_with_codes() {
        let response: GraphqlResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [
                { "message": "Not authorized to VIEW USER", "extensions": { "code": "FORBIDDEN" } },
                { "message": "boom" }
            ]
        }))
        .unwrap();

        let err = response.into_data().unwrap_err().to_string();
        assert!(err.contains("Not authorized to VIEW USER (FORBIDDEN)"));
        assert!(err.contains("boom"));
    }

    #[test]
    fn test_data_returned_without_errors() {
        let response: GraphqlResponse =
            serde_json::from_value(json!({ "data": { "me": null } })).unwrap();
        assert_eq!(response.into_data().unwrap(), json!({ "me": null }));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = GraphqlClient::new("http://localhost:4000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:4000");
    }
}
