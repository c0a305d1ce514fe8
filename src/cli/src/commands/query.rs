//! Run an arbitrary GraphQL document.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use crate::client::GraphqlClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct QueryArgs {
    /// GraphQL document, or `@path` to read it from a file
    document: String,

    /// Variables as a JSON object
    #[arg(short, long)]
    variables: Option<String>,
}

fn read_document(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path)),
        None => Ok(arg.to_string()),
    }
}

fn parse_variables(raw: Option<&str>) -> Result<Option<Value>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw).context("--variables is not valid JSON")?;
    if !value.is_object() {
        anyhow::bail!("--variables must be a JSON object");
    }
    Ok(Some(value))
}

/// Prints the whole response envelope, errors included; fails only when
/// there is no data at all.
pub async fn execute(args: QueryArgs, client: &GraphqlClient, format: OutputFormat) -> Result<()> {
    let document = read_document(&args.document)?;
    let variables = parse_variables(args.variables.as_deref())?;

    let response = client.execute(&document, variables).await?;

    for error in &response.errors {
        output::print_error(&match error.code() {
            Some(code) => format!("{} ({})", error.message, code),
            None => error.message.clone(),
        });
    }

    match response.data {
        Some(data) if !data.is_null() => output::print_item(&data, format),
        _ if response.errors.is_empty() => output::print_item(&Value::Null, format),
        _ => anyhow::bail!("Query failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_variables_must_be_object() {
        assert!(parse_variables(None).unwrap().is_none());
        assert!(parse_variables(Some(r#"{"id": 1}"#)).unwrap().is_some());
        assert!(parse_variables(Some("[1]")).is_err());
        assert!(parse_variables(Some("{")).is_err());
    }

    #[test]
    fn test_document_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ me {{ id }} }}").unwrap();

        let arg = format!("@{}", file.path().display());
        assert_eq!(read_document(&arg).unwrap(), "{ me { id } }");
        assert_eq!(read_document("{ me { id } }").unwrap(), "{ me { id } }");
    }
}
