//! Export of a user's complete data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::Dossier;
use super::errors::ServiceError;
use super::view::CompleteUserView;
use crate::Result;
use crate::settings::ExportFormat;

/// Envelope around the exported view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub export_date: DateTime<Utc>,
    pub account_id: String,
    pub format: ExportFormat,
    pub data: CompleteUserView,
}

/// A rendered export, ready to hand to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub format: ExportFormat,
    pub content_type: &'static str,
    pub filename: String,
    pub body: String,
}

impl Dossier {
    /// Render the account's complete view as JSON or CSV.
    pub async fn export_snapshot(
        &self,
        account_id: &str,
        format: ExportFormat,
    ) -> Result<ExportedDocument> {
        let (content_type, render): (&'static str, fn(&ExportSnapshot) -> Result<String>) =
            match format {
                ExportFormat::Json => ("application/json", render_json),
                ExportFormat::Csv => ("text/csv", render_csv),
                ExportFormat::Xml => {
                    return Err(ServiceError::UnsupportedExportFormat {
                        format: format.as_str().to_string(),
                    }
                    .into());
                }
            };

        let data = self.get_complete_user_view(account_id).await?;
        let snapshot = ExportSnapshot {
            export_date: self.clock().now(),
            account_id: account_id.to_string(),
            format,
            data,
        };

        let body = render(&snapshot)?;
        info!(account_id, format = format.as_str(), bytes = body.len(), "Exported user data");
        Ok(ExportedDocument {
            format,
            content_type,
            filename: format!("user-data-{account_id}.{}", format.as_str()),
            body,
        })
    }
}

fn render_json(snapshot: &ExportSnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

fn render_csv(snapshot: &ExportSnapshot) -> Result<String> {
    let value = serde_json::to_value(snapshot)?;
    let mut rows = Vec::new();
    flatten("", &value, &mut rows);

    let mut out = String::from("Field,Value\n");
    for (field, value) in rows {
        out.push_str(&quote(&field));
        out.push(',');
        out.push_str(&quote(&value));
        out.push('\n');
    }
    Ok(out)
}

/// Flatten nested objects into dotted keys. Arrays and empty objects are
/// kept as JSON text; null becomes an empty cell.
fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, rows);
            }
        }
        Value::Object(_) | Value::Array(_) => rows.push((prefix.to_string(), value.to_string())),
        Value::Null => rows.push((prefix.to_string(), String::new())),
        Value::String(s) => rows.push((prefix.to_string(), s.clone())),
        Value::Bool(_) | Value::Number(_) => rows.push((prefix.to_string(), value.to_string())),
    }
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}
