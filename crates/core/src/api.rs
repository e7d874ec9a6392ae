use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::connections::ConnectionDraft;
use crate::schema_metadata::SchemaMetadataRow;
use crate::settings::{ConfigSections, GeneralSettings};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded with status {status}")]
    Status { status: u16 },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Result of a schema introspection call.
///
/// The server signals a failed connection by answering with anything other
/// than a list, so both outcomes arrive as successful responses.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaInfo {
    Rows(Vec<SchemaMetadataRow>),
    Unavailable(Value),
}

impl SchemaInfo {
    pub fn from_json(payload: Value) -> Result<Self, ApiError> {
        if payload.is_array() {
            let rows = serde_json::from_value(payload)
                .map_err(|error| ApiError::Decode(error.to_string()))?;
            return Ok(Self::Rows(rows));
        }
        Ok(Self::Unavailable(payload))
    }

    /// Parses a raw response body; bodies that are not JSON count as a
    /// non-list answer.
    pub fn from_body(body: &str) -> Result<Self, ApiError> {
        match serde_json::from_str::<Value>(body) {
            Ok(payload) => Self::from_json(payload),
            Err(_) => Ok(Self::Unavailable(Value::String(body.to_string()))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySubmission {
    pub query_name: String,
    pub raw_sql: String,
    pub delete: bool,
}

impl QuerySubmission {
    #[must_use]
    pub fn save(query_name: impl Into<String>, raw_sql: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            raw_sql: raw_sql.into(),
            delete: false,
        }
    }

    #[must_use]
    pub fn delete(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            raw_sql: "none".to_string(),
            delete: true,
        }
    }

    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("raw_sql", self.raw_sql.clone()),
            ("query_name", self.query_name.clone()),
            (
                "delete_query",
                if self.delete { "Yes" } else { "No" }.to_string(),
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSubmission {
    pub draft: ConnectionDraft,
    pub delete: bool,
}

impl ConnectionSubmission {
    #[must_use]
    pub fn save(draft: ConnectionDraft) -> Self {
        Self {
            draft,
            delete: false,
        }
    }

    #[must_use]
    pub fn delete(connection_name: impl Into<String>) -> Self {
        Self {
            draft: ConnectionDraft {
                name: connection_name.into(),
                ..ConnectionDraft::default()
            },
            delete: true,
        }
    }

    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let draft = &self.draft;
        vec![
            ("connection_name", draft.name.clone()),
            ("rdbms", draft.rdbms.as_str().to_string()),
            ("connection_host", draft.host.clone()),
            ("connection_port", draft.port.clone()),
            ("connection_user", draft.user.clone()),
            ("connection_password", draft.password.clone()),
            ("schema", draft.schema.clone()),
            (
                "delete_connection",
                if self.delete { "True" } else { "" }.to_string(),
            ),
            ("connection_submit", "Save Connection".to_string()),
        ]
    }
}

#[must_use]
pub fn settings_form_fields(settings: &GeneralSettings) -> Vec<(&'static str, String)> {
    let mut fields = settings.form_fields();
    fields.push(("config_submit", "Save Settings".to_string()));
    fields
}

/// Server calls the client depends on.
#[async_trait]
pub trait PortholeApi: Send + Sync {
    async fn load_config(&self) -> Result<ConfigSections, ApiError>;
    async fn list_queries(&self) -> Result<Vec<String>, ApiError>;
    async fn test_connection(&self, connection: &str) -> Result<String, ApiError>;
    async fn schema_info(&self, connection: &str) -> Result<SchemaInfo, ApiError>;
    async fn query_text(&self, query_name: &str) -> Result<String, ApiError>;
    /// Saves or deletes a query and returns every remaining query name.
    async fn submit_query(&self, submission: &QuerySubmission) -> Result<Vec<String>, ApiError>;
    async fn submit_connection(&self, submission: &ConnectionSubmission) -> Result<(), ApiError>;
    async fn submit_settings(&self, settings: &GeneralSettings) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        settings_form_fields, ApiError, ConnectionSubmission, QuerySubmission, SchemaInfo,
    };
    use crate::schema_metadata::SchemaMetadataRow;
    use crate::settings::GeneralSettings;

    #[test]
    fn list_payload_decodes_rows() {
        let info = SchemaInfo::from_json(json!([
            {"table_schema": "public", "table_name": "users", "column_name": "id"}
        ]))
        .expect("rows should decode");

        assert_eq!(
            info,
            SchemaInfo::Rows(vec![SchemaMetadataRow::new("public", "users", "id")])
        );
    }

    #[test]
    fn string_payload_is_unavailable() {
        let info = SchemaInfo::from_body("\"error\"").expect("string payload is not an error");
        assert_eq!(info, SchemaInfo::Unavailable(json!("error")));

        let plain = SchemaInfo::from_body("Failed to Connect").expect("plain text is accepted");
        assert!(matches!(plain, SchemaInfo::Unavailable(_)));
    }

    #[test]
    fn malformed_rows_are_decode_errors() {
        let err = SchemaInfo::from_json(json!([{"table_schema": 3}]))
            .expect_err("rows missing fields should fail");
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn query_delete_form_uses_placeholder_sql() {
        let fields = QuerySubmission::delete("monthly").form_fields();
        assert_eq!(
            fields,
            vec![
                ("raw_sql", "none".to_string()),
                ("query_name", "monthly".to_string()),
                ("delete_query", "Yes".to_string()),
            ]
        );
        assert!(QuerySubmission::save("monthly", "SELECT 1")
            .form_fields()
            .contains(&("delete_query", "No".to_string())));
    }

    #[test]
    fn connection_delete_form_sets_flag_and_name() {
        let fields = ConnectionSubmission::delete("sales").form_fields();
        assert!(fields.contains(&("connection_name", "sales".to_string())));
        assert!(fields.contains(&("delete_connection", "True".to_string())));
        assert!(fields.contains(&("connection_submit", "Save Connection".to_string())));
    }

    #[test]
    fn settings_form_carries_submit_marker() {
        let fields = settings_form_fields(&GeneralSettings::default());
        assert_eq!(
            fields.last(),
            Some(&("config_submit", "Save Settings".to_string()))
        );
    }
}
