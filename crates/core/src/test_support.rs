use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{ApiError, ConnectionSubmission, PortholeApi, QuerySubmission, SchemaInfo};
use crate::schema_metadata::SchemaMetadataRow;
use crate::settings::{ConfigSections, GeneralSettings};

/// In-memory server used by state tests.
#[derive(Debug)]
pub(crate) struct FakeApi {
    pub config: Mutex<Result<ConfigSections, ApiError>>,
    pub queries: Mutex<BTreeMap<String, String>>,
    pub schema_info: Mutex<Result<SchemaInfo, ApiError>>,
    pub submitted_queries: Mutex<Vec<QuerySubmission>>,
    pub submitted_connections: Mutex<Vec<ConnectionSubmission>>,
    pub submitted_settings: Mutex<Vec<GeneralSettings>>,
}

impl FakeApi {
    pub fn with_sample_data() -> Self {
        let sections = serde_json::from_value(serde_json::json!({
            "Default": {"query_path": "/srv/queries", "connections": "sales, warehouse"},
            "Email": {"host": "smtp"},
            "sales": {"rdbms": "MySQL", "host": "db1", "port": "3306", "user": "r", "schema": "sales"},
            "warehouse": {"rdbms": "SQLite", "host": "/data/wh.db"}
        }))
        .expect("sample sections");

        let queries = [("daily", "SELECT 1"), ("monthly", "SELECT 30")]
            .into_iter()
            .map(|(name, sql)| (name.to_string(), sql.to_string()))
            .collect();

        Self {
            config: Mutex::new(Ok(sections)),
            queries: Mutex::new(queries),
            schema_info: Mutex::new(Ok(SchemaInfo::Rows(vec![
                SchemaMetadataRow::new("public", "users", "id"),
                SchemaMetadataRow::new("public", "users", "name"),
                SchemaMetadataRow::new("public", "orders", "id"),
            ]))),
            submitted_queries: Mutex::new(Vec::new()),
            submitted_connections: Mutex::new(Vec::new()),
            submitted_settings: Mutex::new(Vec::new()),
        }
    }

    /// Simulates the server dropping a connection section.
    pub fn remove_connection(&self, name: &str) {
        let mut config = self.config.lock().expect("config lock");
        let Ok(sections) = config.as_mut() else {
            return;
        };
        sections.remove(name);
        if let Some(listed) = sections
            .get_mut("Default")
            .and_then(|options| options.get_mut("connections"))
        {
            *listed = listed
                .split(", ")
                .filter(|listed_name| *listed_name != name)
                .collect::<Vec<_>>()
                .join(", ");
        }
    }

    fn query_names(&self) -> Vec<String> {
        self.queries
            .lock()
            .expect("queries lock")
            .keys()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PortholeApi for FakeApi {
    async fn load_config(&self) -> Result<ConfigSections, ApiError> {
        self.config.lock().expect("config lock").clone()
    }

    async fn list_queries(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.query_names())
    }

    async fn test_connection(&self, connection: &str) -> Result<String, ApiError> {
        let config = self.config.lock().expect("config lock").clone()?;
        Ok(if config.contains_key(connection) {
            "Connected Successfully".to_string()
        } else {
            "Failed to Connect".to_string()
        })
    }

    async fn schema_info(&self, _connection: &str) -> Result<SchemaInfo, ApiError> {
        self.schema_info.lock().expect("schema lock").clone()
    }

    async fn query_text(&self, query_name: &str) -> Result<String, ApiError> {
        self.queries
            .lock()
            .expect("queries lock")
            .get(query_name)
            .cloned()
            .ok_or(ApiError::Status { status: 404 })
    }

    async fn submit_query(&self, submission: &QuerySubmission) -> Result<Vec<String>, ApiError> {
        self.submitted_queries
            .lock()
            .expect("submissions lock")
            .push(submission.clone());
        {
            let mut queries = self.queries.lock().expect("queries lock");
            if submission.delete {
                queries.remove(&submission.query_name);
            } else {
                queries.insert(submission.query_name.clone(), submission.raw_sql.clone());
            }
        }
        Ok(self.query_names())
    }

    async fn submit_connection(&self, submission: &ConnectionSubmission) -> Result<(), ApiError> {
        self.submitted_connections
            .lock()
            .expect("submissions lock")
            .push(submission.clone());
        Ok(())
    }

    async fn submit_settings(&self, settings: &GeneralSettings) -> Result<(), ApiError> {
        self.submitted_settings
            .lock()
            .expect("submissions lock")
            .push(settings.clone());
        Ok(())
    }
}
