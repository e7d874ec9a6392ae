use crate::api::{ApiError, QuerySubmission, SchemaInfo};
use crate::effects::Effect;
use crate::requests::{RequestKey, RequestTracker};
use crate::schema_metadata::SchemaTree;
use crate::settings::NONE_SELECTED;

pub const CONNECT_LABEL: &str = "Connect";
pub const REFRESH_CONNECTION_LABEL: &str = "Refresh Connection";

pub const STATUS_CONNECTING: &str = "Connecting...";
pub const STATUS_CONNECTED: &str = "Connected";
pub const STATUS_FAILED: &str = "Failed to Connect";

pub const QUERY_NAME_BLANK: &str = "Query Not Saved: Query Name cannot be blank.";
pub const QUERY_SQL_BLANK: &str = "Query Not Saved: Query cannot be blank.";
pub const SAVED_SUCCESSFULLY: &str = "Saved Successfully";
pub const DELETED_SUCCESSFULLY: &str = "Deleted Successfully";
pub const SAVE_FAILED: &str = "Error: Save Failed";
pub const DELETE_FAILED: &str = "Error: Delete Failed";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionChoice {
    #[default]
    NoneSelected,
    Named(String),
}

impl ConnectionChoice {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::NoneSelected => NONE_SELECTED,
            Self::Named(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivePanel {
    #[default]
    Queries,
    Schema,
}

/// Query page state: connection browser, tabs, saved-query list and editor.
#[derive(Debug)]
pub struct QueryWorkbench {
    connections: Vec<String>,
    selection: ConnectionChoice,
    status: String,
    connect_label: &'static str,
    results_visible: bool,
    schema_tree: SchemaTree,
    active_panel: ActivePanel,
    query_names: Vec<String>,
    selected_query: Option<String>,
    display_name: String,
    editor: String,
    save_response: Option<String>,
}

impl Default for QueryWorkbench {
    fn default() -> Self {
        Self {
            connections: Vec::new(),
            selection: ConnectionChoice::NoneSelected,
            status: String::new(),
            connect_label: CONNECT_LABEL,
            results_visible: false,
            schema_tree: SchemaTree::default(),
            active_panel: ActivePanel::Queries,
            query_names: Vec::new(),
            selected_query: None,
            display_name: String::new(),
            editor: String::new(),
            save_response: None,
        }
    }
}

impl QueryWorkbench {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the selectable connections. A selection that no longer exists
    /// falls back to "None Selected".
    pub fn set_connections(&mut self, connections: Vec<String>, requests: &mut RequestTracker) {
        self.connections = connections;
        let stale = matches!(
            &self.selection,
            ConnectionChoice::Named(name) if !self.connections.contains(name)
        );
        if stale {
            self.select_connection(ConnectionChoice::NoneSelected, requests);
        }
    }

    #[must_use]
    pub fn connection_choices(&self) -> Vec<ConnectionChoice> {
        std::iter::once(ConnectionChoice::NoneSelected)
            .chain(self.connections.iter().cloned().map(ConnectionChoice::Named))
            .collect()
    }

    #[must_use]
    pub fn selection(&self) -> &ConnectionChoice {
        &self.selection
    }

    pub fn select_connection(&mut self, choice: ConnectionChoice, requests: &mut RequestTracker) {
        requests.invalidate(&RequestKey::SchemaInfo);
        self.results_visible = false;
        self.status.clear();
        self.connect_label = CONNECT_LABEL;
        self.selection = choice;
    }

    #[must_use]
    pub fn connect_visible(&self) -> bool {
        matches!(self.selection, ConnectionChoice::Named(_))
    }

    #[must_use]
    pub fn connect_label(&self) -> &'static str {
        self.connect_label
    }

    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    #[must_use]
    pub fn results_visible(&self) -> bool {
        self.results_visible
    }

    #[must_use]
    pub fn schema_tree(&self) -> &SchemaTree {
        &self.schema_tree
    }

    /// Starts a fresh fetch-and-render cycle for the selected connection.
    pub fn connect(&mut self, requests: &mut RequestTracker) -> Option<Effect> {
        let ConnectionChoice::Named(connection) = &self.selection else {
            return None;
        };

        let effect = Effect::FetchSchemaInfo {
            ticket: requests.issue(RequestKey::SchemaInfo),
            connection: connection.clone(),
        };
        STATUS_CONNECTING.clone_into(&mut self.status);
        self.schema_tree = SchemaTree::default();
        Some(effect)
    }

    pub fn apply_schema_info(&mut self, result: Result<SchemaInfo, ApiError>) {
        match result {
            Ok(SchemaInfo::Rows(rows)) => {
                STATUS_CONNECTED.clone_into(&mut self.status);
                self.connect_label = REFRESH_CONNECTION_LABEL;
                self.results_visible = true;
                self.schema_tree = SchemaTree::from_rows(rows);
            }
            Ok(SchemaInfo::Unavailable(payload)) => {
                tracing::debug!(%payload, "schema info unavailable");
                STATUS_FAILED.clone_into(&mut self.status);
            }
            Err(error) => {
                tracing::warn!(%error, "schema info request failed");
                STATUS_FAILED.clone_into(&mut self.status);
            }
        }
    }

    pub fn select_tree_entry(&mut self, index: usize) -> bool {
        self.schema_tree.select_entry(index)
    }

    #[must_use]
    pub fn active_panel(&self) -> ActivePanel {
        self.active_panel
    }

    pub fn show_panel(&mut self, panel: ActivePanel) {
        self.active_panel = panel;
    }

    #[must_use]
    pub fn query_names(&self) -> &[String] {
        &self.query_names
    }

    /// Replaces the rendered query list; the selection marker does not
    /// survive a re-render.
    pub fn set_query_names(&mut self, names: Vec<String>) {
        self.query_names = names;
        self.selected_query = None;
    }

    #[must_use]
    pub fn selected_query(&self) -> Option<&str> {
        self.selected_query.as_deref()
    }

    pub fn select_query(&mut self, index: usize) -> bool {
        let Some(name) = self.query_names.get(index) else {
            return false;
        };
        self.selected_query = Some(name.clone());
        true
    }

    #[must_use]
    pub fn action_row_visible(&self) -> bool {
        self.selected_query.is_some()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn display_name_mut(&mut self) -> &mut String {
        &mut self.display_name
    }

    #[must_use]
    pub fn editor(&self) -> &str {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut String {
        &mut self.editor
    }

    #[must_use]
    pub fn save_response(&self) -> Option<&str> {
        self.save_response.as_deref()
    }

    /// Loads the selected query into the editor.
    pub fn edit_query(&mut self, requests: &mut RequestTracker) -> Option<Effect> {
        let name = self.selected_query.clone()?;
        name.clone_into(&mut self.display_name);
        Some(Effect::FetchQueryText {
            ticket: requests.issue(RequestKey::QueryText),
            query_name: name,
        })
    }

    pub fn apply_query_text(&mut self, result: Result<String, ApiError>) {
        match result {
            Ok(raw_sql) => self.editor = raw_sql,
            Err(error) => tracing::warn!(%error, "query text request failed"),
        }
    }

    pub fn clear_query(&mut self) {
        self.editor.clear();
        self.display_name.clear();
    }

    pub fn save_query(&mut self, requests: &mut RequestTracker) -> Option<Effect> {
        if self.display_name.trim().is_empty() {
            self.save_response = Some(QUERY_NAME_BLANK.to_string());
            return None;
        }
        if self.editor.trim().is_empty() {
            self.save_response = Some(QUERY_SQL_BLANK.to_string());
            return None;
        }

        Some(Effect::SubmitQuery {
            ticket: requests.issue(RequestKey::QueryList),
            submission: QuerySubmission::save(self.display_name.clone(), self.editor.clone()),
        })
    }

    /// Deletes the selected query. There is no confirmation step.
    pub fn delete_query(&mut self, requests: &mut RequestTracker) -> Option<Effect> {
        let name = self.selected_query.clone()?;
        Some(Effect::SubmitQuery {
            ticket: requests.issue(RequestKey::QueryList),
            submission: QuerySubmission::delete(name),
        })
    }

    pub fn apply_query_submitted(&mut self, delete: bool, result: Result<Vec<String>, ApiError>) {
        match result {
            Ok(names) => {
                if delete {
                    self.clear_query();
                    self.save_response = Some(DELETED_SUCCESSFULLY.to_string());
                } else {
                    self.save_response = Some(SAVED_SUCCESSFULLY.to_string());
                }
                self.set_query_names(names);
            }
            Err(error) => {
                tracing::warn!(delete, %error, "query submission failed");
                let message = if delete { DELETE_FAILED } else { SAVE_FAILED };
                self.save_response = Some(message.to_string());
            }
        }
    }
}
