use std::collections::BTreeMap;

use crate::api::{ApiError, ConnectionSubmission};
use crate::connections::{ConnectionDraft, RdbmsKind};
use crate::effects::Effect;
use crate::requests::{RequestKey, RequestTracker};
use crate::settings::{ConfigSnapshot, GeneralSettings, SettingsField};

pub const EDIT_SETTINGS_LABEL: &str = "Edit Settings";
pub const ADD_CONNECTION_LABEL: &str = "Add Connection";
pub const CANCEL_LABEL: &str = "Cancel";

pub const SETTINGS_UPDATED: &str = "Settings Updated";
pub const SETTINGS_NOT_SAVED: &str = "Error: Settings Not Saved";
pub const SETTINGS_NOT_LOADED: &str = "Error: Settings Not Loaded";
pub const CONNECTION_NAME_BLANK: &str = "Connection Not Saved: Connection Name cannot be blank.";
pub const CONNECTION_NOT_SAVED: &str = "Error: Connection Not Saved";
pub const CONNECTION_NOT_DELETED: &str = "Error: Connection Not Deleted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionField {
    Name,
    Rdbms,
    Host,
    Port,
    User,
    Password,
    Schema,
}

impl ConnectionField {
    pub const ALL: [ConnectionField; 7] = [
        Self::Name,
        Self::Rdbms,
        Self::Host,
        Self::Port,
        Self::User,
        Self::Password,
        Self::Schema,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Connection name",
            Self::Rdbms => "RDBMS",
            Self::Host => "Host",
            Self::Port => "Port",
            Self::User => "User",
            Self::Password => "Password",
            Self::Schema => "Schema",
        }
    }

    #[must_use]
    pub fn value(self, draft: &ConnectionDraft) -> &str {
        match self {
            Self::Name => &draft.name,
            Self::Rdbms => draft.rdbms.as_str(),
            Self::Host => &draft.host,
            Self::Port => &draft.port,
            Self::User => &draft.user,
            Self::Password => &draft.password,
            Self::Schema => &draft.schema,
        }
    }

    pub fn set(self, draft: &mut ConnectionDraft, value: &str) {
        match self {
            Self::Name => value.clone_into(&mut draft.name),
            Self::Rdbms => draft.rdbms = RdbmsKind::parse(value),
            Self::Host => value.clone_into(&mut draft.host),
            Self::Port => value.clone_into(&mut draft.port),
            Self::User => value.clone_into(&mut draft.user),
            Self::Password => value.clone_into(&mut draft.password),
            Self::Schema => value.clone_into(&mut draft.schema),
        }
    }
}

/// Settings page: general settings form, connection form, per-connection
/// test results.
#[derive(Debug, Default)]
pub struct SettingsPanel {
    snapshot: ConfigSnapshot,
    draft: GeneralSettings,
    editing: bool,
    connection_form: Option<ConnectionDraft>,
    test_results: BTreeMap<String, String>,
    flash: Option<String>,
}

impl SettingsPanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all page data with a fresh server snapshot and resets every
    /// form to match it.
    pub fn load_snapshot(&mut self, snapshot: ConfigSnapshot) {
        self.draft = snapshot.settings.clone();
        self.editing = false;
        self.connection_form = None;
        self.test_results
            .retain(|name, _| snapshot.connections.get(name).is_some());
        self.snapshot = snapshot;
    }

    #[must_use]
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn draft(&self) -> &GeneralSettings {
        &self.draft
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    #[must_use]
    pub fn save_visible(&self) -> bool {
        self.editing
    }

    #[must_use]
    pub fn edit_label(&self) -> &'static str {
        if self.editing {
            CANCEL_LABEL
        } else {
            EDIT_SETTINGS_LABEL
        }
    }

    /// Enables the settings fields, or cancels the edit by restoring the
    /// last loaded values.
    pub fn toggle_edit(&mut self) {
        if self.editing {
            self.draft = self.snapshot.settings.clone();
            self.editing = false;
        } else {
            self.editing = true;
        }
    }

    /// Returns `false` when fields are disabled.
    pub fn set_setting(&mut self, field: SettingsField, value: &str) -> bool {
        if !self.editing {
            return false;
        }
        value.clone_into(self.draft.get_mut(field));
        true
    }

    pub fn save_settings(&mut self, requests: &mut RequestTracker) -> Option<Effect> {
        if !self.editing {
            return None;
        }
        Some(Effect::SubmitSettings {
            ticket: requests.issue(RequestKey::SettingsSubmit),
            settings: self.draft.clone(),
        })
    }

    #[must_use]
    pub fn add_connection_label(&self) -> &'static str {
        if self.connection_form.is_some() {
            CANCEL_LABEL
        } else {
            ADD_CONNECTION_LABEL
        }
    }

    #[must_use]
    pub fn connection_form(&self) -> Option<&ConnectionDraft> {
        self.connection_form.as_ref()
    }

    /// Reveals an empty connection form, or hides and resets it.
    pub fn toggle_add_connection(&mut self) {
        if self.connection_form.is_some() {
            self.connection_form = None;
        } else {
            self.connection_form = Some(ConnectionDraft::default());
        }
    }

    /// Opens the form prefilled from the stored connection `name`.
    pub fn edit_connection(&mut self, name: &str) -> bool {
        let Some(config) = self.snapshot.connections.get(name) else {
            return false;
        };
        self.connection_form = Some(ConnectionDraft::from_config(config));
        true
    }

    pub fn set_connection_field(&mut self, field: ConnectionField, value: &str) -> bool {
        let Some(form) = self.connection_form.as_mut() else {
            return false;
        };
        field.set(form, value);
        true
    }

    pub fn save_connection(&mut self, requests: &mut RequestTracker) -> Option<Effect> {
        let form = self.connection_form.as_ref()?;
        if form.name.trim().is_empty() {
            self.flash = Some(CONNECTION_NAME_BLANK.to_string());
            return None;
        }
        Some(Effect::SubmitConnection {
            ticket: requests.issue(RequestKey::ConnectionSubmit),
            submission: ConnectionSubmission::save(form.clone()),
        })
    }

    /// Asks the server to delete `name`. There is no confirmation step.
    pub fn delete_connection(&self, name: &str, requests: &mut RequestTracker) -> Effect {
        Effect::SubmitConnection {
            ticket: requests.issue(RequestKey::ConnectionSubmit),
            submission: ConnectionSubmission::delete(name),
        }
    }

    pub fn test_connection(&self, name: &str, requests: &mut RequestTracker) -> Effect {
        Effect::TestConnection {
            ticket: requests.issue(RequestKey::TestConnection(name.to_string())),
            connection: name.to_string(),
        }
    }

    #[must_use]
    pub fn test_result(&self, name: &str) -> Option<&str> {
        self.test_results.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn flash(&self) -> Option<&str> {
        self.flash.as_deref()
    }

    pub fn set_flash(&mut self, message: impl Into<String>) {
        self.flash = Some(message.into());
    }

    pub fn apply_test_result(&mut self, connection: String, result: Result<String, ApiError>) {
        match result {
            Ok(message) => {
                self.test_results.insert(connection, message);
            }
            Err(error) => {
                tracing::warn!(%connection, %error, "connection test request failed");
            }
        }
    }

    pub fn apply_connection_submitted(
        &mut self,
        delete: bool,
        result: Result<(), ApiError>,
        requests: &mut RequestTracker,
    ) -> Option<Effect> {
        match result {
            Ok(()) => Some(Effect::LoadConfig {
                ticket: requests.issue(RequestKey::Config),
            }),
            Err(error) => {
                tracing::warn!(delete, %error, "connection submission failed");
                self.flash = Some(
                    if delete {
                        CONNECTION_NOT_DELETED
                    } else {
                        CONNECTION_NOT_SAVED
                    }
                    .to_string(),
                );
                None
            }
        }
    }

    pub fn apply_settings_submitted(
        &mut self,
        result: Result<(), ApiError>,
        requests: &mut RequestTracker,
    ) -> Option<Effect> {
        match result {
            Ok(()) => {
                self.flash = Some(SETTINGS_UPDATED.to_string());
                Some(Effect::LoadConfig {
                    ticket: requests.issue(RequestKey::Config),
                })
            }
            Err(error) => {
                tracing::warn!(%error, "settings submission failed");
                self.flash = Some(SETTINGS_NOT_SAVED.to_string());
                None
            }
        }
    }
}
