use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::connections::{ConnectionConfig, ConnectionRegistry};

/// The server's config document: section name -> option name -> value.
pub type ConfigSections = BTreeMap<String, BTreeMap<String, String>>;

pub const NONE_SELECTED: &str = "None Selected";

const RESERVED_SECTIONS: [&str; 5] = ["Default", "Email", "Debug", "Logging", "Admin"];

/// Application settings outside of the stored connections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GeneralSettings {
    pub default_base_file_path: String,
    pub default_query_path: String,
    pub default_database: String,
    pub default_notification_recipient: String,
    pub email_username: String,
    pub email_password: String,
    pub email_host: String,
    pub email_disabled: String,
    pub email_signature: String,
    pub logging_server: String,
    pub logging_to_file: String,
    pub logging_file: String,
    pub logging_db: String,
    pub debug_mode: String,
    pub debug_recipients: String,
    pub admin_email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    DefaultBaseFilePath,
    DefaultQueryPath,
    DefaultDatabase,
    DefaultNotificationRecipient,
    EmailUsername,
    EmailPassword,
    EmailHost,
    EmailDisabled,
    EmailSignature,
    LoggingServer,
    LoggingToFile,
    LoggingFile,
    LoggingDb,
    DebugMode,
    DebugRecipients,
    AdminEmail,
}

impl SettingsField {
    pub const ALL: [SettingsField; 16] = [
        Self::DefaultBaseFilePath,
        Self::DefaultQueryPath,
        Self::DefaultDatabase,
        Self::DefaultNotificationRecipient,
        Self::EmailUsername,
        Self::EmailPassword,
        Self::EmailHost,
        Self::EmailDisabled,
        Self::EmailSignature,
        Self::LoggingServer,
        Self::LoggingToFile,
        Self::LoggingFile,
        Self::LoggingDb,
        Self::DebugMode,
        Self::DebugRecipients,
        Self::AdminEmail,
    ];

    /// Form field name the server expects on submission.
    #[must_use]
    pub fn form_key(self) -> &'static str {
        match self {
            Self::DefaultBaseFilePath => "default_base_file_path",
            Self::DefaultQueryPath => "default_query_path",
            Self::DefaultDatabase => "default_database",
            Self::DefaultNotificationRecipient => "default_notification_recipient",
            Self::EmailUsername => "email_username",
            Self::EmailPassword => "email_password",
            Self::EmailHost => "email_host",
            Self::EmailDisabled => "email_disabled",
            Self::EmailSignature => "email_signature",
            Self::LoggingServer => "logging_server",
            Self::LoggingToFile => "logging_to_file",
            Self::LoggingFile => "logging_file",
            Self::LoggingDb => "logging_db",
            Self::DebugMode => "debug_mode",
            Self::DebugRecipients => "debug_recipients",
            Self::AdminEmail => "admin_email",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::DefaultBaseFilePath => "Base file path",
            Self::DefaultQueryPath => "Query path",
            Self::DefaultDatabase => "Default database",
            Self::DefaultNotificationRecipient => "Notification recipient",
            Self::EmailUsername => "Email username",
            Self::EmailPassword => "Email password",
            Self::EmailHost => "Email host",
            Self::EmailDisabled => "Email disabled",
            Self::EmailSignature => "Email signature",
            Self::LoggingServer => "Logging server",
            Self::LoggingToFile => "Log to file",
            Self::LoggingFile => "Log file name",
            Self::LoggingDb => "Logging db",
            Self::DebugMode => "Debug mode",
            Self::DebugRecipients => "Debug recipients",
            Self::AdminEmail => "Admin email",
        }
    }

    fn source(self) -> (&'static str, &'static str) {
        match self {
            Self::DefaultBaseFilePath => ("Default", "base_file_path"),
            Self::DefaultQueryPath => ("Default", "query_path"),
            Self::DefaultDatabase => ("Default", "database"),
            Self::DefaultNotificationRecipient => ("Default", "notification_recipient"),
            Self::EmailUsername => ("Email", "username"),
            Self::EmailPassword => ("Email", "password"),
            Self::EmailHost => ("Email", "host"),
            Self::EmailDisabled => ("Email", "disabled"),
            Self::EmailSignature => ("Email", "signature"),
            Self::LoggingServer => ("Logging", "server"),
            Self::LoggingToFile => ("Logging", "log_to_file"),
            Self::LoggingFile => ("Logging", "logfile"),
            Self::LoggingDb => ("Logging", "db"),
            Self::DebugMode => ("Debug", "debug_mode"),
            Self::DebugRecipients => ("Debug", "debug_recipients"),
            Self::AdminEmail => ("Admin", "admin_email"),
        }
    }

    #[must_use]
    pub fn is_secret(self) -> bool {
        matches!(self, Self::EmailPassword)
    }
}

impl GeneralSettings {
    #[must_use]
    pub fn get(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::DefaultBaseFilePath => &self.default_base_file_path,
            SettingsField::DefaultQueryPath => &self.default_query_path,
            SettingsField::DefaultDatabase => &self.default_database,
            SettingsField::DefaultNotificationRecipient => &self.default_notification_recipient,
            SettingsField::EmailUsername => &self.email_username,
            SettingsField::EmailPassword => &self.email_password,
            SettingsField::EmailHost => &self.email_host,
            SettingsField::EmailDisabled => &self.email_disabled,
            SettingsField::EmailSignature => &self.email_signature,
            SettingsField::LoggingServer => &self.logging_server,
            SettingsField::LoggingToFile => &self.logging_to_file,
            SettingsField::LoggingFile => &self.logging_file,
            SettingsField::LoggingDb => &self.logging_db,
            SettingsField::DebugMode => &self.debug_mode,
            SettingsField::DebugRecipients => &self.debug_recipients,
            SettingsField::AdminEmail => &self.admin_email,
        }
    }

    pub fn get_mut(&mut self, field: SettingsField) -> &mut String {
        match field {
            SettingsField::DefaultBaseFilePath => &mut self.default_base_file_path,
            SettingsField::DefaultQueryPath => &mut self.default_query_path,
            SettingsField::DefaultDatabase => &mut self.default_database,
            SettingsField::DefaultNotificationRecipient => {
                &mut self.default_notification_recipient
            }
            SettingsField::EmailUsername => &mut self.email_username,
            SettingsField::EmailPassword => &mut self.email_password,
            SettingsField::EmailHost => &mut self.email_host,
            SettingsField::EmailDisabled => &mut self.email_disabled,
            SettingsField::EmailSignature => &mut self.email_signature,
            SettingsField::LoggingServer => &mut self.logging_server,
            SettingsField::LoggingToFile => &mut self.logging_to_file,
            SettingsField::LoggingFile => &mut self.logging_file,
            SettingsField::LoggingDb => &mut self.logging_db,
            SettingsField::DebugMode => &mut self.debug_mode,
            SettingsField::DebugRecipients => &mut self.debug_recipients,
            SettingsField::AdminEmail => &mut self.admin_email,
        }
    }

    /// Form body for a settings submission, in field order.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        SettingsField::ALL
            .iter()
            .map(|field| (field.form_key(), self.get(*field).to_string()))
            .collect()
    }
}

/// Everything the server hands over when a page loads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigSnapshot {
    pub settings: GeneralSettings,
    pub connections: ConnectionRegistry,
}

impl ConfigSnapshot {
    #[must_use]
    pub fn from_sections(sections: &ConfigSections) -> Self {
        let mut settings = GeneralSettings::default();
        for field in SettingsField::ALL {
            let (section, option) = field.source();
            if let Some(value) = sections.get(section).and_then(|options| options.get(option)) {
                value.clone_into(settings.get_mut(field));
            }
        }

        let connections = sections
            .get("Default")
            .and_then(|options| options.get("connections"))
            .map(|raw| {
                raw.split(", ")
                    .map(str::trim)
                    .filter(|name| !name.is_empty() && !RESERVED_SECTIONS.contains(name))
                    .filter_map(|name| {
                        sections
                            .get(name)
                            .map(|options| ConnectionConfig::from_section(name, options))
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Self {
            settings,
            connections: ConnectionRegistry::new(connections),
        }
    }

    /// Options for the default-database and logging-server selectors.
    #[must_use]
    pub fn database_choices(&self) -> Vec<String> {
        self.connections
            .names()
            .map(str::to_string)
            .chain(std::iter::once(NONE_SELECTED.to_string()))
            .collect()
    }
}
