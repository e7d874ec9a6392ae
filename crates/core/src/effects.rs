use crate::api::{ApiError, ConnectionSubmission, PortholeApi, QuerySubmission, SchemaInfo};
use crate::requests::RequestTicket;
use crate::settings::{ConfigSections, GeneralSettings};

/// A server call requested by client state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadConfig {
        ticket: RequestTicket,
    },
    LoadQueryList {
        ticket: RequestTicket,
    },
    TestConnection {
        ticket: RequestTicket,
        connection: String,
    },
    FetchSchemaInfo {
        ticket: RequestTicket,
        connection: String,
    },
    FetchQueryText {
        ticket: RequestTicket,
        query_name: String,
    },
    SubmitQuery {
        ticket: RequestTicket,
        submission: QuerySubmission,
    },
    SubmitConnection {
        ticket: RequestTicket,
        submission: ConnectionSubmission,
    },
    SubmitSettings {
        ticket: RequestTicket,
        settings: GeneralSettings,
    },
}

impl Effect {
    #[must_use]
    pub fn ticket(&self) -> &RequestTicket {
        match self {
            Self::LoadConfig { ticket }
            | Self::LoadQueryList { ticket }
            | Self::TestConnection { ticket, .. }
            | Self::FetchSchemaInfo { ticket, .. }
            | Self::FetchQueryText { ticket, .. }
            | Self::SubmitQuery { ticket, .. }
            | Self::SubmitConnection { ticket, .. }
            | Self::SubmitSettings { ticket, .. } => ticket,
        }
    }

    /// Server mutations. These must reach the server even when a newer
    /// request for the same key supersedes their response.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::SubmitQuery { .. } | Self::SubmitConnection { .. } | Self::SubmitSettings { .. }
        )
    }
}

/// The outcome of an [`Effect`], fed back into client state.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Config {
        ticket: RequestTicket,
        result: Result<ConfigSections, ApiError>,
    },
    QueryList {
        ticket: RequestTicket,
        result: Result<Vec<String>, ApiError>,
    },
    TestConnection {
        ticket: RequestTicket,
        connection: String,
        result: Result<String, ApiError>,
    },
    SchemaInfo {
        ticket: RequestTicket,
        result: Result<SchemaInfo, ApiError>,
    },
    QueryText {
        ticket: RequestTicket,
        result: Result<String, ApiError>,
    },
    QuerySubmitted {
        ticket: RequestTicket,
        delete: bool,
        result: Result<Vec<String>, ApiError>,
    },
    ConnectionSubmitted {
        ticket: RequestTicket,
        delete: bool,
        result: Result<(), ApiError>,
    },
    SettingsSubmitted {
        ticket: RequestTicket,
        result: Result<(), ApiError>,
    },
}

impl Completion {
    #[must_use]
    pub fn ticket(&self) -> &RequestTicket {
        match self {
            Self::Config { ticket, .. }
            | Self::QueryList { ticket, .. }
            | Self::TestConnection { ticket, .. }
            | Self::SchemaInfo { ticket, .. }
            | Self::QueryText { ticket, .. }
            | Self::QuerySubmitted { ticket, .. }
            | Self::ConnectionSubmitted { ticket, .. }
            | Self::SettingsSubmitted { ticket, .. } => ticket,
        }
    }
}

/// Runs one effect against the server.
pub async fn perform(api: &dyn PortholeApi, effect: Effect) -> Completion {
    tracing::debug!(key = ?effect.ticket().key, id = effect.ticket().id, "performing request");
    match effect {
        Effect::LoadConfig { ticket } => Completion::Config {
            ticket,
            result: api.load_config().await,
        },
        Effect::LoadQueryList { ticket } => Completion::QueryList {
            ticket,
            result: api.list_queries().await,
        },
        Effect::TestConnection { ticket, connection } => {
            let result = api.test_connection(&connection).await;
            Completion::TestConnection {
                ticket,
                connection,
                result,
            }
        }
        Effect::FetchSchemaInfo { ticket, connection } => Completion::SchemaInfo {
            ticket,
            result: api.schema_info(&connection).await,
        },
        Effect::FetchQueryText { ticket, query_name } => Completion::QueryText {
            ticket,
            result: api.query_text(&query_name).await,
        },
        Effect::SubmitQuery { ticket, submission } => Completion::QuerySubmitted {
            ticket,
            delete: submission.delete,
            result: api.submit_query(&submission).await,
        },
        Effect::SubmitConnection { ticket, submission } => Completion::ConnectionSubmitted {
            ticket,
            delete: submission.delete,
            result: api.submit_connection(&submission).await,
        },
        Effect::SubmitSettings { ticket, settings } => Completion::SettingsSubmitted {
            ticket,
            result: api.submit_settings(&settings).await,
        },
    }
}
