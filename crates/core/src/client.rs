use crate::effects::{Completion, Effect};
use crate::requests::{RequestKey, RequestTracker};
use crate::settings::ConfigSnapshot;
use crate::settings_panel::{SettingsPanel, SETTINGS_NOT_LOADED};
use crate::workbench::QueryWorkbench;

/// All client state, owned by the UI loop.
///
/// Handlers on the panels return [`Effect`]s; their [`Completion`]s come back
/// through [`PortholeClient::apply`], which drops any that a newer request
/// has superseded.
#[derive(Debug, Default)]
pub struct PortholeClient {
    pub requests: RequestTracker,
    pub settings: SettingsPanel,
    pub workbench: QueryWorkbench,
}

impl PortholeClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Page-load requests: config snapshot and saved query names.
    pub fn start(&mut self) -> Vec<Effect> {
        vec![
            Effect::LoadConfig {
                ticket: self.requests.issue(RequestKey::Config),
            },
            Effect::LoadQueryList {
                ticket: self.requests.issue(RequestKey::QueryList),
            },
        ]
    }

    pub fn apply(&mut self, completion: Completion) -> Vec<Effect> {
        if !self.requests.complete(completion.ticket()) {
            return Vec::new();
        }

        let follow_up = match completion {
            Completion::Config { result, .. } => {
                match result {
                    Ok(sections) => self.load_snapshot(ConfigSnapshot::from_sections(&sections)),
                    Err(error) => {
                        tracing::warn!(%error, "config request failed");
                        self.settings.set_flash(SETTINGS_NOT_LOADED);
                    }
                }
                None
            }
            Completion::QueryList { result, .. } => {
                match result {
                    Ok(names) => self.workbench.set_query_names(names),
                    Err(error) => tracing::warn!(%error, "query list request failed"),
                }
                None
            }
            Completion::TestConnection {
                connection, result, ..
            } => {
                self.settings.apply_test_result(connection, result);
                None
            }
            Completion::SchemaInfo { result, .. } => {
                self.workbench.apply_schema_info(result);
                None
            }
            Completion::QueryText { result, .. } => {
                self.workbench.apply_query_text(result);
                None
            }
            Completion::QuerySubmitted { delete, result, .. } => {
                self.workbench.apply_query_submitted(delete, result);
                None
            }
            Completion::ConnectionSubmitted { delete, result, .. } => {
                self.settings
                    .apply_connection_submitted(delete, result, &mut self.requests)
            }
            Completion::SettingsSubmitted { result, .. } => self
                .settings
                .apply_settings_submitted(result, &mut self.requests),
        };

        follow_up.into_iter().collect()
    }

    fn load_snapshot(&mut self, snapshot: ConfigSnapshot) {
        let names = snapshot
            .connections
            .names()
            .map(str::to_string)
            .collect::<Vec<_>>();
        self.workbench.set_connections(names, &mut self.requests);
        self.settings.load_snapshot(snapshot);
    }
}
