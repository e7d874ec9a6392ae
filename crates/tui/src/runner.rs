use std::collections::HashMap;
use std::sync::Arc;

use porthole_core::api::PortholeApi;
use porthole_core::effects::{perform, Completion, Effect};
use porthole_core::requests::{RequestKey, RequestTracker};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Runs effects as tokio tasks.
///
/// Reads keep one live task per request key and a newer read aborts the
/// older one. Writes always run to completion. Completions are sent back over
/// the channel; the UI loop feeds them to client state, which discards any
/// that arrive for a superseded ticket.
pub(crate) struct RequestRunner {
    runtime: Handle,
    api: Arc<dyn PortholeApi>,
    sender: UnboundedSender<Completion>,
    reads: HashMap<RequestKey, JoinHandle<()>>,
    writes: Vec<JoinHandle<()>>,
}

impl RequestRunner {
    pub(crate) fn new(
        runtime: Handle,
        api: Arc<dyn PortholeApi>,
        sender: UnboundedSender<Completion>,
    ) -> Self {
        Self {
            runtime,
            api,
            sender,
            reads: HashMap::new(),
            writes: Vec::new(),
        }
    }

    pub(crate) fn spawn(&mut self, effect: Effect) {
        let key = effect.ticket().key.clone();
        let is_write = effect.is_write();
        if let Some(previous) = self.reads.remove(&key) {
            if !previous.is_finished() {
                tracing::debug!(?key, "aborting superseded request");
                previous.abort();
            }
        }

        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        let task = self.runtime.spawn(async move {
            let completion = perform(api.as_ref(), effect).await;
            if sender.send(completion).is_err() {
                tracing::debug!("completion dropped, ui loop has exited");
            }
        });
        if is_write {
            self.writes.push(task);
        } else {
            self.reads.insert(key, task);
        }
    }

    pub(crate) fn spawn_all(&mut self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            self.spawn(effect);
        }
    }

    /// Forgets finished tasks and aborts reads whose key was invalidated.
    pub(crate) fn prune(&mut self, requests: &RequestTracker) {
        self.writes.retain(|task| !task.is_finished());
        self.reads.retain(|key, task| {
            if task.is_finished() {
                return false;
            }
            if requests.is_pending(key) {
                return true;
            }
            tracing::debug!(?key, "aborting invalidated request");
            task.abort();
            false
        });
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.reads.len() + self.writes.len()
    }
}

impl Drop for RequestRunner {
    fn drop(&mut self) {
        for task in self.reads.values().chain(&self.writes) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use porthole_core::api::{
        ApiError, ConnectionSubmission, PortholeApi, QuerySubmission, SchemaInfo,
    };
    use porthole_core::effects::Effect;
    use porthole_core::requests::{RequestKey, RequestTracker};
    use porthole_core::settings::{ConfigSections, GeneralSettings};
    use tokio::runtime::Handle;
    use tokio::sync::mpsc::unbounded_channel;
    use tokio::time::{sleep, timeout};

    use super::RequestRunner;

    /// Answers schema requests for `slow` only after a long delay and records
    /// every saved query name.
    #[derive(Default)]
    struct DelayedApi {
        saved_queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PortholeApi for DelayedApi {
        async fn load_config(&self) -> Result<ConfigSections, ApiError> {
            Ok(ConfigSections::new())
        }

        async fn list_queries(&self) -> Result<Vec<String>, ApiError> {
            Ok(Vec::new())
        }

        async fn test_connection(&self, _connection: &str) -> Result<String, ApiError> {
            Ok("Connected Successfully".to_string())
        }

        async fn schema_info(&self, connection: &str) -> Result<SchemaInfo, ApiError> {
            if connection == "slow" {
                sleep(Duration::from_secs(30)).await;
            }
            Ok(SchemaInfo::Rows(Vec::new()))
        }

        async fn query_text(&self, _query_name: &str) -> Result<String, ApiError> {
            Ok(String::new())
        }

        async fn submit_query(
            &self,
            submission: &QuerySubmission,
        ) -> Result<Vec<String>, ApiError> {
            sleep(Duration::from_millis(50)).await;
            let mut saved = self.saved_queries.lock().expect("saved queries lock");
            saved.push(submission.query_name.clone());
            Ok(saved.clone())
        }

        async fn submit_connection(
            &self,
            _submission: &ConnectionSubmission,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn submit_settings(&self, _settings: &GeneralSettings) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn schema_effect(tracker: &mut RequestTracker, connection: &str) -> Effect {
        Effect::FetchSchemaInfo {
            ticket: tracker.issue(RequestKey::SchemaInfo),
            connection: connection.to_string(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn newer_request_aborts_the_older_task() {
        let (sender, mut receiver) = unbounded_channel();
        let api = Arc::new(DelayedApi::default());
        let mut runner = RequestRunner::new(Handle::current(), api, sender);
        let mut tracker = RequestTracker::new();

        runner.spawn(schema_effect(&mut tracker, "slow"));
        let fast = schema_effect(&mut tracker, "fast");
        let fast_ticket = fast.ticket().clone();
        runner.spawn(fast);
        assert_eq!(runner.in_flight(), 1);

        let completion = timeout(Duration::from_secs(5), receiver.recv())
            .await
            .expect("completion should arrive")
            .expect("channel should stay open");
        assert_eq!(completion.ticket(), &fast_ticket);

        let nothing_else = timeout(Duration::from_millis(200), receiver.recv()).await;
        assert!(nothing_else.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn prune_aborts_invalidated_requests() {
        let (sender, _receiver) = unbounded_channel();
        let api = Arc::new(DelayedApi::default());
        let mut runner = RequestRunner::new(Handle::current(), api, sender);
        let mut tracker = RequestTracker::new();

        runner.spawn(schema_effect(&mut tracker, "slow"));
        runner.prune(&tracker);
        assert_eq!(runner.in_flight(), 1);

        tracker.invalidate(&RequestKey::SchemaInfo);
        runner.prune(&tracker);
        assert_eq!(runner.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn back_to_back_saves_both_reach_the_server() {
        let (sender, mut receiver) = unbounded_channel();
        let api = Arc::new(DelayedApi::default());
        let mut runner = RequestRunner::new(Handle::current(), api.clone(), sender);
        let mut tracker = RequestTracker::new();

        for name in ["alpha", "beta"] {
            runner.spawn(Effect::SubmitQuery {
                ticket: tracker.issue(RequestKey::QueryList),
                submission: QuerySubmission::save(name, "SELECT 1"),
            });
        }
        assert_eq!(runner.in_flight(), 2);

        tracker.invalidate(&RequestKey::QueryList);
        runner.prune(&tracker);
        assert_eq!(runner.in_flight(), 2);

        for _ in 0..2 {
            timeout(Duration::from_secs(5), receiver.recv())
                .await
                .expect("completion should arrive")
                .expect("channel should stay open");
        }

        let mut saved = api.saved_queries.lock().expect("saved queries lock").clone();
        saved.sort();
        assert_eq!(saved, vec!["alpha".to_string(), "beta".to_string()]);
    }
}
