use std::collections::HashMap;

/// Logical action a network request belongs to. A newer request for the same
/// key supersedes every older one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestKey {
    Config,
    QueryList,
    QueryText,
    SchemaInfo,
    TestConnection(String),
    ConnectionSubmit,
    SettingsSubmit,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub key: RequestKey,
    pub id: u64,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    next_id: u64,
    latest: HashMap<RequestKey, u64>,
}

impl RequestTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, key: RequestKey) -> RequestTicket {
        self.next_id = self.next_id.saturating_add(1);
        self.latest.insert(key.clone(), self.next_id);
        RequestTicket {
            key,
            id: self.next_id,
        }
    }

    /// Drops every outstanding request for `key`.
    pub fn invalidate(&mut self, key: &RequestKey) {
        self.latest.remove(key);
    }

    #[must_use]
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest.get(&ticket.key) == Some(&ticket.id)
    }

    /// Accepts the completion for `ticket` if it is still the latest for its
    /// key, retiring it so a duplicate delivery is rejected.
    pub fn complete(&mut self, ticket: &RequestTicket) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(key = ?ticket.key, id = ticket.id, "discarding stale completion");
            return false;
        }
        self.latest.remove(&ticket.key);
        true
    }

    #[must_use]
    pub fn is_pending(&self, key: &RequestKey) -> bool {
        self.latest.contains_key(key)
    }
}
