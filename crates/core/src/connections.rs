use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RdbmsKind {
    #[default]
    MySql,
    Sqlite,
    Other(String),
}

impl RdbmsKind {
    pub const CHOICES: [RdbmsKind; 2] = [RdbmsKind::MySql, RdbmsKind::Sqlite];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::MySql => "MySQL",
            Self::Sqlite => "SQLite",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "MySQL" => Self::MySql,
            "SQLite" => Self::Sqlite,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RdbmsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RdbmsKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RdbmsKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// A stored connection as the client sees it. Passwords never reach the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub name: String,
    #[serde(default)]
    pub rdbms: RdbmsKind,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub schema: String,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, rdbms: RdbmsKind) -> Self {
        Self {
            name: name.into(),
            rdbms,
            host: String::new(),
            port: String::new(),
            user: String::new(),
            schema: String::new(),
        }
    }

    /// Builds a connection from one config section. Unknown options, the
    /// password included, are ignored.
    #[must_use]
    pub fn from_section(name: &str, options: &BTreeMap<String, String>) -> Self {
        let option = |key: &str| options.get(key).cloned().unwrap_or_default();
        Self {
            name: name.to_string(),
            rdbms: options
                .get("rdbms")
                .map(|raw| RdbmsKind::parse(raw))
                .unwrap_or_default(),
            host: option("host"),
            port: option("port"),
            user: option("user"),
            schema: option("schema"),
        }
    }
}

/// Connection name -> config, in the order the server lists them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionRegistry {
    connections: Vec<ConnectionConfig>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new(connections: Vec<ConnectionConfig>) -> Self {
        let mut registry = Self::default();
        for connection in connections {
            registry.insert(connection);
        }
        registry
    }

    fn insert(&mut self, connection: ConnectionConfig) {
        if let Some(existing) = self
            .connections
            .iter_mut()
            .find(|existing| existing.name == connection.name)
        {
            *existing = connection;
        } else {
            self.connections.push(connection);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections
            .iter()
            .find(|connection| connection.name == name)
    }

    #[must_use]
    pub fn connections(&self) -> &[ConnectionConfig] {
        &self.connections
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections
            .iter()
            .map(|connection| connection.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// Values of the connection entry form, password included.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionDraft {
    pub name: String,
    pub rdbms: RdbmsKind,
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub schema: String,
}

impl ConnectionDraft {
    /// Prefills every field except the password from a stored connection.
    #[must_use]
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            name: config.name.clone(),
            rdbms: config.rdbms.clone(),
            host: config.host.clone(),
            port: config.port.clone(),
            user: config.user.clone(),
            password: String::new(),
            schema: config.schema.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{ConnectionConfig, ConnectionDraft, ConnectionRegistry, RdbmsKind};

    fn section(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn section_parsing_drops_password() {
        let options = section(&[
            ("rdbms", "MySQL"),
            ("host", "db.internal"),
            ("port", "3306"),
            ("user", "report"),
            ("password", "hunter2"),
            ("schema", "sales"),
        ]);

        let connection = ConnectionConfig::from_section("sales", &options);
        assert_eq!(connection.rdbms, RdbmsKind::MySql);
        assert_eq!(connection.host, "db.internal");
        assert_eq!(connection.schema, "sales");

        let rendered = serde_json::to_string(&connection).expect("serialize connection");
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn unknown_rdbms_round_trips_verbatim() {
        let kind = RdbmsKind::parse("Postgres");
        assert_eq!(kind, RdbmsKind::Other("Postgres".to_string()));
        assert_eq!(kind.as_str(), "Postgres");
        assert_eq!(RdbmsKind::parse("SQLite"), RdbmsKind::Sqlite);
    }

    #[test]
    fn registry_keeps_order_and_replaces_duplicates() {
        let mut replacement = ConnectionConfig::new("a", RdbmsKind::Sqlite);
        replacement.host = "new".to_string();
        let registry = ConnectionRegistry::new(vec![
            ConnectionConfig::new("b", RdbmsKind::MySql),
            ConnectionConfig::new("a", RdbmsKind::MySql),
            replacement,
        ]);

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(registry.get("a").map(|c| c.host.as_str()), Some("new"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn draft_from_config_leaves_password_blank() {
        let mut config = ConnectionConfig::new("sales", RdbmsKind::MySql);
        config.port = "3306".to_string();

        let draft = ConnectionDraft::from_config(&config);
        assert_eq!(draft.name, "sales");
        assert_eq!(draft.port, "3306");
        assert!(draft.password.is_empty());
    }
}
