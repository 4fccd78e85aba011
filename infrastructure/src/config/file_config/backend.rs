//! Backend connection settings (`[backend]` section)

use serde::{Deserialize, Deserializer, Serialize};

/// Default backend address for a local deployment
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Raw backend configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Root URL of the chat backend
    pub base_url: String,
    /// Signed-in user whose sessions are listed
    #[serde(deserialize_with = "lenient_string")]
    pub user_id: String,
    /// Value of the session cookie (usually set through the environment)
    #[serde(deserialize_with = "lenient_optional_string")]
    pub session_cookie: Option<String>,
    /// Name of the session cookie
    pub cookie_name: String,
    /// TCP connect timeout; the stream body itself has no timeout
    pub connect_timeout_seconds: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: String::new(),
            session_cookie: None,
            cookie_name: "session".to_string(),
            connect_timeout_seconds: 10,
        }
    }
}

/// Numeric ids arrive as integers from TOML and from the environment.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl From<Lenient> for String {
    fn from(value: Lenient) -> Self {
        match value {
            Lenient::Text(s) => s,
            Lenient::Integer(n) => n.to_string(),
            Lenient::Float(n) => n.to_string(),
            Lenient::Flag(b) => b.to_string(),
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Lenient::deserialize(deserializer).map(String::from)
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Lenient>::deserialize(deserializer)?.map(String::from))
}
