use serde::{Deserialize, Serialize};

/// GameStream HTTP port used when a host description does not name one.
pub const DEFAULT_HTTP_PORT: u16 = 47989;

/// A remote streaming server and the applications it exports.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Host {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    pub address: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default)]
    pub apps: Vec<Application>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Application {
    /// Host assigned application id. Also the cache key for the box art.
    pub id: String,
    #[serde(default)]
    pub name: String,
}

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

impl Host {
    pub fn new(uuid: &str, address: &str, apps: Vec<Application>) -> Self {
        Self {
            uuid: uuid.to_string(),
            name: String::new(),
            address: address.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            apps,
        }
    }
}

impl Application {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}
