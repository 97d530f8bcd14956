//! Database and listener configuration.
//!
//! Connection parameters come from a key-value properties file
//! (`config/db.properties` by default):
//!
//! ```text
//! db.prefix=mongodb+srv://
//! db.user=alice
//! db.pwd=s3cr@t
//! db.dbUrl=@cluster0.example.net/
//! db.dbName=school
//! db.params=?retryWrites=true&w=majority
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config/db.properties";

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Parameters of the single database connection.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub prefix: String,
    pub user: String,
    pub password: String,
    pub db_url: String,
    pub db_name: String,
    pub params: String,
}

impl DbConfig {
    /// Load the connection parameters from a properties file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let read_err = |source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        };
        let pairs = dotenvy::from_path_iter(path)
            .map_err(read_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)?;
        Self::from_pairs(pairs)
    }

    /// Build from already-parsed `key=value` pairs. Later keys win.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut map: HashMap<String, String> = pairs.into_iter().collect();
        let mut take = |key: &'static str| map.remove(key).ok_or(ConfigError::MissingKey(key));

        Ok(Self {
            prefix: take("db.prefix")?,
            user: take("db.user")?,
            password: take("db.pwd")?,
            db_url: take("db.dbUrl")?,
            db_name: take("db.dbName")?,
            params: take("db.params").unwrap_or_default(),
        })
    }

    /// `prefix + user + ":" + password + dbUrl + params`, with the
    /// credentials percent-encoded.
    pub fn connection_uri(&self) -> String {
        format!(
            "{}{}:{}{}{}",
            self.prefix,
            utf8_percent_encode(&self.user, URI_COMPONENT),
            utf8_percent_encode(&self.password, URI_COMPONENT),
            self.db_url,
            self.params,
        )
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("prefix", &self.prefix)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("db_url", &self.db_url)
            .field("db_name", &self.db_name)
            .field("params", &self.params)
            .finish()
    }
}

/// Where the HTTP listener binds and which directory backs `/Images`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "images".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
