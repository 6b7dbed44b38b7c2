//! Credential handling for access tokens and connection strings
//!
//! Secrets are wrapped in [`secrecy::Secret`] so they are zeroized on drop and
//! redacted from `Debug` output. Call `expose_secret()` only at the point the
//! value is put on the wire.
//!
//! ```rust
//! use catalog_sync::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("shpat_example".to_string());
//! assert_eq!(token.expose_secret().as_ref(), "shpat_example");
//! assert!(!format!("{token:?}").contains("shpat_example"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String payload that can live inside a [`Secret`]
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Secret string used for the access token and the database connection string
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Strips the userinfo part of a connection URL so it can be logged
///
/// `postgresql://user:pw@db:5432/catalog` becomes `postgresql://***@db:5432/catalog`.
pub fn redact_connection_string(conn: &str) -> String {
    match (conn.find("://"), conn.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &conn[..scheme_end], &conn[at..])
        }
        _ => conn.to_string(),
    }
}
