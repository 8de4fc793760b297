//! Elasticsearch credentials held in memory
//!
//! API keys and passwords are wrapped in `secrecy::Secret` so they are zeroed
//! on drop and never show up in `Debug` output or log lines.
//!
//! ```rust
//! use mediquery::config::{SecretString, SecretValue};
//! use secrecy::{ExposeSecret, Secret};
//!
//! let api_key: SecretString = Secret::new(SecretValue::from("bWVkaXF1ZXJ5".to_string()));
//! assert_eq!(api_key.expose_secret().as_ref(), "bWVkaXF1ZXJ5");
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
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

impl From<SecretValue> for String {
    fn from(mut s: SecretValue) -> Self {
        std::mem::take(&mut s.0)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
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

/// A credential string that is zeroed on drop and redacted in `Debug`
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string, e.g. a value read from `MEDIQUERY_ELASTICSEARCH_PASSWORD`
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("es-api-key".to_string());
        assert_eq!(secret.expose_secret(), "es-api-key");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("elastic-superuser-pw".to_string());
        let debug_output = format!("{secret:?}");

        assert!(!debug_output.contains("elastic-superuser-pw"));
        assert!(debug_output.contains("REDACTED") || debug_output.contains("Secret"));
    }

    #[test]
    fn test_secret_serde() {
        use serde::{Deserialize, Serialize};

        #[derive(Serialize, Deserialize)]
        struct Credentials {
            api_key: SecretString,
        }

        let config = Credentials {
            api_key: secret_string("test123".to_string()),
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("test123"));

        let deserialized: Credentials = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.api_key.expose_secret(), "test123");
    }
}
