//! API Credential Rotation
//!
//! Ordered list of API keys with a forward-only cursor. A key is rotated past
//! once it reports its quota spent; it is never revisited within the run.

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::constants::llm as llm_constants;
use crate::types::{QuotaDocError, Result};

/// Opaque API key. Never exposed in logs or debug output.
#[derive(Clone)]
pub struct Credential {
    secret: SecretString,
    /// Position in the configured list, for log lines
    index: usize,
}

impl Credential {
    pub fn new(key: impl Into<String>, index: usize) -> Self {
        Self {
            secret: SecretString::from(key.into()),
            index,
        }
    }

    /// Raw key, for the request header only
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    /// Short label safe to log (`key#2`)
    pub fn label(&self) -> String {
        format!("key#{}", self.index + 1)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("index", &self.index)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Terminal condition: every credential has been rotated past
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted {
    pub count: usize,
}

impl std::fmt::Display for Exhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all {} credentials exhausted", self.count)
    }
}

impl std::error::Error for Exhausted {}

/// Forward-only credential cursor
#[derive(Debug)]
pub struct CredentialRotator {
    credentials: Vec<Credential>,
    index: usize,
}

impl CredentialRotator {
    /// Build from raw keys. Blank entries are dropped; an empty list is a
    /// fatal startup error.
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let credentials: Vec<Credential> = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .enumerate()
            .map(|(i, k)| Credential::new(k, i))
            .collect();

        if credentials.is_empty() {
            return Err(QuotaDocError::NoCredentials);
        }

        Ok(Self {
            credentials,
            index: 0,
        })
    }

    /// Resolve keys from config, then `QUOTADOC_API_KEYS` (comma separated),
    /// then `GEMINI_API_KEY`.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let keys = if !config.api_keys.is_empty() {
            config.api_keys.clone()
        } else if let Ok(list) = std::env::var(llm_constants::KEYS_ENV) {
            list.split(',').map(str::to_string).collect()
        } else {
            std::env::var(llm_constants::KEY_ENV)
                .map(|k| vec![k])
                .unwrap_or_default()
        };

        let rotator = Self::new(keys)?;
        info!("Loaded {} API credential(s)", rotator.len());
        Ok(rotator)
    }

    /// Active credential
    pub fn current(&self) -> std::result::Result<&Credential, Exhausted> {
        self.credentials.get(self.index).ok_or(Exhausted {
            count: self.credentials.len(),
        })
    }

    /// Advance to the next credential
    pub fn rotate(&mut self) -> std::result::Result<&Credential, Exhausted> {
        if self.index < self.credentials.len() {
            self.index += 1;
        }
        match self.credentials.get(self.index) {
            Some(next) => {
                info!(
                    "Rotated to {} ({} of {})",
                    next.label(),
                    self.index + 1,
                    self.credentials.len()
                );
                Ok(next)
            }
            None => {
                warn!("All {} credentials exhausted", self.credentials.len());
                Err(Exhausted {
                    count: self.credentials.len(),
                })
            }
        }
    }

    /// 0-based index of the active credential (== len() once exhausted)
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.credentials.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_keys_is_fatal() {
        let err = CredentialRotator::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, QuotaDocError::NoCredentials));

        let blank = CredentialRotator::new(["  ", ""]).unwrap_err();
        assert!(matches!(blank, QuotaDocError::NoCredentials));
    }

    #[test]
    fn test_rotation_is_forward_only() {
        let mut rotator = CredentialRotator::new(["k1", "k2"]).unwrap();
        assert_eq!(rotator.current().unwrap().expose(), "k1");
        assert_eq!(rotator.index(), 0);

        assert_eq!(rotator.rotate().unwrap().expose(), "k2");
        assert_eq!(rotator.index(), 1);

        assert_eq!(rotator.rotate().unwrap_err(), Exhausted { count: 2 });
        assert!(rotator.is_exhausted());
        assert!(rotator.current().is_err());

        // Further rotation stays exhausted and never wraps around
        assert!(rotator.rotate().is_err());
        assert_eq!(rotator.index(), 2);
    }

    #[test]
    fn test_credential_debug_redacts_secret() {
        let rotator = CredentialRotator::new(["super-secret"]).unwrap();
        let debug = format!("{:?}", rotator);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
        assert_eq!(rotator.current().unwrap().label(), "key#1");
    }

    #[test]
    fn test_from_config_prefers_config_keys() {
        let config = LlmConfig {
            api_keys: vec!["a".to_string(), "b".to_string()],
            ..LlmConfig::default()
        };
        let rotator = CredentialRotator::from_config(&config).unwrap();
        assert_eq!(rotator.len(), 2);
    }
}
