//! Credential resolution for the remote collaborators.
//!
//! A credential can come from the build/deploy environment or from a value
//! the user saved through the settings flow. Resolution is an ordered
//! chain: the environment variable wins, then the OS keychain entry. The
//! storage mechanism is hidden behind `resolve()`.

use std::fmt;

use keyring::Entry;
use thiserror::Error;
use zeroize::Zeroize;

/// Keyring service name for all stored credentials.
const SERVICE_NAME: &str = "supportflow";

/// Environment variable consulted for the text-generation credential.
pub const GENERATION_KEY_ENV: &str = "SUPPORTFLOW_OPENAI_API_KEY";

/// Errors from credential resolution and storage.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential configured anywhere in the chain.
    #[error("no credential configured")]
    Missing,

    /// The OS keychain refused the operation.
    #[error("failed to access system keychain: {0}")]
    Keychain(String),
}

/// A credential value that is zeroed on drop and never printed.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue {
    value: String,
}

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    /// Get the raw value. Use sparingly and never log it.
    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED])")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Ordered credential-resolution chain for one named credential.
#[derive(Debug, Clone)]
pub struct CredentialChain {
    /// Environment variable checked first; `None` for chains that only use
    /// stored values.
    env_var: Option<&'static str>,
    /// Keychain entry name checked second.
    key_name: &'static str,
}

impl CredentialChain {
    /// Chain for the text-generation API key.
    pub fn generation() -> Self {
        Self { env_var: Some(GENERATION_KEY_ENV), key_name: "openai_api_key" }
    }

    /// Chain for the submission backend's session token. There is no
    /// build-time source for this one; it only exists once stored.
    pub fn session_token() -> Self {
        Self { env_var: None, key_name: "session_token" }
    }

    /// Resolve the credential: environment first, then the keychain.
    pub fn resolve(&self) -> Result<SecretValue, CredentialError> {
        if let Some(var) = self.env_var {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    return Ok(SecretValue::new(value));
                }
            }
        }

        let entry = self.entry()?;
        match entry.get_password() {
            Ok(value) => Ok(SecretValue::new(value)),
            Err(keyring::Error::NoEntry) => Err(CredentialError::Missing),
            Err(e) => Err(CredentialError::Keychain(e.to_string())),
        }
    }

    /// Whether any source in the chain currently yields a credential.
    pub fn is_configured(&self) -> bool {
        self.resolve().is_ok()
    }

    /// Persist a credential in the keychain (the settings-flow path).
    pub fn store(&self, value: &SecretValue) -> Result<(), CredentialError> {
        let entry = self.entry()?;
        entry.set_password(value.expose()).map_err(|e| CredentialError::Keychain(e.to_string()))
    }

    /// Remove the stored credential. Removing a credential that was never
    /// stored is not an error.
    pub fn remove(&self) -> Result<(), CredentialError> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Keychain(e.to_string())),
        }
    }

    fn entry(&self) -> Result<Entry, CredentialError> {
        Entry::new(SERVICE_NAME, self.key_name)
            .map_err(|e| CredentialError::Keychain(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_secret_value_is_redacted() {
        let secret = SecretValue::new("sk-very-secret");
        assert_eq!(format!("{secret:?}"), "SecretValue([REDACTED])");
        assert_eq!(secret.to_string(), "[REDACTED]");
        assert_eq!(secret.expose(), "sk-very-secret");
    }

    #[test]
    #[serial(generation_env)]
    fn test_env_var_takes_precedence() {
        let original = std::env::var(GENERATION_KEY_ENV).ok();
        std::env::set_var(GENERATION_KEY_ENV, "sk-from-env");

        let chain = CredentialChain::generation();
        let resolved = chain.resolve().unwrap();
        assert_eq!(resolved.expose(), "sk-from-env");

        match original {
            Some(val) => std::env::set_var(GENERATION_KEY_ENV, val),
            None => std::env::remove_var(GENERATION_KEY_ENV),
        }
    }

    #[test]
    #[serial(generation_env)]
    fn test_empty_env_var_does_not_satisfy_the_chain() {
        let original = std::env::var(GENERATION_KEY_ENV).ok();
        std::env::set_var(GENERATION_KEY_ENV, "");

        // With an empty env value the chain falls through to the keychain;
        // it must not produce an empty credential.
        let chain = CredentialChain::generation();
        if let Ok(resolved) = chain.resolve() {
            assert!(!resolved.is_empty());
        }

        match original {
            Some(val) => std::env::set_var(GENERATION_KEY_ENV, val),
            None => std::env::remove_var(GENERATION_KEY_ENV),
        }
    }
}
