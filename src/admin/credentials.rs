//! Admin credential checks.

use subtle::ConstantTimeEq;

use crate::config::AdminConfig;
use crate::security::password::verify_password_digest;

/// An authenticated administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub id: String,
    pub username: String,
}

/// Checks a username/password pair. The account store behind it is not this
/// crate's concern.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> Option<AdminIdentity>;
}

/// A single admin account from configuration.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    username: String,
    salt: String,
    digest: String,
}

impl StaticCredentials {
    pub fn from_config(config: &AdminConfig) -> Self {
        Self {
            username: config.username.clone(),
            salt: config.password_salt.clone(),
            digest: config.password_sha256.clone(),
        }
    }

    /// False when no password digest is configured; every login then fails.
    pub fn is_enabled(&self) -> bool {
        !self.digest.is_empty()
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> Option<AdminIdentity> {
        if !self.is_enabled() {
            return None;
        }
        // Evaluate both halves so a wrong username costs the same as a wrong password.
        let user_ok: bool = self.username.as_bytes().ct_eq(username.as_bytes()).into();
        let password_ok = verify_password_digest(&self.salt, password, &self.digest);
        (user_ok && password_ok).then(|| AdminIdentity {
            id: "1".to_string(),
            username: self.username.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::password::password_digest;

    fn config(password: &str) -> AdminConfig {
        AdminConfig {
            username: "editor".into(),
            password_salt: "s4lt".into(),
            password_sha256: password_digest("s4lt", password),
        }
    }

    #[test]
    fn test_static_credentials() {
        let creds = StaticCredentials::from_config(&config("Correct1"));
        assert!(creds.is_enabled());
        let identity = creds.verify("editor", "Correct1").unwrap();
        assert_eq!(identity.username, "editor");
        assert!(creds.verify("editor", "wrong").is_none());
        assert!(creds.verify("admin", "Correct1").is_none());
    }

    #[test]
    fn test_disabled_without_digest() {
        let creds = StaticCredentials::from_config(&AdminConfig::default());
        assert!(!creds.is_enabled());
        assert!(creds.verify("admin", "").is_none());
    }
}
