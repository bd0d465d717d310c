//! Admin password gate.
//!
//! Visitors may chat freely; editing the knowledge base requires the admin
//! password. The expected password is read from the environment variable
//! named by `[admin].password_env`. When that variable is unset or empty,
//! admin access is refused outright rather than left open.
//!
//! Passwords are compared as SHA-256 digests with a constant-time equality
//! check, so response timing does not reveal how much of a guess matched.

use sha2::{Digest, Sha256};

use crate::config::AdminConfig;

/// Outcome of an admin password check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAccess {
    Granted,
    Denied,
    /// No admin password is configured on this server.
    NotConfigured,
}

/// Check `supplied` against the configured admin password.
pub fn check_admin(config: &AdminConfig, supplied: Option<&str>) -> AdminAccess {
    check_password(config.password().as_deref(), supplied)
}

/// Check `supplied` against `expected`.
pub fn check_password(expected: Option<&str>, supplied: Option<&str>) -> AdminAccess {
    let expected = match expected {
        Some(p) if !p.is_empty() => p,
        _ => return AdminAccess::NotConfigured,
    };

    match supplied {
        Some(s) if digest_eq(expected, s) => AdminAccess::Granted,
        _ => AdminAccess::Denied,
    }
}

fn digest_eq(a: &str, b: &str) -> bool {
    let da = Sha256::digest(a.as_bytes());
    let db = Sha256::digest(b.as_bytes());
    da.iter().zip(db.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_password_granted() {
        assert_eq!(
            check_password(Some("s3cret"), Some("s3cret")),
            AdminAccess::Granted
        );
    }

    #[test]
    fn test_wrong_or_missing_password_denied() {
        assert_eq!(check_password(Some("s3cret"), Some("s3cre")), AdminAccess::Denied);
        assert_eq!(check_password(Some("s3cret"), Some("")), AdminAccess::Denied);
        assert_eq!(check_password(Some("s3cret"), None), AdminAccess::Denied);
    }

    #[test]
    fn test_unconfigured_password_refuses_everything() {
        assert_eq!(check_password(None, Some("")), AdminAccess::NotConfigured);
        assert_eq!(check_password(Some(""), Some("")), AdminAccess::NotConfigured);
    }

    #[test]
    fn test_reads_password_from_named_env_var() {
        let config = AdminConfig {
            password_env: "BRANDCHAT_TEST_ADMIN_PASSWORD_ADMIN_RS".to_string(),
        };
        std::env::set_var(&config.password_env, "from-env");
        assert_eq!(check_admin(&config, Some("from-env")), AdminAccess::Granted);
        assert_eq!(check_admin(&config, Some("nope")), AdminAccess::Denied);
        std::env::remove_var(&config.password_env);
        assert_eq!(check_admin(&config, Some("from-env")), AdminAccess::NotConfigured);
    }
}
