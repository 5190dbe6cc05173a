//! Admin credential check.
//!
//! There is no ambient authentication state: every mutating operation takes
//! an [`Authorized`] proof, and the only way to obtain one is to present a
//! per-request credential to [`AdminSecret::authorize`].

use crate::error::ServerError;

/// The configured admin password.
#[derive(Clone, Default)]
pub struct AdminSecret {
    password: Option<String>,
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSecret")
            .field("configured", &self.password.is_some())
            .finish()
    }
}

/// Proof that the caller presented the admin credential for this request.
#[derive(Debug)]
pub struct Authorized {
    _private: (),
}

impl AdminSecret {
    pub fn new(password: Option<String>) -> Self {
        Self {
            password: password.filter(|p| !p.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.password.is_some()
    }

    pub fn authorize(&self, credential: Option<&str>) -> Result<Authorized, ServerError> {
        let expected = self
            .password
            .as_deref()
            .ok_or_else(|| ServerError::Unauthorized("Admin password is not configured".to_string()))?;
        let presented = credential
            .ok_or_else(|| ServerError::Unauthorized("Missing admin credential".to_string()))?;

        if constant_time_eq(expected.as_bytes(), presented.as_bytes()) {
            Ok(Authorized { _private: () })
        } else {
            Err(ServerError::Unauthorized("Invalid password".to_string()))
        }
    }

    /// Local tooling (the CLI) operating directly on the data files.
    pub fn local_operator() -> Authorized {
        Authorized { _private: () }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_accepts_matching_password() {
        let secret = AdminSecret::new(Some("hunter2".to_string()));
        assert!(secret.authorize(Some("hunter2")).is_ok());
    }

    #[test]
    fn test_authorize_rejects_wrong_or_missing_credential() {
        let secret = AdminSecret::new(Some("hunter2".to_string()));
        assert!(matches!(
            secret.authorize(Some("hunter3")),
            Err(ServerError::Unauthorized(_))
        ));
        assert!(matches!(secret.authorize(None), Err(ServerError::Unauthorized(_))));
    }

    #[test]
    fn test_unconfigured_secret_rejects_everything() {
        let secret = AdminSecret::new(Some(String::new()));
        assert!(!secret.is_configured());
        assert!(secret.authorize(Some("")).is_err());
    }
}
