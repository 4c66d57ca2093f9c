//! Login and the session flag.
//!
//! Authentication is a swappable collaborator: anything implementing
//! [`Authenticator`] can decide whether credentials are accepted. The result
//! of a login is a flag file kept next to (not inside) the record store;
//! every data command checks it and `logout` clears it.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Decides whether a set of credentials may log in.
pub trait Authenticator: Send + Sync {
    /// Check the credentials.
    fn authenticate(&self, email: &str, password: &str) -> bool;
}

/// Accepts exactly one configured email/password pair.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    email: String,
    password: String,
}

impl StaticCredentials {
    /// Create an authenticator for one pair of credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl From<&AuthConfig> for StaticCredentials {
    fn from(config: &AuthConfig) -> Self {
        Self::new(&config.email, &config.password)
    }
}

impl Authenticator for StaticCredentials {
    fn authenticate(&self, email: &str, password: &str) -> bool {
        // Emails are compared case-insensitively, passwords exactly.
        email.trim().eq_ignore_ascii_case(&self.email) && password == self.password
    }
}

/// The "is authenticated" flag, persisted as a small file.
#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
}

impl Session {
    /// Use the flag file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the flag file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a login is currently recorded.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Email of the logged-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let email = content.trim();
        (!email.is_empty()).then(|| email.to_string())
    }

    /// Fail with [`Error::NotAuthenticated`] unless a login is recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is logged in.
    pub fn require(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    /// Check the credentials and record the login.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the flag cannot be written.
    pub fn login(&self, auth: &dyn Authenticator, email: &str, password: &str) -> Result<()> {
        if !auth.authenticate(email, password) {
            debug!("Rejected login for {}", email);
            return Err(Error::InvalidCredentials);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        std::fs::write(&self.path, email.trim())?;
        info!("Logged in as {}", email.trim());
        Ok(())
    }

    /// Clear the login. Logging out twice is fine.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag exists but cannot be removed.
    pub fn logout(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_session(name: &str) -> Session {
        let path = std::env::temp_dir().join(format!(
            "cabinsurvey_session_{}_{}/session",
            name,
            std::process::id()
        ));
        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
        Session::new(path)
    }

    fn cleanup(session: &Session) {
        if let Some(parent) = session.path().parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    fn default_auth() -> StaticCredentials {
        StaticCredentials::from(&AuthConfig::default())
    }

    #[test]
    fn test_static_credentials() {
        let auth = default_auth();
        assert!(auth.authenticate("user@fitsair.com", "password123"));
        assert!(auth.authenticate(" USER@fitsair.com ", "password123"));
        assert!(!auth.authenticate("user@fitsair.com", "Password123"));
        assert!(!auth.authenticate("other@fitsair.com", "password123"));
    }

    #[test]
    fn test_login_and_logout() {
        let session = temp_session("login");
        assert!(!session.is_authenticated());
        assert!(session.require().unwrap_err().is_not_authenticated());

        session
            .login(&default_auth(), "user@fitsair.com", "password123")
            .unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.current_user().as_deref(), Some("user@fitsair.com"));
        assert!(session.require().is_ok());

        session.logout().unwrap();
        assert!(!session.is_authenticated());
        session.logout().unwrap();

        cleanup(&session);
    }

    #[test]
    fn test_rejected_login_leaves_no_flag() {
        let session = temp_session("rejected");

        let err = session
            .login(&default_auth(), "user@fitsair.com", "wrong")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
        assert!(!session.path().exists());

        cleanup(&session);
    }

    #[test]
    fn test_swappable_authenticator() {
        struct AllowAll;
        impl Authenticator for AllowAll {
            fn authenticate(&self, _email: &str, _password: &str) -> bool {
                true
            }
        }

        let session = temp_session("swap");
        session.login(&AllowAll, "anyone@example.com", "").unwrap();
        assert_eq!(session.current_user().as_deref(), Some("anyone@example.com"));

        cleanup(&session);
    }
}
