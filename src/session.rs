//! Session guard for the admin dashboard
//!
//! Holds the single bearer token for the process. The token is set on a
//! successful login, read by every dashboard request through
//! [`SessionGuard::bearer_header`], and torn down on logout or when the
//! backend rejects it.
//!
//! Admission only checks that a token is present; the backend remains the
//! authority on whether it is still valid.
//!
//! When constructed with a store path the token is persisted there, so
//! separate CLI invocations share one login.

use crate::error::{DashboardError, Result};
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Counter identifying one installed token
///
/// Bumped on every login, logout and expiry, so a rejection observed for an
/// earlier token can be told apart from one for the current token.
pub type SessionGeneration = u64;

#[derive(Default)]
struct TokenSlot {
    token: Option<SecretString>,
    generation: SessionGeneration,
}

/// Process-wide session token holder
pub struct SessionGuard {
    slot: RwLock<TokenSlot>,
    store: Option<PathBuf>,
}

impl SessionGuard {
    /// In-memory session, lost when the process exits
    pub fn in_memory() -> Self {
        Self {
            slot: RwLock::new(TokenSlot::default()),
            store: None,
        }
    }

    /// Session persisted at `path`, restoring any token already stored there
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self> {
        let store = path.into();
        let token = match fs::read_to_string(&store) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    None
                } else {
                    debug!("Restored session token from {}", store.display());
                    Some(SecretString::new(contents.to_string().into()))
                }
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => None,
            Err(e) => return Err(DashboardError::Io(e)),
        };

        Ok(Self {
            slot: RwLock::new(TokenSlot {
                token,
                generation: 0,
            }),
            store: Some(store),
        })
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store.as_deref()
    }

    fn read(&self) -> RwLockReadGuard<'_, TokenSlot> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TokenSlot> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SessionState {
        if self.read().token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Generation of the token currently installed (or of its absence)
    pub fn generation(&self) -> SessionGeneration {
        self.read().generation
    }

    /// Gate for dashboard-scoped work
    pub fn admit(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(DashboardError::Auth("Not logged in".to_string()))
        }
    }

    /// Install a freshly issued token
    pub fn establish(&self, token: SecretString) -> Result<()> {
        if token.expose_secret().trim().is_empty() {
            return Err(DashboardError::Auth(
                "Token endpoint returned an empty token".to_string(),
            ));
        }

        let mut slot = self.write();
        if let Some(path) = &self.store {
            write_token_file(path, token.expose_secret())?;
        }
        slot.token = Some(token);
        slot.generation += 1;
        info!("Session established (generation {})", slot.generation);
        Ok(())
    }

    /// Authorization header for the current token, with that token's generation
    pub fn bearer_header(&self) -> Result<(HeaderValue, SessionGeneration)> {
        let slot = self.read();
        let Some(token) = slot.token.as_ref() else {
            return Err(DashboardError::Auth("Not logged in".to_string()));
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| DashboardError::Auth("Stored token is not a valid header".to_string()))?;
        value.set_sensitive(true);
        Ok((value, slot.generation))
    }

    /// Explicit logout: clears memory and the persisted copy
    pub fn logout(&self) -> Result<()> {
        let mut slot = self.write();
        slot.token = None;
        slot.generation += 1;
        self.remove_store()?;
        info!("Session cleared");
        Ok(())
    }

    /// Forced logout after the backend rejected the token of `generation`
    ///
    /// A rejection for a token that has since been replaced or cleared is
    /// ignored. Returns whether the session was torn down.
    pub fn expire(&self, generation: SessionGeneration, reason: &str) -> bool {
        let mut slot = self.write();
        if slot.generation != generation {
            debug!(
                "Ignoring rejection for superseded session {} (current {})",
                generation, slot.generation
            );
            return false;
        }
        if slot.token.is_none() && self.store.as_ref().map_or(true, |p| !p.exists()) {
            return false;
        }

        warn!("Session expired: {}", reason);
        slot.token = None;
        slot.generation += 1;
        if let Err(e) = self.remove_store() {
            warn!("Failed to clear persisted session: {}", e);
        }
        true
    }

    fn remove_store(&self) -> Result<()> {
        if let Some(path) = &self.store {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed session file {}", path.display()),
                Err(e) if e.kind() == IoErrorKind::NotFound => {}
                Err(e) => return Err(DashboardError::Io(e)),
            }
        }
        Ok(())
    }
}

fn write_token_file(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, token)?;

    // Owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}
