use log::{debug, info, warn};

use crate::error_handling::types::{AuthError, StorageError};
use crate::session_management::session::Session;
use crate::session_management::Role;
use crate::storage::events::StoreEvent;
use crate::storage::record_store::{keys, RecordStore};

/// Built-in admin account. Not stored with the doctors and always checked first.
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Holds the current session and mirrors it to storage.
///
/// The gate is an explicit context: create it with [`SessionGate::restore`]
/// when the application starts and pass it to whatever needs to know who is
/// logged in. [`SessionGate::logout`] is the only teardown.
///
/// Credentials are compared as stored, in plaintext.
pub struct SessionGate {
    store: RecordStore,
    current: Option<Session>,
}

impl SessionGate {
    /// Picks up the session mirrored by a previous run, if any.
    ///
    /// A missing or unreadable `currentUser` value starts logged out.
    pub fn restore(store: RecordStore) -> Result<Self, StorageError> {
        let current: Option<Session> = store.read_json(keys::CURRENT_USER)?;
        match &current {
            Some(session) => info!("Restored session for {} ({:?})", session.username, session.role),
            None => debug!("No session to restore"),
        }
        Ok(Self { store, current })
    }

    /// Checks the admin pair first, then the doctors collection.
    pub fn login(&mut self, username: &str, password: &str) -> Result<Session, AuthError> {
        let session = if username == ADMIN_USERNAME && password == ADMIN_PASSWORD {
            Session::admin(username)
        } else {
            let doctors = self.store.list_doctors()?;
            match doctors
                .iter()
                .find(|d| d.username == username && d.password == password)
            {
                Some(doctor) => Session::doctor(doctor),
                None => {
                    warn!("Failed login for username {:?}", username);
                    return Err(AuthError::InvalidCredentials);
                }
            }
        };

        self.store
            .write_json(keys::CURRENT_USER, &session, StoreEvent::SessionChanged)?;
        info!("{} logged in as {:?}", session.username, session.role);
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Clears the in-memory session and its mirror.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        if let Some(session) = self.current.take() {
            info!("{} logged out", session.username);
        }
        self.store.remove_key(keys::CURRENT_USER, StoreEvent::SessionChanged)
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_doctor(&self) -> bool {
        self.has_role(Role::Doctor)
    }

    pub fn require_admin(&self) -> Result<&Session, AuthError> {
        self.require(Role::Admin)
    }

    pub fn require_doctor(&self) -> Result<&Session, AuthError> {
        self.require(Role::Doctor)
    }

    fn has_role(&self, role: Role) -> bool {
        self.current.as_ref().is_some_and(|s| s.role == role)
    }

    fn require(&self, role: Role) -> Result<&Session, AuthError> {
        match &self.current {
            None => Err(AuthError::NotLoggedIn),
            Some(session) if session.role == role => Ok(session),
            Some(_) => Err(AuthError::Forbidden),
        }
    }
}
