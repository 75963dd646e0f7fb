//! # Authentication task.
//!
//! Resolves the current user once per `RequestAuthentication`:
//!
//! ```text
//! RequestAuthentication { user? }
//!   ├─► user present → identity.set(identity_key, user)
//!   ├─► identity.get(identity_key)
//!   │     ├─ None    → AuthenticationFailed { AuthResolution }
//!   │     └─ Some(id)
//!   └─► registry.is_authorized(id) → AuthenticationSucceeded { id, authorized }
//! ```
//!
//! A user missing from the registry is unauthorized, not an error.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::TaskError;
use crate::events::Event;
use crate::ports::IdentityRef;
use crate::store::UserId;

use super::task::{Task, TaskContext};

/// Access entry of one user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Access {
    #[serde(rename = "hasAccess", alias = "has_access")]
    pub has_access: bool,
}

/// Fixed authorization registry: `UserId -> Access`.
///
/// # Example
/// ```
/// use pollvisor::AuthRegistry;
///
/// let registry = AuthRegistry::new().with_user("abc123", true);
/// assert!(registry.is_authorized("abc123"));
/// assert!(!registry.is_authorized("nobody"));
///
/// let registry = AuthRegistry::from_json(r#"{"u1": {"hasAccess": false}}"#).unwrap();
/// assert!(!registry.is_authorized("u1"));
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct AuthRegistry {
    entries: HashMap<UserId, Access>,
}

impl AuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a user entry.
    pub fn with_user(mut self, id: impl Into<UserId>, has_access: bool) -> Self {
        self.entries.insert(id.into(), Access { has_access });
        self
    }

    /// Parses a `{ "<id>": { "hasAccess": bool } }` document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn lookup(&self, id: &str) -> Option<Access> {
        self.entries.get(id).copied()
    }

    /// Membership test; unknown users are unauthorized.
    pub fn is_authorized(&self, id: &str) -> bool {
        self.lookup(id).is_some_and(|a| a.has_access)
    }
}

/// Task resolving the current user.
pub struct AuthTask {
    identity: IdentityRef,
    registry: AuthRegistry,
    identity_key: String,
}

impl AuthTask {
    pub fn new(identity: IdentityRef, registry: AuthRegistry, identity_key: impl Into<String>) -> Self {
        Self {
            identity,
            registry,
            identity_key: identity_key.into(),
        }
    }
}

#[async_trait]
impl Task for AuthTask {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn run(&self, trigger: &Event, ctx: &TaskContext) -> Result<(), TaskError> {
        if let Some(user) = trigger.user.as_deref() {
            self.identity.set(&self.identity_key, user);
        }

        let id = self
            .identity
            .get(&self.identity_key)
            .ok_or_else(|| TaskError::AuthResolution {
                error: format!("no user stored under {:?}", self.identity_key),
            })?;

        let authorized = self.registry.is_authorized(&id);
        debug!(user = %id, authorized, "user resolved");
        ctx.emit(Event::authentication_succeeded(id, authorized))?;
        Ok(())
    }

    fn on_failure(&self, err: TaskError) -> Vec<Event> {
        vec![Event::authentication_failed(err)]
    }
}
