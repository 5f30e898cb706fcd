//! Identity source for the engine.

use shared::Config;
use std::sync::{PoisonError, RwLock};
use tracing::info;

/// Supplies the logged-in user, if any
pub trait SessionGate: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Session with a fixed user that can be ended
#[derive(Debug, Default)]
pub struct StaticSession {
    user_id: RwLock<Option<String>>,
}

impl StaticSession {
    /// Blank ids count as no user
    pub fn new(user_id: Option<String>) -> Self {
        let user_id = user_id.filter(|id| !id.trim().is_empty());
        Self {
            user_id: RwLock::new(user_id),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.user_id().map(str::to_string))
    }

    /// Log out; the session reports no user from now on
    pub fn end(&self) {
        let mut user_id = self.user_id.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = user_id.take() {
            info!(user_id = %previous, "Session ended");
        }
    }
}

impl SessionGate for StaticSession {
    fn current_user_id(&self) -> Option<String> {
        self.user_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
