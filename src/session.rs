//! Injected session identity.
//!
//! The backend wants a `userId` on book creation. Identity lives in some
//! host-owned store; this crate only reads it through a capability so tests
//! stay deterministic and nothing here touches global state.

use std::sync::Mutex;

/// Placeholder used while no real session exists.
pub const ANONYMOUS_USER_ID: &str = "TEMP_USER_ID";

pub trait SessionProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Simple provider backed by an in-memory slot; suits hosts that set the
/// user id once after login, and tests.
#[derive(Default)]
pub struct FixedSession {
    user_id: Mutex<Option<String>>,
}

impl FixedSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Mutex::new(Some(user_id.into())),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn set_user_id(&self, user_id: Option<String>) {
        *self.user_id.lock().expect("session lock poisoned") = user_id;
    }
}

impl SessionProvider for FixedSession {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.lock().expect("session lock poisoned").clone()
    }
}
