use std::sync::{PoisonError, RwLock};

use crate::models::{Role, User};

/// Who is logged in on this client.
///
/// Owned by whoever builds the client and handed to consumers explicitly,
/// usually behind an `Arc`.
#[derive(Debug, Default)]
pub struct SessionContext {
    user: RwLock<Option<User>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user(&self, user: User) {
        tracing::debug!(user_id = user.id, role = user.role.as_str(), "session user set");
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    pub fn clear(&self) {
        tracing::debug!("session cleared");
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|u| u.role)
    }
}
