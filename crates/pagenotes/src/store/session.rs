//! A local session whose user comes from configuration.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::info;

use super::{AuthProvider, CurrentUser};
use crate::config::AccountConfig;
use crate::error::Result;

/// Signed in as a fixed user until [`AuthProvider::sign_out`] is called.
#[derive(Debug)]
pub struct LocalSession {
    user: CurrentUser,
    signed_in: AtomicBool,
}

impl LocalSession {
    /// Start a session for `user`.
    #[must_use]
    pub fn new(user: CurrentUser) -> Self {
        Self {
            user,
            signed_in: AtomicBool::new(true),
        }
    }

    /// Start a session for the configured account.
    #[must_use]
    pub fn from_config(account: &AccountConfig) -> Self {
        Self::new(CurrentUser {
            id: account.user_id.clone(),
            email: account.email.clone(),
        })
    }
}

#[async_trait]
impl AuthProvider for LocalSession {
    fn current_user(&self) -> Option<CurrentUser> {
        self.signed_in
            .load(Ordering::SeqCst)
            .then(|| self.user.clone())
    }

    async fn sign_out(&self) -> Result<()> {
        if self.signed_in.swap(false, Ordering::SeqCst) {
            info!(email = %self.user.email, "Signed out");
        }
        Ok(())
    }
}
