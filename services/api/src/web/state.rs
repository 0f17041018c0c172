//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use mentorconnect_core::ports::{DatabaseService, NotificationService};
use mentorconnect_core::MentorshipService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Used directly by the auth handlers; everything else goes through `mentorship`.
    pub db: Arc<dyn DatabaseService>,
    pub mentorship: MentorshipService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        notifier: Arc<dyn NotificationService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            mentorship: MentorshipService::new(db.clone(), notifier),
            db,
            config,
        }
    }
}
