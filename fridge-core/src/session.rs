//! Keyed per-user state with per-user mutual exclusion.
//!
//! Every turn for a user holds that user's lock for its whole duration, so a
//! double-tap cannot interleave two inventory edits or two round replacements.
//! Turns for different users never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::inventory::FridgeInventory;
use crate::types::{GenerationRound, StepView};

/// Everything remembered about one user. Lives for the process lifetime.
#[derive(Debug, Default)]
pub struct UserSession {
    pub inventory: FridgeInventory,
    pub round: Option<GenerationRound>,
    pub step_view: Option<StepView>,
}

impl UserSession {
    /// Replace the round and drop any step view browsing the old one.
    pub fn replace_round(&mut self, round: GenerationRound) {
        self.round = Some(round);
        self.step_view = None;
    }

    /// Forget everything: inventory, round and step view.
    pub fn reset(&mut self) {
        self.inventory.clear();
        self.round = None;
        self.step_view = None;
    }
}

/// Concurrent map of user id -> session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<UserSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock a user's session, creating it on first reference.
    pub async fn lock(&self, user_id: &str) -> OwnedMutexGuard<UserSession> {
        // Clone the Arc out so the shard guard is released before awaiting.
        let session = self
            .sessions
            .entry(user_id.to_string())
            .or_default()
            .value()
            .clone();
        session.lock_owned().await
    }

    /// Number of users seen so far.
    pub fn user_count(&self) -> usize {
        self.sessions.len()
    }
}
