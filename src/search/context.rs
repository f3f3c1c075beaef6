//! Per-request personalization context

use std::collections::HashSet;

use crate::storage::profile::UserProfile;

/// Snapshot of a user's profile taken at the start of a request.
///
/// Core operations read from this instead of any shared session state.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// User the request is made for, if any
    pub user_id: Option<String>,
    /// Interest tags
    pub tags: HashSet<String>,
    /// Bookmarked question ids
    pub saved_ids: HashSet<i64>,
    /// Previously viewed question ids, oldest first
    pub history: Vec<i64>,
}

impl RequestContext {
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: Some(profile.user_id.clone()),
            tags: profile.tags.iter().cloned().collect(),
            saved_ids: profile.saved_ids.iter().copied().collect(),
            history: profile.history.clone(),
        }
    }

    #[must_use]
    pub fn is_saved(&self, id: i64) -> bool {
        self.saved_ids.contains(&id)
    }
}
