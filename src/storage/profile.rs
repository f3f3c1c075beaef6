//! User profiles: interest tags, saved questions and viewing history.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sqlite::Database;
use crate::error::{HubError, Result};

const SELECT_PROFILE: &str =
    "SELECT user_tags, saved_questions, search_history FROM user_data WHERE user_id = ?1";

/// Persisted state of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    /// Interest tags, insertion order, no duplicates
    pub tags: Vec<String>,
    /// Bookmarked question ids, insertion order, no duplicates
    pub saved_ids: Vec<i64>,
    /// Viewed question ids, oldest first
    pub history: Vec<i64>,
}

impl UserProfile {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Append `id` to history unless it is already there.
    pub fn record_search(&mut self, id: i64) -> bool {
        push_unique(&mut self.history, id)
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        push_unique(&mut self.tags, tag.to_string())
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        remove_item(&mut self.tags, |t| t == tag)
    }

    pub fn save_question(&mut self, id: i64) -> bool {
        push_unique(&mut self.saved_ids, id)
    }

    pub fn unsave_question(&mut self, id: i64) -> bool {
        remove_item(&mut self.saved_ids, |s| *s == id)
    }

    #[must_use]
    pub fn tag_set(&self) -> HashSet<String> {
        self.tags.iter().cloned().collect()
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) -> bool {
    if list.contains(&item) {
        return false;
    }
    list.push(item);
    true
}

fn remove_item<T>(list: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    let before = list.len();
    list.retain(|item| !pred(item));
    list.len() != before
}

/// Durable profile persistence.
pub trait ProfileStore: Send + Sync {
    fn load(&self, user_id: &str) -> Result<Option<UserProfile>>;
    fn save(&self, profile: &UserProfile) -> Result<()>;
}

/// Profiles in the `user_data` table, each list stored as a JSON array.
///
/// Tags must decode as strings and ids as integers; any other element type
/// fails the load instead of being coerced.
pub struct SqliteProfileStore {
    db: Mutex<Database>,
}

impl SqliteProfileStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }
}

impl ProfileStore for SqliteProfileStore {
    fn load(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let db = self.db.lock();
        let row = db
            .conn()
            .query_row(SELECT_PROFILE, [user_id], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })
            .optional()?;

        let Some((tags, saved, history)) = row else {
            return Ok(None);
        };
        Ok(Some(UserProfile {
            user_id: user_id.to_string(),
            tags: decode_list(tags.as_deref(), "user_tags")?,
            saved_ids: decode_list(saved.as_deref(), "saved_questions")?,
            history: decode_list(history.as_deref(), "search_history")?,
        }))
    }

    fn save(&self, profile: &UserProfile) -> Result<()> {
        let tags = serde_json::to_string(&profile.tags)?;
        let saved = serde_json::to_string(&profile.saved_ids)?;
        let history = serde_json::to_string(&profile.history)?;
        self.db.lock().conn().execute(
            "INSERT INTO user_data (user_id, user_tags, saved_questions, search_history)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                user_tags = excluded.user_tags,
                saved_questions = excluded.saved_questions,
                search_history = excluded.search_history",
            params![profile.user_id, tags, saved, history],
        )?;
        Ok(())
    }
}

fn decode_list<T: for<'de> Deserialize<'de>>(raw: Option<&str>, column: &str) -> Result<Vec<T>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json)
            .map_err(|e| HubError::Serialization(format!("column {column}: {e}"))),
    }
}

/// Process-local store, used in tests and for anonymous sessions.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.lock().get(user_id).cloned())
    }

    fn save(&self, profile: &UserProfile) -> Result<()> {
        self.profiles
            .lock()
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

/// Serializes read-modify-write cycles per user over a [`ProfileStore`].
///
/// Two concurrent updates for the same user run one after the other, so a
/// save and a remove issued together both land. A user's lock entry is
/// dropped once no caller holds or waits on it.
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProfileService {
    #[must_use]
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` while holding the user's lock.
    fn with_user_lock<R>(&self, user_id: &str, f: impl FnOnce() -> R) -> R {
        // Clones are only taken under the map lock, so a strong count of 1
        // seen under that lock means nobody else can be holding the entry.
        let lock = Arc::clone(
            self.locks
                .lock()
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        let out = {
            let _guard = lock.lock();
            f()
        };

        let mut locks = self.locks.lock();
        drop(lock);
        if locks.get(user_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(user_id);
        }
        out
    }

    /// Current profile, creating and persisting an empty one if absent.
    pub fn get_or_create(&self, user_id: &str) -> Result<UserProfile> {
        self.with_user_lock(user_id, || -> Result<UserProfile> {
            if let Some(profile) = self.store.load(user_id)? {
                return Ok(profile);
            }
            let profile = UserProfile::new(user_id);
            self.store.save(&profile)?;
            debug!(user_id, "created profile");
            Ok(profile)
        })
    }

    /// Apply `f` to the stored profile under the user's lock.
    ///
    /// The profile is written back only if `f` succeeded and changed it.
    pub fn update<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut UserProfile) -> Result<R>,
    ) -> Result<R> {
        self.with_user_lock(user_id, || -> Result<R> {
            let mut profile = self
                .store
                .load(user_id)?
                .unwrap_or_else(|| UserProfile::new(user_id));
            let before = profile.clone();
            let out = f(&mut profile)?;
            if profile != before {
                self.store.save(&profile)?;
                debug!(user_id, "profile saved");
            }
            Ok(out)
        })
    }

    /// Append the top search result to history once.
    pub fn record_search(&self, user_id: &str, id: i64) -> Result<bool> {
        self.update(user_id, |p| Ok(p.record_search(id)))
    }

    pub fn add_tag(&self, user_id: &str, tag: &str) -> Result<bool> {
        let tag = tag.trim();
        if tag.is_empty() || tag.chars().any(char::is_whitespace) {
            return Err(HubError::InvalidInput(format!(
                "tag must be a single non-empty token: {tag:?}"
            )));
        }
        self.update(user_id, |p| Ok(p.add_tag(tag)))
    }

    pub fn remove_tag(&self, user_id: &str, tag: &str) -> Result<bool> {
        self.update(user_id, |p| Ok(p.remove_tag(tag.trim())))
    }

    pub fn save_question(&self, user_id: &str, id: i64) -> Result<bool> {
        self.update(user_id, |p| Ok(p.save_question(id)))
    }

    pub fn unsave_question(&self, user_id: &str, id: i64) -> Result<bool> {
        self.update(user_id, |p| Ok(p.unsave_question(id)))
    }
}
