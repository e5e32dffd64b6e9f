use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use models::{Note, NoteExtras, User, UserId};

use crate::directory::UserDirectory;
use crate::errors::ServiceError;
use crate::metrics::{NOTES_ADDED_TOTAL, NOTES_REMOVED_TOTAL};
use crate::storage::KvStore;

/// Storage namespace that holds every user's note list.
pub const NAMESPACE: &str = "user_notes";

pub fn key_for(user_id: UserId) -> String {
    format!("notes:{user_id}")
}

/// Owns the per-user note lists.
///
/// A list is stored as one value under [`key_for`]; it is either absent or
/// non-empty. After every add/remove the user's `user_notes_count` is
/// rewritten to the list length, recomputed rather than incremented.
///
/// Mutations for the same user are serialized through a per-user async
/// mutex, so concurrent adds within this process cannot lose each other.
/// The list write and the count write are still two separate operations.
/// A user's lock entry is dropped again once no caller holds it.
pub struct NoteStore {
    kv: Arc<dyn KvStore>,
    users: Arc<dyn UserDirectory>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl NoteStore {
    pub fn new(kv: Arc<dyn KvStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { kv, users, locks: DashMap::new() }
    }

    /// Run `op` while holding the user's lock, then drop the lock entry if
    /// nobody else is waiting on it.
    async fn serialized<T>(
        &self,
        user_id: UserId,
        op: impl Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, ServiceError> {
        let result = {
            let lock = self.locks.entry(user_id).or_default().clone();
            let _guard = lock.lock().await;
            op.await
        };
        self.locks.remove_if(&user_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Notes for a user, oldest first. Empty when the user has none.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Note>, ServiceError> {
        match self.kv.get(NAMESPACE, &key_for(user_id)).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Append a note to the user's list and refresh the count cache.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use models::{NoteExtras, User};
    /// use service::directory::InMemoryUserDirectory;
    /// use service::notes::NoteStore;
    /// use service::storage::MemoryKvStore;
    ///
    /// let users = InMemoryUserDirectory::new();
    /// let user = User::new(7, "sam");
    /// tokio_test::block_on(users.upsert(user.clone()));
    /// let store = NoteStore::new(MemoryKvStore::new(), users);
    /// let note = tokio_test::block_on(store.add(&user, "hello", 1, NoteExtras::none())).unwrap();
    /// assert_eq!(note.user_id, 7);
    /// assert_eq!(tokio_test::block_on(store.list(7)).unwrap(), vec![note]);
    /// ```
    #[instrument(skip(self, user, raw), fields(user_id = user.id, created_by = created_by))]
    pub async fn add(
        &self,
        user: &User,
        raw: &str,
        created_by: UserId,
        extras: NoteExtras,
    ) -> Result<Note, ServiceError> {
        self.serialized(user.id, self.append(user, raw, created_by, extras)).await
    }

    async fn append(
        &self,
        user: &User,
        raw: &str,
        created_by: UserId,
        extras: NoteExtras,
    ) -> Result<Note, ServiceError> {
        let mut notes = self.list(user.id).await?;
        let note = Note::new(user.id, raw, created_by, extras);
        notes.push(note.clone());
        self.kv.set(NAMESPACE, &key_for(user.id), serde_json::to_value(&notes)?).await?;
        self.users.set_note_count(user.id, notes.len()).await?;

        NOTES_ADDED_TOTAL.inc();
        info!(note_id = %note.id, count = notes.len(), "note_added");
        Ok(note)
    }

    /// Drop every note with `note_id` from the user's list. Unknown ids are a no-op,
    /// but the count cache is rewritten either way.
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn remove(&self, user: &User, note_id: &str) -> Result<(), ServiceError> {
        self.serialized(user.id, self.drop_matching(user, note_id)).await
    }

    async fn drop_matching(&self, user: &User, note_id: &str) -> Result<(), ServiceError> {
        let key = key_for(user.id);
        let mut notes = self.list(user.id).await?;
        let before = notes.len();
        notes.retain(|n| n.id != note_id);
        let removed = before - notes.len();

        if notes.is_empty() {
            self.kv.remove(NAMESPACE, &key).await?;
        } else if removed > 0 {
            self.kv.set(NAMESPACE, &key, serde_json::to_value(&notes)?).await?;
        }
        self.users.set_note_count(user.id, notes.len()).await?;

        if removed > 0 {
            NOTES_REMOVED_TOTAL.inc_by(removed as u64);
            info!(note_id, removed, count = notes.len(), "note_removed");
        } else {
            debug!(note_id, "note_remove_noop");
        }
        Ok(())
    }

    /// Every stored list, in no particular order.
    pub async fn all_lists(&self) -> Result<Vec<Vec<Note>>, ServiceError> {
        self.kv
            .entries(NAMESPACE)
            .await?
            .into_iter()
            .map(|(_, value)| serde_json::from_value(value).map_err(ServiceError::from))
            .collect()
    }
}
