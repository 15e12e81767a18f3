/// Optimistic like/save toggling
///
/// A toggle is split in two halves. `begin_*` runs synchronously: it flips the
/// locally tracked value and hands back a ticket, so the UI can render the new
/// state straight away. `commit_*` performs the single network write and
/// reconciles the tracked value with what the server answered.
///
/// Likes are written as a full replacement of the liker array. Two clients
/// toggling the same post concurrently race and the last write to land wins;
/// there is no merge at the backend boundary.
///
/// Every toggle takes a sequence number. A response only rewrites the visible
/// value if no newer toggle started on the same key in the meantime, so a slow
/// early write cannot clobber a later local toggle. Once nothing is in flight,
/// a late response that landed after the newest one is adopted, since the
/// backend now holds that value. With `serialize_writes`
/// enabled, writes for one key are additionally issued one at a time in call
/// order (the per-key lane is a FIFO `tokio::sync::Mutex`).
use crate::backend::DocumentStore;
use crate::config::{FailurePolicy, InteractionConfig};
use crate::domain::{LikeSet, Post, SavedRecord, User};
use crate::error::{SocialError, SocialResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Lifecycle of a tracked interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Value mirrors server data, nothing written yet
    Idle,
    /// Optimistic value shown, write in flight
    Pending,
    /// Server acknowledged the latest toggle
    Confirmed,
    /// Latest write failed and the confirmed value was restored
    FailedReverted,
    /// Latest write failed and the optimistic value was kept
    FailedKept,
}

#[derive(Debug, Clone)]
struct Tracked<T> {
    /// What the user sees
    current: T,
    /// Last value acknowledged by the server
    confirmed: T,
    state: MutationState,
    /// Sequence number of the newest toggle
    seq: u64,
    in_flight: usize,
    /// Server update time of `confirmed`, when known
    synced_at: Option<DateTime<Utc>>,
}

impl<T: Clone> Tracked<T> {
    fn new(value: T, synced_at: Option<DateTime<Utc>>) -> Self {
        Self {
            current: value.clone(),
            confirmed: value,
            state: MutationState::Idle,
            seq: 0,
            in_flight: 0,
            synced_at,
        }
    }

    /// Adopt fresher server data when nothing of ours is in flight
    fn observe(&mut self, value: T, updated_at: DateTime<Utc>) -> bool {
        let newer = self.synced_at.map(|at| updated_at > at).unwrap_or(true);
        if self.in_flight > 0 || !newer {
            return false;
        }
        self.current = value.clone();
        self.confirmed = value;
        self.synced_at = Some(updated_at);
        self.state = MutationState::Idle;
        true
    }

    fn begin(&mut self, next: T, seq: u64) {
        self.current = next;
        self.state = MutationState::Pending;
        self.seq = seq;
        self.in_flight += 1;
    }

    /// Record a server acknowledgement; returns true if it was the newest toggle
    fn confirm(&mut self, seq: u64, value: T, synced_at: Option<DateTime<Utc>>) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.confirmed = value.clone();
        if synced_at.is_some() {
            self.synced_at = synced_at;
        }

        if self.seq == seq {
            self.current = value;
            self.state = MutationState::Confirmed;
            return true;
        }
        // last write to land is what the server holds, unless a kept failure owns the view
        if self.in_flight == 0 && self.state != MutationState::FailedKept {
            self.current = value;
            self.state = MutationState::Confirmed;
        }
        false
    }

    /// Record a failed write; returns true if it was the newest toggle
    fn fail(&mut self, seq: u64, policy: FailurePolicy) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.seq != seq {
            return false;
        }
        match policy {
            FailurePolicy::Revert => {
                self.current = self.confirmed.clone();
                self.state = MutationState::FailedReverted;
            }
            FailurePolicy::KeepOptimistic => {
                self.state = MutationState::FailedKept;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct SaveSlot {
    saved: bool,
    record: Option<SavedRecord>,
}

impl SaveSlot {
    fn from_record(record: Option<SavedRecord>) -> Self {
        Self {
            saved: record.is_some(),
            record,
        }
    }
}

/// Snapshot of a post's likes as the UI should render them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeView {
    pub likes: LikeSet,
    pub state: MutationState,
}

/// Optimistic like toggle waiting for its write
#[must_use = "a like ticket does nothing until committed"]
#[derive(Debug, Clone)]
pub struct LikeTicket {
    post_id: String,
    seq: u64,
    likes: LikeSet,
    liked: bool,
}

impl LikeTicket {
    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    /// Optimistic liker set
    pub fn likes(&self) -> &LikeSet {
        &self.likes
    }

    /// Whether the acting user likes the post after this toggle
    pub fn liked(&self) -> bool {
        self.liked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveAction {
    Create,
    /// Delete the record; a missing id is resolved from tracked state at commit
    Delete { record_id: Option<String> },
}

/// Optimistic save toggle waiting for its write
#[must_use = "a save ticket does nothing until committed"]
#[derive(Debug, Clone)]
pub struct SaveTicket {
    user_id: String,
    post_id: String,
    seq: u64,
    action: SaveAction,
}

impl SaveTicket {
    pub fn action(&self) -> &SaveAction {
        &self.action
    }

    /// Whether the post is saved after this toggle
    pub fn saved(&self) -> bool {
        self.action == SaveAction::Create
    }
}

/// Whether `user_id` is among the likers
pub fn is_liked(likes: &LikeSet, user_id: &str) -> bool {
    likes.contains(user_id)
}

/// The user's saved record for `post_id`, if any
pub fn find_saved_record<'a>(records: &'a [SavedRecord], post_id: &str) -> Option<&'a SavedRecord> {
    records.iter().find(|record| record.post == post_id)
}

pub struct InteractionManager {
    store: Arc<dyn DocumentStore>,
    config: InteractionConfig,
    likes: DashMap<String, Tracked<LikeSet>>,
    saves: DashMap<(String, String), Tracked<SaveSlot>>,
    lanes: DashMap<String, Arc<Mutex<()>>>,
    seq: AtomicU64,
}

impl InteractionManager {
    pub fn new(store: Arc<dyn DocumentStore>, config: InteractionConfig) -> Self {
        Self {
            store,
            config,
            likes: DashMap::new(),
            saves: DashMap::new(),
            lanes: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn lane(&self, key: String) -> Option<OwnedMutexGuard<()>> {
        if !self.config.serialize_writes {
            return None;
        }
        let lane = self.lanes.entry(key).or_default().clone();
        Some(lane.lock_owned().await)
    }

    // ========== Likes ==========

    /// Feed fresh server data for a post into tracked state
    pub fn observe_post(&self, post: &Post) {
        if let Some(mut entry) = self.likes.get_mut(&post.id) {
            if entry.observe(post.likes.clone(), post.updated_at) {
                debug!(post_id = %post.id, "like state refreshed from server");
            }
        }
    }

    /// Likes to render for a post: tracked value if any, else the post's own
    pub fn likes_for(&self, post: &Post) -> LikeSet {
        self.likes
            .get(&post.id)
            .map(|entry| entry.current.clone())
            .unwrap_or_else(|| post.likes.clone())
    }

    pub fn like_view(&self, post_id: &str) -> Option<LikeView> {
        self.likes.get(post_id).map(|entry| LikeView {
            likes: entry.current.clone(),
            state: entry.state,
        })
    }

    /// Flip the acting user's like locally and return the write ticket
    pub fn begin_like(&self, post: &Post, user_id: &str) -> LikeTicket {
        let mut entry = self
            .likes
            .entry(post.id.clone())
            .or_insert_with(|| Tracked::new(post.likes.clone(), Some(post.updated_at)));
        entry.observe(post.likes.clone(), post.updated_at);

        let mut next = entry.current.clone();
        let liked = next.toggle(user_id);
        let seq = self.next_seq();
        entry.begin(next.clone(), seq);

        debug!(post_id = %post.id, %user_id, liked, seq, "like toggled locally");

        LikeTicket {
            post_id: post.id.clone(),
            seq,
            likes: next,
            liked,
        }
    }

    /// Write the ticket's liker set and reconcile with the server's answer
    pub async fn commit_like(&self, ticket: LikeTicket) -> SocialResult<LikeSet> {
        let _lane = self.lane(format!("like:{}", ticket.post_id)).await;

        let result = self.store.update_likes(&ticket.post_id, &ticket.likes).await;

        let mut entry = match self.likes.get_mut(&ticket.post_id) {
            Some(entry) => entry,
            None => return result.map(|post| post.likes),
        };

        match result {
            Ok(post) => {
                let latest = entry.confirm(ticket.seq, post.likes.clone(), Some(post.updated_at));
                info!(
                    post_id = %ticket.post_id,
                    likes = post.likes.len(),
                    latest,
                    "like write confirmed"
                );
                Ok(post.likes)
            }
            Err(err) => {
                let latest = entry.fail(ticket.seq, self.config.failure_policy);
                warn!(
                    post_id = %ticket.post_id,
                    latest,
                    policy = ?self.config.failure_policy,
                    "like write failed: {}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Toggle the acting user's like on a post
    pub async fn toggle_like(&self, post: &Post, user_id: &str) -> SocialResult<LikeSet> {
        let ticket = self.begin_like(post, user_id);
        self.commit_like(ticket).await
    }

    // ========== Saves ==========

    /// Seed saved flags from the user's records as returned by the server
    pub fn hydrate_saves(&self, user: &User) {
        for record in &user.save {
            let key = (user.id.clone(), record.post.clone());
            let slot = SaveSlot::from_record(Some(SavedRecord {
                user: user.id.clone(),
                ..record.clone()
            }));
            let mut entry = self
                .saves
                .entry(key)
                .or_insert_with(|| Tracked::new(SaveSlot::default(), None));
            if entry.in_flight == 0 {
                entry.current = slot.clone();
                entry.confirmed = slot;
                entry.state = MutationState::Idle;
            }
        }
    }

    pub fn is_saved(&self, user_id: &str, post_id: &str) -> bool {
        self.saves
            .get(&(user_id.to_string(), post_id.to_string()))
            .map(|entry| entry.current.saved)
            .unwrap_or(false)
    }

    pub fn save_state(&self, user_id: &str, post_id: &str) -> MutationState {
        self.saves
            .get(&(user_id.to_string(), post_id.to_string()))
            .map(|entry| entry.state)
            .unwrap_or(MutationState::Idle)
    }

    /// Server record currently known for the pair
    pub fn saved_record(&self, user_id: &str, post_id: &str) -> Option<SavedRecord> {
        self.saves
            .get(&(user_id.to_string(), post_id.to_string()))
            .and_then(|entry| entry.confirmed.record.clone())
    }

    /// Flip the saved flag locally and return the write ticket
    ///
    /// A supplied `existing` record always means unsave. Without one, the
    /// tracked flag decides.
    pub fn begin_save(
        &self,
        post: &Post,
        user_id: &str,
        existing: Option<&SavedRecord>,
    ) -> SaveTicket {
        let key = (user_id.to_string(), post.id.clone());
        let mut entry = self
            .saves
            .entry(key)
            .or_insert_with(|| Tracked::new(SaveSlot::from_record(existing.cloned()), None));

        if let Some(record) = existing {
            if entry.in_flight == 0 && entry.confirmed.record.is_none() {
                entry.confirmed = SaveSlot::from_record(Some(record.clone()));
            }
        }

        let currently_saved = existing.is_some() || entry.current.saved;
        let action = if currently_saved {
            SaveAction::Delete {
                record_id: existing
                    .map(|record| record.id.clone())
                    .or_else(|| entry.confirmed.record.as_ref().map(|r| r.id.clone())),
            }
        } else {
            SaveAction::Create
        };

        let seq = self.next_seq();
        let optimistic = SaveSlot {
            saved: !currently_saved,
            record: None,
        };
        entry.begin(optimistic, seq);

        debug!(post_id = %post.id, %user_id, saved = !currently_saved, seq, "save toggled locally");

        SaveTicket {
            user_id: user_id.to_string(),
            post_id: post.id.clone(),
            seq,
            action,
        }
    }

    /// Perform the ticket's write and reconcile with the server's answer
    pub async fn commit_save(&self, ticket: SaveTicket) -> SocialResult<Option<SavedRecord>> {
        let _lane = self
            .lane(format!("save:{}:{}", ticket.user_id, ticket.post_id))
            .await;

        let key = (ticket.user_id.clone(), ticket.post_id.clone());
        let mut deleted = None;

        let result = match &ticket.action {
            SaveAction::Create => {
                // an outstanding delete may still remove the confirmed record
                let reusable = self
                    .saves
                    .get(&key)
                    .filter(|entry| entry.in_flight <= 1)
                    .and_then(|entry| entry.confirmed.record.clone());
                match reusable {
                    // the server already holds a record for this pair
                    Some(record) => {
                        debug!(post_id = %ticket.post_id, record_id = %record.id, "save already recorded");
                        Ok(Some(record))
                    }
                    None => self
                        .store
                        .create_saved(&ticket.user_id, &ticket.post_id)
                        .await
                        .map(Some),
                }
            }
            SaveAction::Delete { record_id } => {
                let record_id = record_id.clone().or_else(|| {
                    self.saved_record(&ticket.user_id, &ticket.post_id)
                        .map(|record| record.id)
                });
                match record_id {
                    None => {
                        debug!(post_id = %ticket.post_id, "no saved record to delete");
                        Ok(None)
                    }
                    Some(record_id) => {
                        let outcome = match self.store.delete_saved(&record_id).await {
                            Ok(()) => Ok(None),
                            Err(SocialError::NotFound(_)) => {
                                debug!(%record_id, "saved record already gone");
                                Ok(None)
                            }
                            Err(err) => Err(err),
                        };
                        deleted = Some(record_id);
                        outcome
                    }
                }
            }
        };

        let mut entry = match self.saves.get_mut(&key) {
            Some(entry) => entry,
            None => return result,
        };

        match result {
            Ok(record) => {
                let slot = match &deleted {
                    // a newer record for the pair survives this delete
                    Some(id)
                        if entry
                            .confirmed
                            .record
                            .as_ref()
                            .is_some_and(|current| &current.id != id) =>
                    {
                        entry.confirmed.clone()
                    }
                    _ => SaveSlot::from_record(record.clone()),
                };
                let latest = entry.confirm(ticket.seq, slot, None);
                info!(
                    post_id = %ticket.post_id,
                    user_id = %ticket.user_id,
                    saved = record.is_some(),
                    latest,
                    "save write confirmed"
                );
                Ok(record)
            }
            Err(err) => {
                let latest = entry.fail(ticket.seq, self.config.failure_policy);
                warn!(
                    post_id = %ticket.post_id,
                    user_id = %ticket.user_id,
                    latest,
                    policy = ?self.config.failure_policy,
                    "save write failed: {}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Save or unsave a post for the acting user
    pub async fn toggle_save(
        &self,
        post: &Post,
        user_id: &str,
        existing: Option<&SavedRecord>,
    ) -> SocialResult<Option<SavedRecord>> {
        let ticket = self.begin_save(post, user_id, existing);
        self.commit_save(ticket).await
    }
}
