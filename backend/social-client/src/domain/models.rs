use super::relation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stored image attached to a post: the served preview URL plus the storage
/// object it was derived from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub image_url: String,
    pub image_id: String,
}

/// Set of user ids that liked a post
///
/// Ordered so the replacement write sent to the backend is deterministic;
/// membership is all that matters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct LikeSet(BTreeSet<String>);

impl LikeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.0.contains(user_id)
    }

    /// Flip membership of `user_id`; returns true if the user now likes the post
    pub fn toggle(&mut self, user_id: &str) -> bool {
        if self.0.remove(user_id) {
            false
        } else {
            self.0.insert(user_id.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for LikeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'de> Deserialize<'de> for LikeSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        relation::many(deserializer).map(|ids| ids.into_iter().collect())
    }
}

/// Post entity as stored in the posts collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(deserialize_with = "relation::one")]
    pub creator: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub image: ImageRef,
    #[serde(default)]
    pub likes: LikeSet,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Bookmark relation between a user and a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRecord {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default, deserialize_with = "relation::one")]
    pub user: String,
    #[serde(deserialize_with = "relation::one")]
    pub post: String,
}

/// Profile document in the users collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Saved records owned by this user
    #[serde(default)]
    pub save: Vec<SavedRecord>,
}

/// Authentication account, distinct from the profile document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub expire: Option<DateTime<Utc>>,
}

/// Object returned by the storage backend after an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size_original: u64,
}

/// File selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Pagination boundary: id of the last post on the previous page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a list query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentList<T> {
    pub total: u64,
    pub documents: Vec<T>,
}

// ============================================================================
// Mutation inputs
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewPost {
    pub creator_id: String,
    pub caption: String,
    pub location: String,
    /// Free-text comma separated tags, e.g. "art, travel"
    pub tags: Option<String>,
    pub file: FileUpload,
}

#[derive(Debug, Clone)]
pub struct UpdatePost {
    pub post_id: String,
    pub caption: String,
    pub location: String,
    pub tags: Option<String>,
    /// Image currently stored on the post
    pub image: ImageRef,
    /// Replacement image, if the user picked one
    pub file: Option<FileUpload>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// ============================================================================
// Document payloads
// ============================================================================

/// Body of a post create
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDocument {
    pub creator: String,
    pub caption: String,
    #[serde(flatten)]
    pub image: ImageRef,
    pub location: String,
    pub tags: Vec<String>,
}

/// Body of a post update; creator and likes are never touched here
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    pub caption: String,
    #[serde(flatten)]
    pub image: ImageRef,
    pub location: String,
    pub tags: Vec<String>,
}

/// Full replacement of a post's likers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikesUpdate {
    pub likes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveDocument {
    pub user: String,
    pub post: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub account_id: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub image_url: String,
}
