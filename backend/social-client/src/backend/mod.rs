//! Collaborator interfaces for the hosted backend
//!
//! The client never talks to the network directly; every service holds one of
//! these traits so the HTTP adapter can be swapped for a fake in tests.
use crate::domain::{
    Account, Credentials, DocumentList, FileUpload, LikeSet, NewUser, Post, PostDocument,
    PostUpdate, SavedRecord, Session, StoredFile, User, UserDocument,
};
use crate::error::SocialResult;

pub mod appwrite;
pub mod query;

pub use appwrite::AppwriteBackend;
pub use query::Query;

/// Account and session operations
#[async_trait::async_trait]
pub trait AccountBackend: Send + Sync {
    async fn create_account(&self, user: &NewUser) -> SocialResult<Account>;

    async fn create_email_session(&self, credentials: &Credentials) -> SocialResult<Session>;

    /// Delete a session; `"current"` addresses the caller's own session
    async fn delete_session(&self, session_id: &str) -> SocialResult<()>;

    /// Account behind the active session
    async fn get_account(&self) -> SocialResult<Account>;

    /// Generated avatar URL for a display name
    fn initials_avatar_url(&self, name: &str) -> String;
}

/// Document reads and writes against the posts, saves, and users collections
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_post(&self, doc: &PostDocument) -> SocialResult<Post>;

    async fn update_post(&self, post_id: &str, doc: &PostUpdate) -> SocialResult<Post>;

    /// Replace the full liker array of a post (no merge)
    async fn update_likes(&self, post_id: &str, likes: &LikeSet) -> SocialResult<Post>;

    async fn delete_post(&self, post_id: &str) -> SocialResult<()>;

    async fn get_post(&self, post_id: &str) -> SocialResult<Post>;

    async fn list_posts(&self, queries: &[Query]) -> SocialResult<DocumentList<Post>>;

    async fn create_saved(&self, user_id: &str, post_id: &str) -> SocialResult<SavedRecord>;

    async fn delete_saved(&self, record_id: &str) -> SocialResult<()>;

    async fn create_user(&self, doc: &UserDocument) -> SocialResult<User>;

    async fn list_users(&self, queries: &[Query]) -> SocialResult<DocumentList<User>>;
}

/// Binary object storage
#[async_trait::async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload_file(&self, file: &FileUpload) -> SocialResult<StoredFile>;

    /// Transformed preview URL for an uploaded image
    fn file_preview(&self, file_id: &str) -> SocialResult<String>;

    async fn delete_file(&self, file_id: &str) -> SocialResult<()>;
}
