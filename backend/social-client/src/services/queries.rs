/// Read-only post lookups outside the infinite feed
use crate::backend::query::CREATED_AT;
use crate::backend::{DocumentStore, Query};
use crate::domain::Post;
use crate::error::{SocialError, SocialResult};
use std::sync::Arc;

pub const DEFAULT_RECENT_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct PostQueries {
    store: Arc<dyn DocumentStore>,
    recent_limit: u32,
}

impl PostQueries {
    pub fn new(store: Arc<dyn DocumentStore>, recent_limit: u32) -> Self {
        Self {
            store,
            recent_limit: recent_limit.max(1),
        }
    }

    /// Newest posts by creation time
    pub async fn recent_posts(&self) -> SocialResult<Vec<Post>> {
        let queries = [Query::order_desc(CREATED_AT), Query::limit(self.recent_limit)];
        Ok(self.store.list_posts(&queries).await?.documents)
    }

    pub async fn post_by_id(&self, post_id: &str) -> SocialResult<Post> {
        if post_id.is_empty() {
            return Err(SocialError::InvalidInput("post id is required".into()));
        }
        self.store.get_post(post_id).await
    }

    /// Free-text search over captions
    pub async fn search_posts(&self, term: &str) -> SocialResult<Vec<Post>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let queries = [Query::search("caption", term)];
        Ok(self.store.list_posts(&queries).await?.documents)
    }

    /// Posts created by one user, newest first
    pub async fn posts_by_creator(&self, user_id: &str) -> SocialResult<Vec<Post>> {
        let queries = [Query::equal("creator", user_id), Query::order_desc(CREATED_AT)];
        Ok(self.store.list_posts(&queries).await?.documents)
    }
}
