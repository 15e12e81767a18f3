/// Wiring of all services over one backend
use crate::backend::{AccountBackend, AppwriteBackend, DocumentStore, FileStorage};
use crate::config::Config;
use crate::error::SocialResult;
use crate::services::{
    AccountService, FeedPager, InfiniteFeed, InteractionManager, PostPipeline, PostQueries,
};
use std::sync::Arc;

pub struct SocialClient {
    pub accounts: AccountService,
    pub interactions: InteractionManager,
    pub posts: PostPipeline,
    pub queries: PostQueries,
    pager: FeedPager,
}

impl SocialClient {
    /// Client talking to the configured HTTP backend
    pub fn from_config(config: &Config) -> SocialResult<Self> {
        let backend = Arc::new(AppwriteBackend::new(config)?);
        Ok(Self::with_backend(backend, config))
    }

    /// Client over any backend implementing all three collaborator traits
    pub fn with_backend<B>(backend: Arc<B>, config: &Config) -> Self
    where
        B: AccountBackend + DocumentStore + FileStorage + 'static,
    {
        let store: Arc<dyn DocumentStore> = backend.clone();
        let storage: Arc<dyn FileStorage> = backend.clone();
        let accounts: Arc<dyn AccountBackend> = backend;

        Self {
            accounts: AccountService::new(accounts, store.clone()),
            interactions: InteractionManager::new(store.clone(), config.interactions.clone()),
            posts: PostPipeline::new(store.clone(), storage),
            queries: PostQueries::new(store.clone(), config.feed.recent_limit),
            pager: FeedPager::new(store, config.feed.page_size),
        }
    }

    pub fn pager(&self) -> &FeedPager {
        &self.pager
    }

    /// Fresh infinite-feed session starting at the first page
    pub fn feed(&self) -> InfiniteFeed {
        InfiniteFeed::new(self.pager.clone())
    }
}
