pub mod accounts;
pub mod feed;
pub mod interactions;
pub mod posts;
pub mod queries;

pub use accounts::AccountService;
pub use feed::{FeedPage, FeedPager, InfiniteFeed};
pub use interactions::{InteractionManager, LikeTicket, LikeView, MutationState, SaveTicket};
pub use posts::{parse_tags, PendingUpload, PostPipeline};
pub use queries::PostQueries;
