use anyhow::{Context, Result};
use social_client::domain::Credentials;
use social_client::{Config, SocialClient};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,social_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Configuration loading failed")?;
    let client = SocialClient::from_config(&config).context("Failed to build backend client")?;

    // Sessions are optional: public feeds can be read anonymously
    if let (Ok(email), Ok(password)) = (
        std::env::var("SOCIAL_CLIENT_EMAIL"),
        std::env::var("SOCIAL_CLIENT_PASSWORD"),
    ) {
        match client.accounts.sign_in(&Credentials { email, password }).await {
            Ok(_) => {
                let user = client.accounts.current_user().await?;
                client.interactions.hydrate_saves(&user);
                info!(user_id = %user.id, saved = user.save.len(), "signed in");
            }
            Err(e) => warn!("sign-in failed, continuing anonymously: {}", e),
        }
    }

    let mut feed = client.feed();
    let mut total = 0usize;
    while let Some(posts) = feed.next_page().await? {
        for post in &posts {
            info!(
                post_id = %post.id,
                likes = post.likes.len(),
                tags = ?post.tags,
                "{}",
                post.caption
            );
        }
        total += posts.len();
    }

    info!(pages = feed.pages_loaded(), posts = total, "feed read to the end");
    Ok(())
}
