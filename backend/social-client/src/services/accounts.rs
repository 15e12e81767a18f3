/// Account service - sign-up, sign-in, sign-out, current user
use crate::backend::{AccountBackend, DocumentStore, Query};
use crate::domain::{Credentials, NewUser, Session, User, UserDocument};
use crate::error::{SocialError, SocialResult};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountBackend>,
    store: Arc<dyn DocumentStore>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountBackend>, store: Arc<dyn DocumentStore>) -> Self {
        Self { accounts, store }
    }

    /// Create the auth account, then the profile document with an initials avatar
    pub async fn sign_up(&self, user: &NewUser) -> SocialResult<User> {
        let account = self.accounts.create_account(user).await?;
        let image_url = self.accounts.initials_avatar_url(&account.name);

        let doc = UserDocument {
            account_id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            username: user.username.clone(),
            image_url,
        };

        match self.store.create_user(&doc).await {
            Ok(profile) => {
                info!(user_id = %profile.id, account_id = %account.id, "user signed up");
                Ok(profile)
            }
            Err(err) => {
                // the account exists but has no profile; current_user reports NotFound
                error!(account_id = %account.id, "profile write failed: {}", err);
                Err(err)
            }
        }
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> SocialResult<Session> {
        let session = self.accounts.create_email_session(credentials).await?;
        info!(account_id = %session.user_id, "session created");
        Ok(session)
    }

    pub async fn sign_out(&self) -> SocialResult<()> {
        self.accounts.delete_session("current").await?;
        info!("session deleted");
        Ok(())
    }

    /// Profile of the signed-in account
    pub async fn current_user(&self) -> SocialResult<User> {
        let account = self.accounts.get_account().await?;
        let users = self
            .store
            .list_users(&[Query::equal("accountId", account.id.as_str())])
            .await?;

        users.documents.into_iter().next().ok_or_else(|| {
            SocialError::NotFound(format!("no profile for account {}", account.id))
        })
    }
}
