//! In-memory backend for integration tests
//!
//! Implements all three collaborator traits over plain maps. Failures can be
//! injected per operation and every call is counted, so tests can assert both
//! outcomes and the exact writes that were issued.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use social_client::backend::{AccountBackend, DocumentStore, FileStorage, Query};
use social_client::config::{BackendConfig, Config, FeedConfig, InteractionConfig};
use social_client::domain::{
    Account, Credentials, DocumentList, FileUpload, ImageRef, LikeSet, NewUser, Post,
    PostDocument, PostUpdate, SavedRecord, Session, StoredFile, User, UserDocument,
};
use social_client::{SocialError, SocialResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use storage_utils::{PreviewOptions, StorageConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateAccount,
    CreateSession,
    DeleteSession,
    GetAccount,
    CreatePost,
    UpdatePost,
    UpdateLikes,
    DeletePost,
    GetPost,
    ListPosts,
    CreateSaved,
    DeleteSaved,
    CreateUser,
    ListUsers,
    UploadFile,
    FilePreview,
    DeleteFile,
}

#[derive(Default)]
struct State {
    posts: HashMap<String, Post>,
    saves: HashMap<String, SavedRecord>,
    users: HashMap<String, User>,
    accounts: HashMap<String, (Account, String)>,
    files: HashMap<String, FileUpload>,
    session: Option<Session>,
    next_id: u64,
    clock: i64,
    failures: HashMap<Op, VecDeque<SocialError>>,
    calls: HashMap<Op, usize>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        base_time() + Duration::seconds(self.clock)
    }

    fn enter(&mut self, op: Op) -> SocialResult<()> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with `err`
    pub fn fail_next(&self, op: Op, err: SocialError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(err);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    /// Insert a post directly, bypassing call counting
    pub fn seed_post(&self, creator: &str, caption: &str, likes: &[&str]) -> Post {
        let mut state = self.state.lock().unwrap();
        let id = state.id("post");
        let now = state.tick();
        let post = Post {
            id: id.clone(),
            creator: creator.to_string(),
            caption: caption.to_string(),
            location: String::new(),
            tags: Vec::new(),
            image: ImageRef {
                image_url: format!("https://img/{}", id),
                image_id: format!("file-{}", id),
            },
            likes: likes.iter().copied().collect(),
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(id, post.clone());
        post
    }

    pub fn seed_account(&self, name: &str, email: &str, password: &str) -> Account {
        let mut state = self.state.lock().unwrap();
        let id = state.id("acc");
        let account = Account {
            id: id.clone(),
            name: name.to_string(),
            email: email.to_string(),
        };
        state
            .accounts
            .insert(id, (account.clone(), password.to_string()));
        account
    }

    pub fn post(&self, post_id: &str) -> Option<Post> {
        self.state.lock().unwrap().posts.get(post_id).cloned()
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().unwrap().posts.len()
    }

    pub fn saves_for(&self, user_id: &str, post_id: &str) -> Vec<SavedRecord> {
        self.state
            .lock()
            .unwrap()
            .saves
            .values()
            .filter(|r| r.user == user_id && r.post == post_id)
            .cloned()
            .collect()
    }

    pub fn file_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.lock().unwrap().files.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn has_file(&self, file_id: &str) -> bool {
        self.state.lock().unwrap().files.contains_key(file_id)
    }

    pub fn seed_file(&self, file_id: &str) {
        self.state.lock().unwrap().files.insert(
            file_id.to_string(),
            FileUpload {
                file_name: format!("{}.png", file_id),
                mime_type: "image/png".into(),
                bytes: vec![0u8; 4],
            },
        );
    }
}

fn apply_queries(mut posts: Vec<Post>, queries: &[Query]) -> SocialResult<Vec<Post>> {
    let mut limit = 25usize;
    let mut cursor = None;

    for query in queries {
        match query {
            Query::Equal(attr, values) if attr == "creator" => {
                posts.retain(|p| values.contains(&p.creator));
            }
            Query::Search(attr, term) if attr == "caption" => {
                let term = term.to_lowercase();
                posts.retain(|p| p.caption.to_lowercase().contains(&term));
            }
            Query::OrderDesc(attr) => match attr.as_str() {
                "$updatedAt" => posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
                "$createdAt" => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
                other => return Err(SocialError::InvalidInput(format!("unknown sort {}", other))),
            },
            Query::Limit(n) => limit = *n as usize,
            Query::CursorAfter(id) => cursor = Some(id.clone()),
            other => return Err(SocialError::InvalidInput(format!("unsupported {}", other))),
        }
    }

    let start = match cursor {
        Some(id) => {
            posts
                .iter()
                .position(|p| p.id == id)
                .ok_or_else(|| SocialError::NotFound(format!("cursor document {}", id)))?
                + 1
        }
        None => 0,
    };

    Ok(posts.into_iter().skip(start).take(limit).collect())
}

#[async_trait::async_trait]
impl AccountBackend for FakeBackend {
    async fn create_account(&self, user: &NewUser) -> SocialResult<Account> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::CreateAccount)?;
        if state.accounts.values().any(|(a, _)| a.email == user.email) {
            return Err(SocialError::WriteConflict("account already exists".into()));
        }
        let id = state.id("acc");
        let account = Account {
            id: id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        };
        state
            .accounts
            .insert(id, (account.clone(), user.password.clone()));
        Ok(account)
    }

    async fn create_email_session(&self, credentials: &Credentials) -> SocialResult<Session> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::CreateSession)?;
        let account = state
            .accounts
            .values()
            .find(|(a, pw)| a.email == credentials.email && *pw == credentials.password)
            .map(|(a, _)| a.clone())
            .ok_or_else(|| SocialError::AuthFailure("invalid credentials".into()))?;
        let id = state.id("sess");
        let session = Session {
            id,
            user_id: account.id,
            expire: None,
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn delete_session(&self, _session_id: &str) -> SocialResult<()> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::DeleteSession)?;
        state
            .session
            .take()
            .map(|_| ())
            .ok_or_else(|| SocialError::AuthFailure("no active session".into()))
    }

    async fn get_account(&self) -> SocialResult<Account> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::GetAccount)?;
        let account_id = state
            .session
            .as_ref()
            .map(|s| s.user_id.clone())
            .ok_or_else(|| SocialError::AuthFailure("no active session".into()))?;
        state
            .accounts
            .get(&account_id)
            .map(|(a, _)| a.clone())
            .ok_or_else(|| SocialError::NotFound(account_id))
    }

    fn initials_avatar_url(&self, name: &str) -> String {
        format!("https://avatars/initials?name={}", name.replace(' ', "%20"))
    }
}

#[async_trait::async_trait]
impl DocumentStore for FakeBackend {
    async fn create_post(&self, doc: &PostDocument) -> SocialResult<Post> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::CreatePost)?;
        let id = state.id("post");
        let now = state.tick();
        let post = Post {
            id: id.clone(),
            creator: doc.creator.clone(),
            caption: doc.caption.clone(),
            location: doc.location.clone(),
            tags: doc.tags.clone(),
            image: doc.image.clone(),
            likes: LikeSet::new(),
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, post_id: &str, doc: &PostUpdate) -> SocialResult<Post> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::UpdatePost)?;
        let now = state.tick();
        let post = state
            .posts
            .get_mut(post_id)
            .ok_or_else(|| SocialError::NotFound(post_id.to_string()))?;
        post.caption = doc.caption.clone();
        post.location = doc.location.clone();
        post.tags = doc.tags.clone();
        post.image = doc.image.clone();
        post.updated_at = now;
        Ok(post.clone())
    }

    async fn update_likes(&self, post_id: &str, likes: &LikeSet) -> SocialResult<Post> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::UpdateLikes)?;
        let now = state.tick();
        let post = state
            .posts
            .get_mut(post_id)
            .ok_or_else(|| SocialError::NotFound(post_id.to_string()))?;
        post.likes = likes.clone();
        post.updated_at = now;
        Ok(post.clone())
    }

    async fn delete_post(&self, post_id: &str) -> SocialResult<()> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::DeletePost)?;
        state
            .posts
            .remove(post_id)
            .map(|_| ())
            .ok_or_else(|| SocialError::NotFound(post_id.to_string()))
    }

    async fn get_post(&self, post_id: &str) -> SocialResult<Post> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::GetPost)?;
        state
            .posts
            .get(post_id)
            .cloned()
            .ok_or_else(|| SocialError::NotFound(post_id.to_string()))
    }

    async fn list_posts(&self, queries: &[Query]) -> SocialResult<DocumentList<Post>> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::ListPosts)?;
        let total = state.posts.len() as u64;
        let mut posts: Vec<Post> = state.posts.values().cloned().collect();
        posts.sort_by(|a, b| a.id.cmp(&b.id));
        let documents = apply_queries(posts, queries)?;
        Ok(DocumentList { total, documents })
    }

    async fn create_saved(&self, user_id: &str, post_id: &str) -> SocialResult<SavedRecord> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::CreateSaved)?;
        let id = state.id("save");
        let record = SavedRecord {
            id: id.clone(),
            user: user_id.to_string(),
            post: post_id.to_string(),
        };
        state.saves.insert(id, record.clone());
        Ok(record)
    }

    async fn delete_saved(&self, record_id: &str) -> SocialResult<()> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::DeleteSaved)?;
        state
            .saves
            .remove(record_id)
            .map(|_| ())
            .ok_or_else(|| SocialError::NotFound(record_id.to_string()))
    }

    async fn create_user(&self, doc: &UserDocument) -> SocialResult<User> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::CreateUser)?;
        let id = state.id("user");
        let user = User {
            id: id.clone(),
            account_id: doc.account_id.clone(),
            name: doc.name.clone(),
            username: Some(doc.username.clone()),
            email: doc.email.clone(),
            image_url: doc.image_url.clone(),
            bio: None,
            save: Vec::new(),
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn list_users(&self, queries: &[Query]) -> SocialResult<DocumentList<User>> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::ListUsers)?;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        for query in queries {
            if let Query::Equal(attr, values) = query {
                if attr == "accountId" {
                    users.retain(|u| values.contains(&u.account_id));
                }
            }
        }
        for user in users.iter_mut() {
            user.save = state
                .saves
                .values()
                .filter(|r| r.user == user.id)
                .cloned()
                .collect();
        }
        Ok(DocumentList {
            total: users.len() as u64,
            documents: users,
        })
    }
}

#[async_trait::async_trait]
impl FileStorage for FakeBackend {
    async fn upload_file(&self, file: &FileUpload) -> SocialResult<StoredFile> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::UploadFile)?;
        let id = state.id("file");
        state.files.insert(id.clone(), file.clone());
        Ok(StoredFile {
            id,
            name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
            size_original: file.bytes.len() as u64,
        })
    }

    fn file_preview(&self, file_id: &str) -> SocialResult<String> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::FilePreview)?;
        if !state.files.contains_key(file_id) {
            return Err(SocialError::NotFound(file_id.to_string()));
        }
        Ok(format!("https://img/{}/preview", file_id))
    }

    async fn delete_file(&self, file_id: &str) -> SocialResult<()> {
        let mut state = self.state.lock().unwrap();
        state.enter(Op::DeleteFile)?;
        state
            .files
            .remove(file_id)
            .map(|_| ())
            .ok_or_else(|| SocialError::NotFound(file_id.to_string()))
    }
}

pub fn test_config() -> Config {
    Config {
        backend: BackendConfig {
            endpoint: "http://localhost/v1".to_string(),
            project_id: "test".to_string(),
            database_id: "main".to_string(),
            post_collection_id: "posts".to_string(),
            saves_collection_id: "saves".to_string(),
            user_collection_id: "users".to_string(),
            request_timeout_secs: 5,
        },
        storage: StorageConfig {
            endpoint: "http://localhost/v1".to_string(),
            project_id: "test".to_string(),
            bucket_id: "media".to_string(),
            preview: PreviewOptions::default(),
        },
        feed: FeedConfig::default(),
        interactions: InteractionConfig::default(),
    }
}

pub fn image_file(name: &str) -> FileUpload {
    FileUpload {
        file_name: name.to_string(),
        mime_type: "image/jpeg".to_string(),
        bytes: vec![0xFF, 0xD8, 0xFF],
    }
}
