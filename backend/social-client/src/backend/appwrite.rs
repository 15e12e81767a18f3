//! HTTP adapter for an Appwrite-compatible REST backend
//!
//! Sessions ride on the cookie returned by the email-session endpoint, the
//! same way the browser SDK keeps them.
use super::{AccountBackend, DocumentStore, FileStorage, Query};
use crate::config::{BackendConfig, Config};
use crate::domain::{
    Account, Credentials, DocumentList, FileUpload, LikeSet, LikesUpdate, NewUser, Post,
    PostDocument, PostUpdate, SaveDocument, SavedRecord, Session, StoredFile, User, UserDocument,
};
use crate::error::{SocialError, SocialResult};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storage_utils::StorageConfig;
use tracing::{debug, info, warn};

/// Response format version the payload types are written against
const RESPONSE_FORMAT: &str = "1.4.0";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocument<'a, T: Serialize> {
    document_id: &'a str,
    data: &'a T,
}

#[derive(Serialize)]
struct PatchDocument<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountBody<'a> {
    user_id: &'a str,
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct EmailSessionBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client-generated document id, 32 lowercase hex chars
pub fn unique_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub struct AppwriteBackend {
    http: Client,
    backend: BackendConfig,
    storage: StorageConfig,
}

impl AppwriteBackend {
    pub fn new(config: &Config) -> SocialResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Appwrite-Project",
            HeaderValue::from_str(&config.backend.project_id).map_err(|e| {
                SocialError::InvalidInput(format!("project id is not a valid header: {e}"))
            })?,
        );
        headers.insert(
            "X-Appwrite-Response-Format",
            HeaderValue::from_static(RESPONSE_FORMAT),
        );

        let http = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.backend.request_timeout_secs))
            .build()
            .map_err(|e| SocialError::Internal(format!("Failed to create HTTP client: {e}")))?;

        info!(
            endpoint = %config.backend.endpoint,
            project = %config.backend.project_id,
            "backend client initialized"
        );

        Ok(Self {
            http,
            backend: config.backend.clone(),
            storage: config.storage.clone(),
        })
    }

    fn base(&self) -> &str {
        self.backend.endpoint.trim_end_matches('/')
    }

    fn documents_url(&self, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base(),
            self.backend.database_id,
            collection_id
        )
    }

    fn document_url(&self, collection_id: &str, document_id: &str) -> String {
        format!("{}/{}", self.documents_url(collection_id), document_id)
    }

    async fn check(response: Response, op: &'static str) -> SocialResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (message, kind) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.message, body.kind),
            Err(_) => (text, String::new()),
        };
        warn!(op, status = status.as_u16(), kind = %kind, "backend rejected request: {}", message);

        Err(SocialError::from_status(status.as_u16(), format!("{op}: {message}")))
    }

    async fn send<T: DeserializeOwned + Send>(
        &self,
        request: RequestBuilder,
        op: &'static str,
    ) -> SocialResult<T> {
        let response = request.send().await.map_err(|e| {
            warn!(op, "request failed: {}", e);
            SocialError::from(e)
        })?;
        let response = Self::check(response, op).await?;
        let value = response.json::<T>().await?;
        debug!(op, "backend call succeeded");
        Ok(value)
    }

    async fn send_empty(&self, request: RequestBuilder, op: &'static str) -> SocialResult<()> {
        let response = request.send().await.map_err(|e| {
            warn!(op, "request failed: {}", e);
            SocialError::from(e)
        })?;
        Self::check(response, op).await?;
        debug!(op, "backend call succeeded");
        Ok(())
    }

    async fn create_document<T: Serialize + Sync, R: DeserializeOwned + Send>(
        &self,
        collection_id: &str,
        data: &T,
        op: &'static str,
    ) -> SocialResult<R> {
        let document_id = unique_id();
        let body = CreateDocument {
            document_id: &document_id,
            data,
        };
        self.send(
            self.http.post(self.documents_url(collection_id)).json(&body),
            op,
        )
        .await
    }

    async fn patch_document<T: Serialize + Sync, R: DeserializeOwned + Send>(
        &self,
        collection_id: &str,
        document_id: &str,
        data: &T,
        op: &'static str,
    ) -> SocialResult<R> {
        self.send(
            self.http
                .patch(self.document_url(collection_id, document_id))
                .json(&PatchDocument { data }),
            op,
        )
        .await
    }

    async fn list_documents<R: DeserializeOwned + Send>(
        &self,
        collection_id: &str,
        queries: &[Query],
        op: &'static str,
    ) -> SocialResult<DocumentList<R>> {
        let params: Vec<(&str, String)> =
            queries.iter().map(|q| ("queries[]", q.to_string())).collect();
        self.send(
            self.http.get(self.documents_url(collection_id)).query(&params),
            op,
        )
        .await
    }
}

#[async_trait::async_trait]
impl AccountBackend for AppwriteBackend {
    async fn create_account(&self, user: &NewUser) -> SocialResult<Account> {
        let user_id = unique_id();
        let body = CreateAccountBody {
            user_id: &user_id,
            email: &user.email,
            password: &user.password,
            name: &user.name,
        };
        self.send(
            self.http.post(format!("{}/account", self.base())).json(&body),
            "create_account",
        )
        .await
    }

    async fn create_email_session(&self, credentials: &Credentials) -> SocialResult<Session> {
        let body = EmailSessionBody {
            email: &credentials.email,
            password: &credentials.password,
        };
        self.send(
            self.http
                .post(format!("{}/account/sessions/email", self.base()))
                .json(&body),
            "create_email_session",
        )
        .await
    }

    async fn delete_session(&self, session_id: &str) -> SocialResult<()> {
        self.send_empty(
            self.http
                .delete(format!("{}/account/sessions/{}", self.base(), session_id)),
            "delete_session",
        )
        .await
    }

    async fn get_account(&self) -> SocialResult<Account> {
        self.send(
            self.http.get(format!("{}/account", self.base())),
            "get_account",
        )
        .await
    }

    fn initials_avatar_url(&self, name: &str) -> String {
        self.storage.initials_avatar_url(name)
    }
}

#[async_trait::async_trait]
impl DocumentStore for AppwriteBackend {
    async fn create_post(&self, doc: &PostDocument) -> SocialResult<Post> {
        self.create_document(&self.backend.post_collection_id, doc, "create_post")
            .await
    }

    async fn update_post(&self, post_id: &str, doc: &PostUpdate) -> SocialResult<Post> {
        self.patch_document(&self.backend.post_collection_id, post_id, doc, "update_post")
            .await
    }

    async fn update_likes(&self, post_id: &str, likes: &LikeSet) -> SocialResult<Post> {
        let body = LikesUpdate {
            likes: likes.to_vec(),
        };
        self.patch_document(
            &self.backend.post_collection_id,
            post_id,
            &body,
            "update_likes",
        )
        .await
    }

    async fn delete_post(&self, post_id: &str) -> SocialResult<()> {
        self.send_empty(
            self.http
                .delete(self.document_url(&self.backend.post_collection_id, post_id)),
            "delete_post",
        )
        .await
    }

    async fn get_post(&self, post_id: &str) -> SocialResult<Post> {
        self.send(
            self.http
                .get(self.document_url(&self.backend.post_collection_id, post_id)),
            "get_post",
        )
        .await
    }

    async fn list_posts(&self, queries: &[Query]) -> SocialResult<DocumentList<Post>> {
        self.list_documents(&self.backend.post_collection_id, queries, "list_posts")
            .await
    }

    async fn create_saved(&self, user_id: &str, post_id: &str) -> SocialResult<SavedRecord> {
        let body = SaveDocument {
            user: user_id.to_string(),
            post: post_id.to_string(),
        };
        self.create_document(&self.backend.saves_collection_id, &body, "create_saved")
            .await
    }

    async fn delete_saved(&self, record_id: &str) -> SocialResult<()> {
        self.send_empty(
            self.http
                .delete(self.document_url(&self.backend.saves_collection_id, record_id)),
            "delete_saved",
        )
        .await
    }

    async fn create_user(&self, doc: &UserDocument) -> SocialResult<User> {
        self.create_document(&self.backend.user_collection_id, doc, "create_user")
            .await
    }

    async fn list_users(&self, queries: &[Query]) -> SocialResult<DocumentList<User>> {
        self.list_documents(&self.backend.user_collection_id, queries, "list_users")
            .await
    }
}

#[async_trait::async_trait]
impl FileStorage for AppwriteBackend {
    async fn upload_file(&self, file: &FileUpload) -> SocialResult<StoredFile> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| SocialError::InvalidInput(format!("bad mime type: {e}")))?;
        let form = Form::new().text("fileId", unique_id()).part("file", part);

        self.send(
            self.http.post(self.storage.files_url()).multipart(form),
            "upload_file",
        )
        .await
        .map_err(|e| match e {
            SocialError::AuthFailure(_) | SocialError::NetworkFailure(_) => e,
            other => SocialError::UploadFailure(other.to_string()),
        })
    }

    fn file_preview(&self, file_id: &str) -> SocialResult<String> {
        Ok(self.storage.preview_url(file_id)?)
    }

    async fn delete_file(&self, file_id: &str) -> SocialResult<()> {
        let url = self.storage.file_url(file_id)?;
        self.send_empty(self.http.delete(url), "delete_file").await
    }
}
