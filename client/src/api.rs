use std::rc::Rc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use townsquare_shared::*;
use tracing::{debug, warn};

use crate::error::{ApiError, TransportError};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    /// Multipart upload with a single `file` field.
    File(FilePart),
}

/// One HTTP exchange as the core sees it. `path` is relative to the API base.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves requests to the server. Futures are not `Send`: the client runs on
/// a single event loop, the browser's or a current-thread runtime.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// Typed access to the REST API. Injects `Authorization: Bearer <token>`
/// whenever the session holds a token.
#[derive(Clone)]
pub struct ApiClient {
    transport: Rc<dyn Transport>,
    session: Rc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(transport: Rc<dyn Transport>, session: Rc<dyn SessionStore>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Rc<dyn SessionStore> {
        &self.session
    }

    // ── Posts ──

    pub async fn feed_page(&self, page: u32, limit: u32) -> Result<PostsPage, ApiError> {
        self.get(format!("/api/posts?page={page}&limit={limit}")).await
    }

    pub async fn user_posts(
        &self,
        username: &str,
        page: u32,
        limit: u32,
    ) -> Result<PostsPage, ApiError> {
        self.get(format!(
            "/api/users/{}/posts?page={page}&limit={limit}",
            urlencoding::encode(username)
        ))
        .await
    }

    pub async fn create_post(&self, payload: &CreatePost) -> Result<PostCreated, ApiError> {
        self.send_json(Method::Post, "/api/posts".to_string(), payload).await
    }

    pub async fn update_post(&self, id: PostId, content: &str) -> Result<PostUpdated, ApiError> {
        let payload = UpdatePost {
            content: content.to_string(),
        };
        self.send_json(Method::Put, format!("/api/posts/{id}"), &payload)
            .await
    }

    pub async fn delete_post(&self, id: PostId) -> Result<(), ApiError> {
        self.call::<ApiMessage>(Method::Delete, format!("/api/posts/{id}"), Body::Empty)
            .await
            .map(|_| ())
    }

    pub async fn toggle_like(&self, id: PostId) -> Result<LikeToggled, ApiError> {
        self.call(Method::Post, format!("/api/posts/{id}/like"), Body::Empty)
            .await
    }

    pub async fn share(&self, id: PostId) -> Result<Shared, ApiError> {
        self.call(Method::Post, format!("/api/posts/{id}/share"), Body::Empty)
            .await
    }

    // ── Comments ──

    pub async fn comments(&self, id: PostId) -> Result<CommentList, ApiError> {
        self.get(format!("/api/posts/{id}/comments")).await
    }

    pub async fn add_comment(&self, id: PostId, content: &str) -> Result<CommentAdded, ApiError> {
        let payload = CreateComment {
            content: content.to_string(),
        };
        self.send_json(Method::Post, format!("/api/posts/{id}/comments"), &payload)
            .await
    }

    // ── Media ──

    pub async fn upload(&self, file: FilePart) -> Result<Uploaded, ApiError> {
        self.call(Method::Post, "/api/upload".to_string(), Body::File(file))
            .await
    }

    // ── Auth ──

    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let payload = LoginRequest {
            email: identifier.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::Post, "/api/login".to_string(), &payload)
            .await
    }

    pub async fn signup(&self, payload: &SignupRequest) -> Result<AuthResponse, ApiError> {
        self.send_json(Method::Post, "/api/signup".to_string(), payload)
            .await
    }

    // ── Profiles & friends ──

    pub async fn profile(&self, username: &str) -> Result<Profile, ApiError> {
        self.get(format!("/api/profile/{}", urlencoding::encode(username)))
            .await
    }

    pub async fn friend_status(&self, username: &str) -> Result<FriendStatusResponse, ApiError> {
        self.get(format!(
            "/api/friends/status?user={}",
            urlencoding::encode(username)
        ))
        .await
    }

    pub async fn send_friend_request(&self, username: &str) -> Result<FriendAction, ApiError> {
        let payload = FriendRequest {
            to: username.to_string(),
        };
        self.send_json(Method::Post, "/api/friends/request".to_string(), &payload)
            .await
    }

    pub async fn accept_friend_request(&self, username: &str) -> Result<FriendAction, ApiError> {
        let payload = FriendAccept {
            from: username.to_string(),
        };
        self.send_json(Method::Post, "/api/friends/accept".to_string(), &payload)
            .await
    }

    pub async fn pending_friend_requests(&self) -> Result<PendingRequests, ApiError> {
        self.get("/api/friends/pending".to_string()).await
    }

    pub async fn search_users(&self, query: &str) -> Result<UserSearchResults, ApiError> {
        self.get(format!("/api/users/search?q={}", urlencoding::encode(query)))
            .await
    }

    // ── Notifications & stories ──

    /// Without `since` the server counts pending friend requests only.
    pub async fn notifications_summary(
        &self,
        since: Option<&str>,
    ) -> Result<NotificationSummary, ApiError> {
        let path = match since {
            Some(since) => format!(
                "/api/notifications/summary?since={}",
                urlencoding::encode(since)
            ),
            None => "/api/notifications/summary".to_string(),
        };
        self.get(path).await
    }

    pub async fn stories(&self) -> Result<StoriesList, ApiError> {
        self.get("/api/stories".to_string()).await
    }

    // ── Plumbing ──

    async fn get<T: DeserializeOwned>(&self, path: String) -> Result<T, ApiError> {
        self.call(Method::Get, path, Body::Empty).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: String,
        payload: &B,
    ) -> Result<T, ApiError> {
        let value = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.call(method, path, Body::Json(value)).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        body: Body,
    ) -> Result<T, ApiError> {
        debug!(method = method.as_str(), %path, "api request");
        let request = Request {
            method,
            path: path.clone(),
            bearer: self.session.token(),
            body,
        };

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(method = method.as_str(), %path, error = %e, "api request failed");
            ApiError::from(e)
        })?;

        debug!(method = method.as_str(), %path, status = response.status, "api response");
        interpret(&response)
    }
}

/// Turn a raw response into the typed success body or the matching error.
/// A body that is not JSON is treated as `{}`.
pub fn interpret<T: DeserializeOwned>(response: &Response) -> Result<T, ApiError> {
    let data = parse_body(&response.body);

    if response.is_success() {
        return serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()));
    }

    let envelope: ApiMessage = serde_json::from_value(data).unwrap_or_default();
    if response.status == 401 {
        Err(ApiError::Unauthorized {
            detail: non_empty(envelope.detail),
        })
    } else {
        Err(ApiError::Rejected {
            status: response.status,
            message: non_empty(envelope.message),
        })
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::Object(Default::default()),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}
