use serde::{Deserialize, Serialize};

pub type PostId = i64;
pub type CommentId = i64;

// ── Auth ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// The server accepts either an email address or a username here.
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
}

/// Error envelope. The server puts a human readable `message` on most
/// failures and an extra `detail` on 401s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

// ── Posts ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Set when a photo filter or video trim was applied before upload.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub edited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub shares: i64,
    #[serde(rename = "likedByMe", default)]
    pub liked_by_me: bool,
    #[serde(default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostsPage {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(rename = "hasMore", default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePost {
    pub content: String,
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCreated {
    pub post: Post,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePost {
    pub content: String,
}

/// Edit response. Only the confirmed content is read back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostUpdated {
    #[serde(default)]
    pub post: Option<PostPatch>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostPatch {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LikeToggled {
    pub likes: i64,
    pub liked: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Shared {
    pub shares: i64,
}

// ── Comments ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentList {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentAdded {
    pub comment: Comment,
    /// New comment count for the post.
    #[serde(default)]
    pub comments: Option<i64>,
}

// ── Media upload ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Uploaded {
    pub url: String,
    pub media_type: MediaKind,
    #[serde(default)]
    pub filename: String,
}

// ── Profiles & friends ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(rename = "friendsCount", default)]
    pub friends_count: i64,
    #[serde(rename = "profilePicUrl", default)]
    pub profile_pic_url: Option<String>,
    #[serde(rename = "coverPicUrl", default)]
    pub cover_pic_url: Option<String>,
    #[serde(rename = "postsCount", default)]
    pub posts_count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FriendStatus {
    /// The viewer is looking at their own profile.
    SelfProfile,
    #[default]
    None,
    PendingOutgoing,
    PendingIncoming,
    Friends,
}

impl FriendStatus {
    /// Unknown values map to `None`, matching how the server answers for
    /// anonymous viewers.
    pub fn parse(s: &str) -> Self {
        match s {
            "self" => FriendStatus::SelfProfile,
            "pending_outgoing" | "pending" => FriendStatus::PendingOutgoing,
            "pending_incoming" => FriendStatus::PendingIncoming,
            "friends" => FriendStatus::Friends,
            _ => FriendStatus::None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FriendStatusResponse {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendAccept {
    pub from: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FriendAction {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A user as listed by search results and pending friend requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSearchResults {
    #[serde(default)]
    pub users: Vec<UserSummary>,
}

/// Incoming friend requests, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingRequests {
    #[serde(default)]
    pub pending: Vec<UserSummary>,
}

// ── Notifications ──

/// Counts since the last poll. Likes and comments are only counted when
/// the request carried a `since` timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSummary {
    #[serde(rename = "pendingFriendRequests", default)]
    pub pending_friend_requests: u32,
    #[serde(rename = "newLikes", default)]
    pub new_likes: u32,
    #[serde(rename = "newComments", default)]
    pub new_comments: u32,
}

impl NotificationSummary {
    pub fn is_empty(&self) -> bool {
        self.pending_friend_requests == 0 && self.new_likes == 0 && self.new_comments == 0
    }
}

// ── Stories ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    #[serde(default)]
    pub content: Option<String>,
    /// Free-form on the server; `image` unless the author said otherwise.
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub expires_at: String,
    pub username: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Active stories, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoriesList {
    #[serde(default)]
    pub stories: Vec<Story>,
}
