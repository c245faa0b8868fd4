//! English strings for every notification the client raises.

pub const LOGIN_REQUIRED: &str = "Please log in to continue.";
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";
pub const NETWORK: &str = "Network error";

pub const COULD_NOT_LOAD_FEED: &str = "Could not load feed.";
pub const COULD_NOT_LOAD_TIMELINE: &str = "Could not load timeline.";
pub const COULD_NOT_LOAD_MORE: &str = "Could not load more posts.";
pub const COULD_NOT_LOAD_COMMENTS: &str = "Could not load comments.";

pub const POST_PUBLISHED: &str = "Post published";
pub const FAILED_CREATE_POST: &str = "Failed to create post";
pub const EMPTY_POST: &str = "Please add some content or media to your post.";
pub const TOO_MANY_ATTACHMENTS: &str = "A post can carry at most 8 attachments.";
pub const UPLOAD_FAILED: &str = "Upload failed";

pub const POST_UPDATED: &str = "Post updated";
pub const FAILED_UPDATE_POST: &str = "Failed to update post";
pub const POST_DELETED: &str = "Post deleted";
pub const FAILED_DELETE_POST: &str = "Failed to delete post";
pub const DELETE_PROMPT: &str = "Delete this post?";
pub const FAILED_LIKE: &str = "Failed to like post";
pub const FAILED_SHARE: &str = "Failed to share post";

pub const FAILED_ADD_COMMENT: &str = "Failed to add comment";
pub const EMPTY_COMMENT: &str = "Comment is empty";

pub const LOGIN_SUCCESS: &str = "Login successful";
pub const LOGIN_FAILED: &str = "Login failed";
pub const SIGNUP_SUCCESS: &str = "Signup successful";
pub const SIGNUP_FAILED: &str = "Signup failed";
pub const MISSING_CREDENTIALS: &str = "Email/Username and password required";
pub const LOGGED_OUT: &str = "Logged out";

pub const FRIEND_REQUEST_SENT: &str = "Request sent";
pub const FRIEND_REQUEST_ACCEPTED: &str = "Friend request accepted";
pub const COULD_NOT_LOAD_FRIEND_REQUESTS: &str = "Could not load friend requests";
pub const SEARCH_FAILED: &str = "Search failed";

pub const COULD_NOT_LOAD_NOTIFICATIONS: &str = "Could not load notifications";
pub const COULD_NOT_LOAD_STORIES: &str = "Could not load stories";

fn plural(n: u32, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

pub fn pending_friend_requests(n: u32) -> String {
    format!("You have {}", plural(n, "friend request"))
}

pub fn new_likes(n: u32) -> String {
    format!("You received {}", plural(n, "new like"))
}

pub fn new_comments(n: u32) -> String {
    format!("You received {}", plural(n, "new comment"))
}

pub fn upload_failed(filename: &str, reason: &str) -> String {
    format!("Failed to upload {filename}: {reason}")
}
