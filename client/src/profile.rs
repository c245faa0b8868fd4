use townsquare_shared::{FriendStatus, Profile, UserSummary};
use tracing::{debug, info};

use crate::context::Context;
use crate::error::{ActionError, ApiError};
use crate::messages;
use crate::notify::ToastKind;

/// How many recent search terms are kept.
pub const RECENT_SEARCHES: usize = 5;

/// Profile header data, user search and the friendship controls.
#[derive(Clone)]
pub struct Profiles {
    ctx: Context,
}

impl Profiles {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Public profile data. Failures are left to the caller to render.
    pub async fn profile(&self, username: &str) -> Result<Profile, ApiError> {
        self.ctx.api.profile(username).await
    }

    /// How the viewer relates to `username`. Anonymous viewers get `None`
    /// without a request.
    pub async fn friend_status(&self, username: &str) -> Result<FriendStatus, ApiError> {
        if !self.ctx.session().has_token() {
            return Ok(FriendStatus::None);
        }
        if self.ctx.session().is_viewer(username) {
            return Ok(FriendStatus::SelfProfile);
        }
        let response = self.ctx.api.friend_status(username).await?;
        Ok(response
            .status
            .as_deref()
            .map(FriendStatus::parse)
            .unwrap_or_default())
    }

    /// Incoming friend requests. Anonymous viewers have none, and no
    /// request is made for them.
    pub async fn pending_requests(&self) -> Result<Vec<UserSummary>, ApiError> {
        if !self.ctx.session().has_token() {
            return Ok(Vec::new());
        }
        let pending = self.ctx.api.pending_friend_requests().await?;
        debug!(count = pending.pending.len(), "pending friend requests");
        Ok(pending.pending)
    }

    /// Users whose name or email contains `query`. Blank queries match
    /// nobody without asking the server. Failures render inline, so nothing
    /// is toasted here.
    pub async fn search(&self, query: &str) -> Result<Vec<UserSummary>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.ctx.api.search_users(query).await?.users)
    }

    /// Put `term` at the front of the recent searches, dropping any
    /// earlier copy regardless of case.
    pub fn remember_search(&self, term: &str) -> Vec<String> {
        let term = term.trim();
        let session = self.ctx.session();
        if term.is_empty() {
            return session.recent_searches();
        }
        let lowered = term.to_lowercase();
        let mut recent = vec![term.to_string()];
        recent.extend(
            session
                .recent_searches()
                .into_iter()
                .filter(|t| t.to_lowercase() != lowered),
        );
        recent.truncate(RECENT_SEARCHES);
        session.set_recent_searches(&recent);
        recent
    }

    pub fn recent_searches(&self) -> Vec<String> {
        self.ctx.session().recent_searches()
    }

    pub async fn send_friend_request(&self, username: &str) -> Result<FriendStatus, ActionError> {
        self.ctx.require_token()?;
        match self.ctx.api.send_friend_request(username).await {
            Ok(action) => {
                info!(to = username, "friend request sent");
                self.ctx.notify(
                    ToastKind::Success,
                    action.message.as_deref().unwrap_or(messages::FRIEND_REQUEST_SENT),
                );
                Ok(action
                    .status
                    .as_deref()
                    .map(FriendStatus::parse)
                    .unwrap_or(FriendStatus::PendingOutgoing))
            }
            Err(err) => {
                self.ctx.report(&err, messages::NETWORK);
                Err(err.into())
            }
        }
    }

    pub async fn accept_friend_request(&self, username: &str) -> Result<FriendStatus, ActionError> {
        self.ctx.require_token()?;
        match self.ctx.api.accept_friend_request(username).await {
            Ok(action) => {
                info!(from = username, "friend request accepted");
                self.ctx.notify(
                    ToastKind::Success,
                    action
                        .message
                        .as_deref()
                        .unwrap_or(messages::FRIEND_REQUEST_ACCEPTED),
                );
                Ok(FriendStatus::Friends)
            }
            Err(err) => {
                self.ctx.report(&err, messages::NETWORK);
                Err(err.into())
            }
        }
    }
}
