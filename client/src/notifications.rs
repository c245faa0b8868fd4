use townsquare_shared::NotificationSummary;
use tracing::debug;

use crate::context::Context;
use crate::error::ApiError;
use crate::messages;
use crate::notify::ToastKind;

/// Polls the notifications summary for the logged-in viewer.
///
/// The `since` cursor lives in the [`SessionStore`](crate::SessionStore) so
/// a reload picks up where the last poll stopped. The core has no clock:
/// callers pass the current time, which becomes the next cursor once the
/// poll succeeds.
#[derive(Clone)]
pub struct Notifications {
    ctx: Context,
}

impl Notifications {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Fetch the counts since the stored cursor and move it to `now`.
    /// Anonymous viewers get an empty summary without a request. A failed
    /// poll keeps the cursor, so the next one covers the gap.
    pub async fn summary(&self, now: &str) -> Result<NotificationSummary, ApiError> {
        let session = self.ctx.session();
        if !session.has_token() {
            return Ok(NotificationSummary::default());
        }
        let since = session.notifications_since();
        let summary = self.ctx.api.notifications_summary(since.as_deref()).await?;
        session.set_notifications_since(now);
        debug!(?since, ?summary, "notifications polled");
        Ok(summary)
    }

    /// Like [`summary`](Self::summary), then toast each non-zero count.
    /// Background polls fail silently.
    pub async fn poll(&self, now: &str) -> Option<NotificationSummary> {
        let summary = match self.summary(now).await {
            Ok(summary) => summary,
            Err(err) => {
                debug!(error = %err, "notification poll failed");
                return None;
            }
        };
        if summary.pending_friend_requests > 0 {
            self.ctx.notify(
                ToastKind::Info,
                &messages::pending_friend_requests(summary.pending_friend_requests),
            );
        }
        if summary.new_likes > 0 {
            self.ctx
                .notify(ToastKind::Info, &messages::new_likes(summary.new_likes));
        }
        if summary.new_comments > 0 {
            self.ctx
                .notify(ToastKind::Info, &messages::new_comments(summary.new_comments));
        }
        Some(summary)
    }
}
