use townsquare_shared::Story;
use tracing::debug;

use crate::context::Context;
use crate::error::ApiError;

/// The stories strip above the feed. Stories are public; the token is sent
/// when there is one.
#[derive(Clone)]
pub struct Stories {
    ctx: Context,
}

impl Stories {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Active stories, newest first. Failures render inline.
    pub async fn load(&self) -> Result<Vec<Story>, ApiError> {
        let list = self.ctx.api.stories().await?;
        debug!(count = list.stories.len(), "stories loaded");
        Ok(list.stories)
    }
}
