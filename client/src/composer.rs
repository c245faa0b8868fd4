use std::cell::Cell;

use townsquare_shared::{CreatePost, Media, Post};
use tracing::{info, warn};

use crate::api::FilePart;
use crate::context::Context;
use crate::error::{ActionError, ApiError};
use crate::messages;
use crate::notify::ToastKind;

pub const MAX_ATTACHMENTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Picked locally, uploaded when the draft is published.
    Pending { file: FilePart, edited: bool },
    Uploaded(Media),
}

impl Attachment {
    pub fn pending(file: FilePart) -> Self {
        Attachment::Pending {
            file,
            edited: false,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Attachment::Pending { file, .. } => &file.filename,
            Attachment::Uploaded(media) => media.filename.as_deref().unwrap_or(&media.url),
        }
    }
}

/// Text plus attachments waiting to become a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub content: String,
    attachments: Vec<Attachment>,
}

impl Draft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    pub fn attach(&mut self, attachment: Attachment) -> Result<(), ActionError> {
        if self.attachments.len() >= MAX_ATTACHMENTS {
            return Err(ActionError::Validation(messages::TOO_MANY_ATTACHMENTS));
        }
        self.attachments.push(attachment);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && self.attachments.is_empty()
    }
}

/// Publishes drafts: uploads pending media one at a time, then creates the post.
pub struct Composer {
    ctx: Context,
    publishing: Cell<bool>,
}

impl Composer {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            publishing: Cell::new(false),
        }
    }

    pub fn is_publishing(&self) -> bool {
        self.publishing.get()
    }

    /// Upload what is still pending, then create the post. Each finished
    /// upload replaces its pending attachment in `draft`, so publishing
    /// again after a failure resumes where it stopped.
    pub async fn publish(&self, draft: &mut Draft) -> Result<Post, ActionError> {
        self.ctx.require_token()?;
        if draft.is_empty() {
            self.ctx.notify(ToastKind::Error, messages::EMPTY_POST);
            return Err(ActionError::Validation(messages::EMPTY_POST));
        }
        if self.publishing.replace(true) {
            return Err(ActionError::Busy);
        }
        let result = self.upload_and_create(draft).await;
        self.publishing.set(false);
        result
    }

    async fn upload_and_create(&self, draft: &mut Draft) -> Result<Post, ActionError> {
        let mut media = Vec::with_capacity(draft.attachments.len());
        for attachment in draft.attachments.iter_mut() {
            let done = match attachment {
                Attachment::Uploaded(done) => done.clone(),
                Attachment::Pending { file, edited } => self.upload(file, *edited).await?,
            };
            *attachment = Attachment::Uploaded(done.clone());
            media.push(done);
        }

        let payload = CreatePost {
            content: draft.content.trim().to_string(),
            media,
        };
        match self.ctx.api.create_post(&payload).await {
            Ok(created) => {
                info!(post_id = created.post.id, media = payload.media.len(), "post published");
                self.ctx.notify(ToastKind::Success, messages::POST_PUBLISHED);
                Ok(created.post)
            }
            Err(err) => {
                self.ctx.report(&err, messages::FAILED_CREATE_POST);
                Err(err.into())
            }
        }
    }

    async fn upload(&self, file: &FilePart, edited: bool) -> Result<Media, ActionError> {
        let size = file.bytes.len() as u64;
        match self.ctx.api.upload(file.clone()).await {
            Ok(uploaded) => Ok(Media {
                kind: uploaded.media_type,
                url: uploaded.url,
                filename: Some(if uploaded.filename.is_empty() {
                    file.filename.clone()
                } else {
                    uploaded.filename
                }),
                size: Some(size),
                edited,
            }),
            Err(err) => {
                warn!(filename = %file.filename, error = %err, "upload failed");
                match &err {
                    ApiError::Unauthorized { .. } => {
                        self.ctx.report(&err, messages::UPLOAD_FAILED)
                    }
                    _ => {
                        let reason = match &err {
                            ApiError::Rejected {
                                message: Some(message),
                                ..
                            } => message.as_str(),
                            ApiError::Network(_) => messages::NETWORK,
                            _ => messages::UPLOAD_FAILED,
                        };
                        self.ctx.notify(
                            ToastKind::Error,
                            &messages::upload_failed(&file.filename, reason),
                        );
                    }
                }
                Err(err.into())
            }
        }
    }
}
