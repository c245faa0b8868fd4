//! Paginated post lists with optimistic mutations.
//!
//! A [`Timeline`] owns one ordered list of posts for a [`Scope`], either the
//! global feed or a single author's posts. Two timelines never share state:
//! an edit made through the feed shows up in a profile timeline only after
//! that timeline reloads.
//!
//! All state lives in one `RefCell` that is never borrowed across an await
//! point. Each request captures the timeline's generation before
//! suspending; [`Timeline::close`] bumps it so late responses are dropped.
//! Like and comment replies also remember which copy of the post they were
//! issued against. A reload swaps in new copies, which those replies skip.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use townsquare_shared::{Comment, Post, PostId, PostsPage};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::clamp_page_size;
use crate::context::Context;
use crate::error::{ActionError, ApiError};
use crate::messages;
use crate::notify::ToastKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Feed,
    Author(String),
}

impl Scope {
    async fn fetch(&self, api: &ApiClient, page: u32, limit: u32) -> Result<PostsPage, ApiError> {
        match self {
            Scope::Feed => api.feed_page(page, limit).await,
            Scope::Author(username) => api.user_posts(username, page, limit).await,
        }
    }

    fn load_error(&self) -> &'static str {
        match self {
            Scope::Feed => messages::COULD_NOT_LOAD_FEED,
            Scope::Author(_) => messages::COULD_NOT_LOAD_TIMELINE,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Feed => f.write_str("feed"),
            Scope::Author(username) => write!(f, "profile:{username}"),
        }
    }
}

/// `Idle → LoadingFirst → (Ready | Failed)`, then
/// `Ready → LoadingMore → (Ready | FailedMore)`. Both failure states are left
/// by calling the matching load again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    LoadingFirst,
    Ready,
    Failed(String),
    LoadingMore,
    FailedMore(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::LoadingFirst | LoadState::LoadingMore)
    }
}

/// What a page load did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLoad {
    /// Posts were added. For a first page this is the full page length.
    Loaded(usize),
    /// The server said there is nothing after the current page.
    Exhausted,
    /// Another load for this timeline is already in flight.
    AlreadyLoading,
    /// There is no first page to continue from yet.
    NotReady,
}

/// The comments disclosure under a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentThread {
    pub open: bool,
    /// `None` until fetched for the first time.
    pub loaded: Option<Vec<Comment>>,
    pub loading: bool,
    pub error: Option<String>,
    pub draft: String,
    pub submitting: bool,
}

impl CommentThread {
    /// Comments to render: nothing while the disclosure is closed.
    pub fn visible(&self) -> &[Comment] {
        match (&self.loaded, self.open) {
            (Some(list), true) => list,
            _ => &[],
        }
    }
}

/// One loaded post plus the viewer-local state attached to it. Exists
/// exactly as long as the post is in the list.
#[derive(Debug, Clone, Eq)]
pub struct PostEntry {
    pub post: Post,
    /// Seeded from `likedByMe`, flipped optimistically, confirmed by the server.
    pub liked: bool,
    pub like_pending: bool,
    pub thread: CommentThread,
    /// Distinguishes this copy of the post from the one a reload replaces.
    serial: u64,
}

impl PostEntry {
    fn from_server(post: Post, serial: u64) -> Self {
        Self {
            liked: post.liked_by_me,
            post,
            like_pending: false,
            thread: CommentThread::default(),
            serial,
        }
    }

    pub fn id(&self) -> PostId {
        self.post.id
    }
}

/// Equal when everything visible matches; which copy it is does not count.
impl PartialEq for PostEntry {
    fn eq(&self, other: &Self) -> bool {
        self.post == other.post
            && self.liked == other.liked
            && self.like_pending == other.like_pending
            && self.thread == other.thread
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSnapshot {
    pub scope: Scope,
    pub load: LoadState,
    pub page: u32,
    pub has_more: bool,
    pub entries: Vec<PostEntry>,
}

impl TimelineSnapshot {
    pub fn entry(&self, id: PostId) -> Option<&PostEntry> {
        self.entries.iter().find(|e| e.post.id == id)
    }

    pub fn ids(&self) -> Vec<PostId> {
        self.entries.iter().map(PostEntry::id).collect()
    }
}

struct State {
    generation: u64,
    next_serial: u64,
    page_size: u32,
    page: u32,
    has_more: bool,
    load: LoadState,
    entries: Vec<PostEntry>,
}

impl State {
    fn entry_mut(&mut self, id: PostId) -> Option<&mut PostEntry> {
        self.entries.iter_mut().find(|e| e.post.id == id)
    }

    fn contains(&self, id: PostId) -> bool {
        self.entries.iter().any(|e| e.post.id == id)
    }

    /// The entry for `id` only if it is still the copy with `serial`.
    fn instance_mut(&mut self, id: PostId, serial: u64) -> Option<&mut PostEntry> {
        self.entry_mut(id).filter(|e| e.serial == serial)
    }

    fn admit(&mut self, post: Post) -> PostEntry {
        self.next_serial += 1;
        PostEntry::from_server(post, self.next_serial)
    }
}

type Listener = Rc<dyn Fn(&TimelineSnapshot)>;

pub struct Timeline {
    scope: Scope,
    ctx: Context,
    state: RefCell<State>,
    listeners: RefCell<Vec<Listener>>,
}

impl Timeline {
    pub fn new(scope: Scope, ctx: Context) -> Self {
        Self {
            scope,
            ctx,
            state: RefCell::new(State {
                generation: 0,
                next_serial: 0,
                page_size: crate::config::DEFAULT_PAGE_SIZE,
                page: 0,
                has_more: false,
                load: LoadState::Idle,
                entries: Vec::new(),
            }),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        let st = self.state.borrow();
        TimelineSnapshot {
            scope: self.scope.clone(),
            load: st.load.clone(),
            page: st.page,
            has_more: st.has_more,
            entries: st.entries.clone(),
        }
    }

    /// Called with a fresh snapshot after every state change.
    pub fn on_change(&self, listener: impl Fn(&TimelineSnapshot) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Whether the viewer may edit or delete `post`.
    pub fn is_own(&self, post: &Post) -> bool {
        self.ctx.session().is_viewer(&post.username)
    }

    /// Tear the view down. Responses still in flight are discarded.
    pub fn close(&self) {
        self.state.borrow_mut().generation += 1;
        self.listeners.borrow_mut().clear();
        debug!(scope = %self.scope, "timeline closed");
    }

    // ── Pagination ──

    /// Fetch page 1 and replace everything loaded so far.
    pub async fn load_first(&self, page_size: u32) -> Result<PageLoad, ActionError> {
        let (generation, limit) = {
            let mut st = self.state.borrow_mut();
            if st.load.is_loading() {
                return Ok(PageLoad::AlreadyLoading);
            }
            st.page_size = clamp_page_size(page_size);
            st.load = LoadState::LoadingFirst;
            (st.generation, st.page_size)
        };
        self.changed();
        debug!(scope = %self.scope, limit, "loading first page");

        let result = self.scope.fetch(&self.ctx.api, 1, limit).await;
        self.ensure_current(generation)?;

        match result {
            Ok(page) => {
                let count = page.posts.len();
                {
                    let mut st = self.state.borrow_mut();
                    let entries: Vec<PostEntry> =
                        page.posts.into_iter().map(|p| st.admit(p)).collect();
                    st.entries = entries;
                    st.page = page.page.unwrap_or(1);
                    st.has_more = page.has_more;
                    st.load = LoadState::Ready;
                }
                self.changed();
                Ok(PageLoad::Loaded(count))
            }
            Err(err) => {
                warn!(scope = %self.scope, error = %err, "first page failed");
                {
                    let mut st = self.state.borrow_mut();
                    st.entries.clear();
                    st.page = 0;
                    st.has_more = false;
                    st.load = LoadState::Failed(self.scope.load_error().to_string());
                }
                self.changed();
                Err(err.into())
            }
        }
    }

    /// Fetch the page after the current one and append it.
    pub async fn load_next(&self) -> Result<PageLoad, ActionError> {
        let (generation, next, limit) = {
            let mut st = self.state.borrow_mut();
            match st.load {
                LoadState::LoadingFirst | LoadState::LoadingMore => {
                    return Ok(PageLoad::AlreadyLoading)
                }
                LoadState::Idle | LoadState::Failed(_) => return Ok(PageLoad::NotReady),
                LoadState::Ready | LoadState::FailedMore(_) => {}
            }
            if !st.has_more {
                return Ok(PageLoad::Exhausted);
            }
            st.load = LoadState::LoadingMore;
            (st.generation, st.page + 1, st.page_size)
        };
        self.changed();
        debug!(scope = %self.scope, page = next, "loading next page");

        let result = self.scope.fetch(&self.ctx.api, next, limit).await;
        self.ensure_current(generation)?;

        match result {
            Ok(page) => {
                let appended = {
                    let mut st = self.state.borrow_mut();
                    let before = st.entries.len();
                    for post in page.posts {
                        // Offsets shift when new posts arrive upstream.
                        if !st.contains(post.id) {
                            let entry = st.admit(post);
                            st.entries.push(entry);
                        }
                    }
                    st.page = page.page.unwrap_or(next);
                    st.has_more = page.has_more;
                    st.load = LoadState::Ready;
                    st.entries.len() - before
                };
                self.changed();
                Ok(PageLoad::Loaded(appended))
            }
            Err(err) => {
                warn!(scope = %self.scope, page = next, error = %err, "next page failed");
                self.state.borrow_mut().load =
                    LoadState::FailedMore(messages::COULD_NOT_LOAD_MORE.to_string());
                self.changed();
                Err(err.into())
            }
        }
    }

    /// Put a freshly published post at the top, unless it is already listed.
    pub fn prepend_published(&self, post: Post) {
        {
            let mut st = self.state.borrow_mut();
            if st.contains(post.id) {
                return;
            }
            let entry = st.admit(post);
            st.entries.insert(0, entry);
        }
        self.changed();
    }

    // ── Post actions ──

    /// Flip the like immediately, then reconcile with the server. On any
    /// failure the exact prior flag and count are restored.
    pub async fn toggle_like(&self, id: PostId) -> Result<(), ActionError> {
        self.ctx.require_token()?;

        let (generation, serial, prev_liked, prev_likes) = {
            let mut st = self.state.borrow_mut();
            let generation = st.generation;
            let entry = st.entry_mut(id).ok_or(ActionError::UnknownPost(id))?;
            if entry.like_pending {
                return Err(ActionError::Busy);
            }
            let prev = (entry.liked, entry.post.likes);
            entry.liked = !prev.0;
            entry.post.likes = if entry.liked { prev.1 + 1 } else { prev.1 - 1 };
            entry.like_pending = true;
            (generation, entry.serial, prev.0, prev.1)
        };
        self.changed();

        let result = self.ctx.api.toggle_like(id).await;
        self.ensure_current(generation)?;

        match result {
            Ok(server) => {
                self.settle_like(id, serial, server.liked, server.likes);
                info!(scope = %self.scope, post_id = id, liked = server.liked, "like confirmed");
                Ok(())
            }
            Err(err) => {
                self.settle_like(id, serial, prev_liked, prev_likes);
                warn!(scope = %self.scope, post_id = id, "like rolled back");
                self.ctx.report(&err, messages::FAILED_LIKE);
                Err(err.into())
            }
        }
    }

    fn settle_like(&self, id: PostId, serial: u64, liked: bool, likes: i64) {
        {
            let mut st = self.state.borrow_mut();
            // A reload while the request was out replaced the entry. The
            // fresh copy, and any like started on it, is not ours to settle.
            match st.instance_mut(id, serial) {
                Some(entry) if entry.like_pending => {
                    entry.liked = liked;
                    entry.post.likes = likes;
                    entry.like_pending = false;
                }
                _ => return,
            }
        }
        self.changed();
    }

    /// Replace a post's content. `Err` means the editor should stay open.
    pub async fn edit_post(&self, id: PostId, content: &str) -> Result<(), ActionError> {
        self.ctx.require_token()?;
        let generation = self.known(id)?;
        if content.trim().is_empty() {
            return Err(ActionError::Validation("post content is empty"));
        }

        let result = self.ctx.api.update_post(id, content).await;
        self.ensure_current(generation)?;

        match result {
            Ok(updated) => {
                let confirmed = updated
                    .post
                    .and_then(|p| p.content)
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| content.to_string());
                self.update_entry(id, |entry| entry.post.content = confirmed);
                info!(scope = %self.scope, post_id = id, "post updated");
                self.ctx.notify(ToastKind::Success, messages::POST_UPDATED);
                Ok(())
            }
            Err(err) => {
                self.ctx.report(&err, messages::FAILED_UPDATE_POST);
                Err(err.into())
            }
        }
    }

    /// Remove a post after the user confirms and the server agrees.
    pub async fn delete_post(
        &self,
        id: PostId,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<(), ActionError> {
        self.ctx.require_token()?;
        let generation = self.known(id)?;
        if !confirm(messages::DELETE_PROMPT) {
            return Err(ActionError::Declined);
        }

        let result = self.ctx.api.delete_post(id).await;
        self.ensure_current(generation)?;

        match result {
            Ok(()) => {
                self.state.borrow_mut().entries.retain(|e| e.post.id != id);
                self.changed();
                info!(scope = %self.scope, post_id = id, "post deleted");
                self.ctx.notify(ToastKind::Success, messages::POST_DELETED);
                Ok(())
            }
            Err(err) => {
                self.ctx.report(&err, messages::FAILED_DELETE_POST);
                Err(err.into())
            }
        }
    }

    /// Share a post. The count comes from the server; nothing is optimistic.
    pub async fn share_post(&self, id: PostId) -> Result<(), ActionError> {
        self.ctx.require_token()?;
        let generation = self.known(id)?;

        let result = self.ctx.api.share(id).await;
        self.ensure_current(generation)?;

        match result {
            Ok(shared) => {
                self.update_entry(id, |entry| entry.post.shares = shared.shares);
                info!(scope = %self.scope, post_id = id, shares = shared.shares, "post shared");
                Ok(())
            }
            Err(err) => {
                self.ctx.report(&err, messages::FAILED_SHARE);
                Err(err.into())
            }
        }
    }

    // ── Comments ──

    /// Open or close a post's comments. The first open fetches them.
    pub async fn toggle_comments(&self, id: PostId) -> Result<(), ActionError> {
        let fetch = {
            let mut st = self.state.borrow_mut();
            let thread = &mut st.entry_mut(id).ok_or(ActionError::UnknownPost(id))?.thread;
            if thread.open {
                thread.open = false;
                false
            } else {
                thread.open = true;
                thread.error = None;
                thread.loaded.is_none() && !thread.loading
            }
        };
        self.changed();

        if fetch {
            self.fetch_comments(id).await
        } else {
            Ok(())
        }
    }

    /// Refetch a post's comments, whatever is cached.
    pub async fn retry_comments(&self, id: PostId) -> Result<(), ActionError> {
        self.fetch_comments(id).await
    }

    async fn fetch_comments(&self, id: PostId) -> Result<(), ActionError> {
        let (generation, serial) = {
            let mut st = self.state.borrow_mut();
            let generation = st.generation;
            let entry = st.entry_mut(id).ok_or(ActionError::UnknownPost(id))?;
            if entry.thread.loading {
                return Err(ActionError::Busy);
            }
            entry.thread.loading = true;
            (generation, entry.serial)
        };
        self.changed();

        let result = self.ctx.api.comments(id).await;
        self.ensure_current(generation)?;

        // Failures render inline under the post rather than as a toast.
        match result {
            Ok(list) => {
                self.update_instance(id, serial, |entry| {
                    entry.thread.loaded = Some(list.comments);
                    entry.thread.error = None;
                    entry.thread.loading = false;
                });
                Ok(())
            }
            Err(err) => {
                debug!(scope = %self.scope, post_id = id, error = %err, "comments failed to load");
                self.update_instance(id, serial, |entry| {
                    entry.thread.error = Some(messages::COULD_NOT_LOAD_COMMENTS.to_string());
                    entry.thread.loading = false;
                });
                Err(err.into())
            }
        }
    }

    pub fn set_comment_draft(&self, id: PostId, text: &str) -> Result<(), ActionError> {
        {
            let mut st = self.state.borrow_mut();
            let entry = st.entry_mut(id).ok_or(ActionError::UnknownPost(id))?;
            entry.thread.draft = text.to_string();
        }
        self.changed();
        Ok(())
    }

    /// Submit whatever is in the post's comment draft.
    pub async fn submit_comment_draft(&self, id: PostId) -> Result<(), ActionError> {
        let draft = {
            let st = self.state.borrow();
            st.entries
                .iter()
                .find(|e| e.post.id == id)
                .map(|e| e.thread.draft.clone())
                .ok_or(ActionError::UnknownPost(id))?
        };
        self.submit_comment(id, &draft).await
    }

    /// Post a comment. Whitespace-only text never reaches the server. On
    /// failure the draft keeps the text for a retry.
    pub async fn submit_comment(&self, id: PostId, text: &str) -> Result<(), ActionError> {
        self.ctx.require_token()?;
        let content = text.trim();
        if content.is_empty() {
            return Err(ActionError::Validation(messages::EMPTY_COMMENT));
        }

        let (generation, serial) = {
            let mut st = self.state.borrow_mut();
            let generation = st.generation;
            let entry = st.entry_mut(id).ok_or(ActionError::UnknownPost(id))?;
            if entry.thread.submitting {
                return Err(ActionError::Busy);
            }
            entry.thread.submitting = true;
            entry.thread.draft = text.to_string();
            (generation, entry.serial)
        };
        self.changed();

        let result = self.ctx.api.add_comment(id, content).await;
        self.ensure_current(generation)?;

        match result {
            Ok(added) => {
                // A reloaded copy already carries the server's count and
                // its own draft.
                self.update_instance(id, serial, |entry| {
                    // An unfetched thread stays unfetched so opening it loads
                    // the full list.
                    if let Some(list) = entry.thread.loaded.as_mut() {
                        list.push(added.comment);
                    }
                    entry.post.comments = added.comments.unwrap_or(entry.post.comments + 1);
                    entry.thread.draft.clear();
                    entry.thread.submitting = false;
                });
                info!(scope = %self.scope, post_id = id, "comment added");
                Ok(())
            }
            Err(err) => {
                self.update_instance(id, serial, |entry| entry.thread.submitting = false);
                self.ctx.report(&err, messages::FAILED_ADD_COMMENT);
                Err(err.into())
            }
        }
    }

    // ── Helpers ──

    /// The current generation, if `id` is loaded.
    fn known(&self, id: PostId) -> Result<u64, ActionError> {
        let st = self.state.borrow();
        if st.contains(id) {
            Ok(st.generation)
        } else {
            Err(ActionError::UnknownPost(id))
        }
    }

    fn ensure_current(&self, generation: u64) -> Result<(), ActionError> {
        if self.state.borrow().generation == generation {
            Ok(())
        } else {
            debug!(scope = %self.scope, "discarding response for closed timeline");
            Err(ActionError::Stale)
        }
    }

    fn update_entry(&self, id: PostId, f: impl FnOnce(&mut PostEntry)) {
        let found = {
            let mut st = self.state.borrow_mut();
            st.entry_mut(id).map(f).is_some()
        };
        if found {
            self.changed();
        }
    }

    fn update_instance(&self, id: PostId, serial: u64, f: impl FnOnce(&mut PostEntry)) {
        let found = {
            let mut st = self.state.borrow_mut();
            st.instance_mut(id, serial).map(f).is_some()
        };
        if found {
            self.changed();
        }
    }

    fn changed(&self) {
        let listeners = self.listeners.borrow().clone();
        if listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Route;
    use crate::testing::{page_json, post_json, Harness};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn feed(h: &Harness) -> Timeline {
        Timeline::new(Scope::Feed, h.ctx.clone())
    }

    async fn loaded_with(h: &Harness, posts: Vec<serde_json::Value>) -> Timeline {
        h.transport
            .push_value(200, json!({"posts": posts, "page": 1, "hasMore": false}));
        let tl = feed(h);
        tl.load_first(10).await.unwrap();
        tl
    }

    // ── Pagination ──

    #[tokio::test]
    async fn first_page_replaces_instead_of_appending() {
        let h = Harness::anonymous();
        h.transport.push_value(200, page_json(1..=10, 1, true));
        h.transport.push_value(200, page_json(1..=10, 1, true));
        let tl = feed(&h);

        assert_eq!(tl.load_first(10).await, Ok(PageLoad::Loaded(10)));
        let first = tl.snapshot();
        assert_eq!(tl.load_first(10).await, Ok(PageLoad::Loaded(10)));
        let second = tl.snapshot();

        assert_eq!(second.entries.len(), 10);
        assert_eq!(first, second);
        assert_eq!(second.load, LoadState::Ready);
    }

    #[tokio::test]
    async fn first_page_failure_leaves_list_empty() {
        let h = Harness::anonymous();
        h.transport.push_value(200, page_json(1..=3, 1, true));
        h.transport.push_json(500, "{}");
        let tl = feed(&h);

        tl.load_first(10).await.unwrap();
        let err = tl.load_first(10).await.unwrap_err();

        assert!(matches!(err, ActionError::Api(ApiError::Rejected { status: 500, .. })));
        let snap = tl.snapshot();
        assert!(snap.entries.is_empty());
        assert_eq!(snap.load, LoadState::Failed(messages::COULD_NOT_LOAD_FEED.into()));
        // Inline error only, no toast.
        assert!(h.notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn profile_scope_uses_user_endpoint_and_its_own_message() {
        let h = Harness::anonymous();
        h.transport.push_failure("offline");
        let tl = Timeline::new(Scope::Author("bob".into()), h.ctx.clone());

        assert!(tl.load_first(5).await.is_err());

        assert_eq!(h.transport.requests()[0].path, "/api/users/bob/posts?page=1&limit=5");
        assert_eq!(
            tl.snapshot().load,
            LoadState::Failed(messages::COULD_NOT_LOAD_TIMELINE.into())
        );
    }

    #[tokio::test]
    async fn next_page_appends_and_seeds_likes() {
        let h = Harness::anonymous();
        h.transport.push_value(200, page_json(1..=2, 1, true));
        h.transport.push_value(
            200,
            json!({"posts": [post_json(3, "bob", 4, true)], "page": 2, "hasMore": false}),
        );
        let tl = feed(&h);

        tl.load_first(2).await.unwrap();
        assert_eq!(tl.load_next().await, Ok(PageLoad::Loaded(1)));

        let snap = tl.snapshot();
        assert_eq!(snap.ids(), vec![1, 2, 3]);
        assert!(snap.entry(3).unwrap().liked);
        assert!(!snap.entry(1).unwrap().liked);
        assert_eq!(snap.page, 2);
        assert!(!snap.has_more);
        assert_eq!(h.transport.requests()[1].path, "/api/posts?page=2&limit=2");
    }

    #[tokio::test]
    async fn next_page_skips_posts_already_listed() {
        let h = Harness::anonymous();
        h.transport.push_value(200, page_json(1..=3, 1, true));
        h.transport.push_value(200, page_json(3..=5, 2, true));
        let tl = feed(&h);

        tl.load_first(3).await.unwrap();
        assert_eq!(tl.load_next().await, Ok(PageLoad::Loaded(2)));
        assert_eq!(tl.snapshot().ids(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn exhausted_timeline_makes_no_request() {
        let h = Harness::anonymous();
        h.transport.push_value(200, page_json(1..=2, 1, true));
        h.transport.push_value(200, page_json(3..=4, 2, true));
        h.transport.push_value(200, page_json(5..=5, 3, false));
        let tl = feed(&h);

        tl.load_first(2).await.unwrap();
        tl.load_next().await.unwrap();
        tl.load_next().await.unwrap();
        let before = tl.snapshot();

        assert_eq!(tl.load_next().await, Ok(PageLoad::Exhausted));
        assert_eq!(h.transport.request_count(), 3);
        assert_eq!(tl.snapshot(), before);
    }

    #[tokio::test]
    async fn next_page_before_first_is_not_ready() {
        let h = Harness::anonymous();
        let tl = feed(&h);
        assert_eq!(tl.load_next().await, Ok(PageLoad::NotReady));
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_next_page_calls_issue_one_request() {
        let h = Harness::anonymous();
        h.transport.push_value(200, page_json(1..=2, 1, true));
        h.transport.push_value(200, page_json(3..=4, 2, true));
        let tl = feed(&h);
        tl.load_first(2).await.unwrap();

        let (a, b) = tokio::join!(tl.load_next(), tl.load_next());

        assert_eq!(a, Ok(PageLoad::Loaded(2)));
        assert_eq!(b, Ok(PageLoad::AlreadyLoading));
        assert_eq!(h.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn failed_next_page_is_recoverable() {
        let h = Harness::anonymous();
        h.transport.push_value(200, page_json(1..=2, 1, true));
        h.transport.push_failure("reset");
        h.transport.push_value(200, page_json(3..=4, 2, false));
        let tl = feed(&h);
        tl.load_first(2).await.unwrap();

        assert!(tl.load_next().await.is_err());
        let snap = tl.snapshot();
        assert_eq!(snap.load, LoadState::FailedMore(messages::COULD_NOT_LOAD_MORE.into()));
        assert_eq!(snap.entries.len(), 2);

        assert_eq!(tl.load_next().await, Ok(PageLoad::Loaded(2)));
        assert_eq!(tl.snapshot().load, LoadState::Ready);
        assert_eq!(h.transport.requests()[2].path, "/api/posts?page=2&limit=2");
    }

    // ── Likes ──

    #[tokio::test]
    async fn like_round_trip() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 5, false)]).await;

        h.transport.push_value(200, json!({"likes": 6, "liked": true}));
        tl.toggle_like(1).await.unwrap();
        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!((entry.post.likes, entry.liked), (6, true));

        h.transport.push_value(200, json!({"likes": 5, "liked": false}));
        tl.toggle_like(1).await.unwrap();
        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!((entry.post.likes, entry.liked, entry.like_pending), (5, false, false));
        assert_eq!(h.transport.requests()[1].bearer.as_deref(), Some("token-123"));
    }

    #[tokio::test]
    async fn like_is_visible_before_the_server_answers() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 5, false)]).await;
        let gate = h.transport.push_gated(200, json!({"likes": 9, "liked": true}));

        let observe = async {
            tokio::task::yield_now().await;
            let mid = tl.snapshot();
            gate.notify_one();
            mid
        };
        let (result, mid) = tokio::join!(tl.toggle_like(1), observe);

        result.unwrap();
        let mid = mid.entry(1).cloned().unwrap();
        assert_eq!((mid.post.likes, mid.liked, mid.like_pending), (6, true, true));
        // The server's count wins once it arrives.
        assert_eq!(tl.snapshot().entry(1).unwrap().post.likes, 9);
    }

    #[tokio::test]
    async fn failed_like_restores_exact_prior_values() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 5, false)]).await;
        h.transport
            .push_value(500, json!({"message": "database is locked"}));

        let err = tl.toggle_like(1).await.unwrap_err();

        assert!(matches!(err, ActionError::Api(ApiError::Rejected { .. })));
        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!((entry.post.likes, entry.liked, entry.like_pending), (5, false, false));
        assert_eq!(h.notifier.errors(), vec!["database is locked".to_string()]);
    }

    #[tokio::test]
    async fn network_failure_rolls_back_with_generic_message() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 3, true)]).await;
        h.transport.push_failure("connection reset");

        assert!(tl.toggle_like(1).await.is_err());

        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!((entry.post.likes, entry.liked), (3, true));
        assert_eq!(h.notifier.errors(), vec![messages::NETWORK.to_string()]);
        assert!(h.navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn expired_session_rolls_back_and_redirects() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 5, false)]).await;
        h.transport.push_value(401, json!({"message": "Invalid or expired token"}));

        let err = tl.toggle_like(1).await.unwrap_err();

        assert!(err.is_session_expired());
        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!((entry.post.likes, entry.liked), (5, false));
        assert_eq!(h.navigator.routes(), vec![Route::Login]);
        assert_eq!(h.notifier.errors(), vec![messages::SESSION_EXPIRED.to_string()]);
    }

    #[tokio::test]
    async fn success_without_counts_rolls_back() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 5, false)]).await;
        h.transport.push_json(200, "not json at all");

        assert!(tl.toggle_like(1).await.is_err());
        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!((entry.post.likes, entry.liked), (5, false));
        assert_eq!(h.notifier.errors(), vec![messages::FAILED_LIKE.to_string()]);
    }

    #[tokio::test]
    async fn late_like_reply_after_reload_settles_nothing_new() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 5, false)]).await;
        let first_reply = h.transport.push_gated(200, json!({"likes": 6, "liked": true}));
        h.transport.push_value(
            200,
            json!({"posts": [post_json(1, "bob", 6, true)], "page": 1, "hasMore": false}),
        );
        let second_reply = h.transport.push_gated(200, json!({"likes": 5, "liked": false}));

        let user = async {
            tokio::task::yield_now().await;
            tl.load_first(10).await.unwrap();
            let release = async {
                tokio::task::yield_now().await;
                first_reply.notify_one();
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                let between = tl.snapshot().entry(1).cloned().unwrap();
                second_reply.notify_one();
                between
            };
            tokio::join!(tl.toggle_like(1), release)
        };
        let (first, (second, between)) = tokio::join!(tl.toggle_like(1), user);

        assert_eq!(first, Ok(()));
        assert_eq!(second, Ok(()));
        // The first reply must not settle the toggle made on the reloaded copy.
        assert_eq!(
            (between.post.likes, between.liked, between.like_pending),
            (5, false, true)
        );
        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!((entry.post.likes, entry.liked, entry.like_pending), (5, false, false));
        assert!(h.notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn failed_like_after_reload_leaves_fresh_copy_alone() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 5, false)]).await;
        let reply = h.transport.push_gated(500, json!({"message": "database is locked"}));
        h.transport.push_value(
            200,
            json!({"posts": [post_json(1, "bob", 8, false)], "page": 1, "hasMore": false}),
        );

        let reload = async {
            tokio::task::yield_now().await;
            tl.load_first(10).await.unwrap();
            reply.notify_one();
        };
        let (result, ()) = tokio::join!(tl.toggle_like(1), reload);

        assert!(result.is_err());
        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!((entry.post.likes, entry.liked, entry.like_pending), (8, false, false));
    }

    // ── Auth guard ──

    #[tokio::test]
    async fn anonymous_mutations_never_touch_the_network() {
        let h = Harness::anonymous();
        let tl = loaded_with(&h, vec![post_json(1, "bob", 5, false)]).await;
        let before = tl.snapshot();

        assert_eq!(tl.toggle_like(1).await, Err(ActionError::AuthRequired));
        assert_eq!(tl.share_post(1).await, Err(ActionError::AuthRequired));
        assert_eq!(tl.edit_post(1, "new").await, Err(ActionError::AuthRequired));
        assert_eq!(
            tl.delete_post(1, |_| true).await,
            Err(ActionError::AuthRequired)
        );
        assert_eq!(
            tl.submit_comment(1, "hello").await,
            Err(ActionError::AuthRequired)
        );

        assert_eq!(h.transport.request_count(), 1);
        assert_eq!(h.navigator.routes(), vec![Route::Login; 5]);
        assert_eq!(tl.snapshot(), before);
    }

    // ── Edit / delete / share ──

    #[tokio::test]
    async fn edit_uses_server_content() {
        let h = Harness::logged_in("bob");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        h.transport
            .push_value(200, json!({"post": {"id": 1, "content": "cleaned up"}}));

        tl.edit_post(1, "cleaned up  ").await.unwrap();

        assert_eq!(tl.snapshot().entry(1).unwrap().post.content, "cleaned up");
        assert_eq!(h.notifier.successes(), vec![messages::POST_UPDATED.to_string()]);
        let sent = &h.transport.requests()[1];
        assert_eq!(sent.path, "/api/posts/1");
        assert_eq!(
            sent.body,
            crate::api::Body::Json(json!({"content": "cleaned up  "}))
        );
    }

    #[tokio::test]
    async fn edit_falls_back_to_submitted_text() {
        let h = Harness::logged_in("bob");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        h.transport.push_value(200, json!({"message": "Post updated"}));

        tl.edit_post(1, "new words").await.unwrap();

        assert_eq!(tl.snapshot().entry(1).unwrap().post.content, "new words");
    }

    #[tokio::test]
    async fn edit_with_expired_session_changes_nothing() {
        let h = Harness::logged_in("bob");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        h.transport.push_value(401, json!({"detail": "Signature has expired"}));

        let err = tl.edit_post(1, "new words").await.unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(tl.snapshot().entry(1).unwrap().post.content, "post 1");
        assert_eq!(h.navigator.routes(), vec![Route::Login]);
        assert!(h.notifier.successes().is_empty());
        assert_eq!(h.notifier.errors(), vec!["Signature has expired".to_string()]);
    }

    #[tokio::test]
    async fn edit_rejects_blank_content_locally() {
        let h = Harness::logged_in("bob");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;

        assert!(matches!(
            tl.edit_post(1, "  \n").await,
            Err(ActionError::Validation(_))
        ));
        assert_eq!(h.transport.request_count(), 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_post() {
        let h = Harness::logged_in("bob");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        h.transport.push_json(500, "Internal Server Error");

        assert!(tl.delete_post(1, |_| true).await.is_err());

        assert_eq!(tl.snapshot().ids(), vec![1]);
        assert_eq!(h.notifier.errors(), vec![messages::FAILED_DELETE_POST.to_string()]);
    }

    #[tokio::test]
    async fn delete_needs_confirmation() {
        let h = Harness::logged_in("bob");
        let tl = loaded_with(
            &h,
            vec![post_json(1, "bob", 0, false), post_json(2, "bob", 0, false)],
        )
        .await;

        let mut asked = None;
        let declined = tl
            .delete_post(1, |prompt| {
                asked = Some(prompt.to_string());
                false
            })
            .await;
        assert_eq!(declined, Err(ActionError::Declined));
        assert_eq!(asked.as_deref(), Some(messages::DELETE_PROMPT));
        assert_eq!(h.transport.request_count(), 1);

        h.transport.push_value(200, json!({"message": "Post deleted", "ok": true}));
        tl.delete_post(1, |_| true).await.unwrap();
        assert_eq!(tl.snapshot().ids(), vec![2]);
        assert_eq!(h.notifier.successes(), vec![messages::POST_DELETED.to_string()]);
    }

    #[tokio::test]
    async fn share_takes_the_server_count() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        let gate = h.transport.push_gated(200, json!({"shares": 12, "shared": true}));

        let observe = async {
            tokio::task::yield_now().await;
            let mid = tl.snapshot();
            gate.notify_one();
            mid
        };
        let (result, mid) = tokio::join!(tl.share_post(1), observe);

        result.unwrap();
        assert_eq!(mid.entry(1).unwrap().post.shares, 0);
        assert_eq!(tl.snapshot().entry(1).unwrap().post.shares, 12);
    }

    #[tokio::test]
    async fn expired_session_on_share_changes_nothing() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        let before = tl.snapshot();
        h.transport.push_value(401, json!({}));

        let err = tl.share_post(1).await.unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(tl.snapshot(), before);
        assert_eq!(h.navigator.routes(), vec![Route::Login]);
        assert_eq!(h.notifier.errors(), vec![messages::SESSION_EXPIRED.to_string()]);
    }

    #[tokio::test]
    async fn unknown_post_is_rejected_locally() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        assert_eq!(tl.share_post(99).await, Err(ActionError::UnknownPost(99)));
        assert_eq!(h.transport.request_count(), 1);
    }

    // ── Comments ──

    #[tokio::test]
    async fn first_open_fetches_comments_once() {
        let h = Harness::anonymous();
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        h.transport.push_value(
            200,
            json!({"comments": [{"id": 10, "content": "nice", "created_at": "", "username": "ana"}]}),
        );

        tl.toggle_comments(1).await.unwrap();
        let thread = tl.snapshot().entry(1).unwrap().thread.clone();
        assert!(thread.open);
        assert_eq!(thread.visible().len(), 1);

        tl.toggle_comments(1).await.unwrap();
        assert!(tl.snapshot().entry(1).unwrap().thread.visible().is_empty());

        tl.toggle_comments(1).await.unwrap();
        assert_eq!(tl.snapshot().entry(1).unwrap().thread.visible().len(), 1);
        assert_eq!(h.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn comment_failure_is_isolated_per_post() {
        let h = Harness::anonymous();
        let tl = loaded_with(
            &h,
            vec![post_json(1, "bob", 0, false), post_json(2, "bob", 0, false)],
        )
        .await;
        h.transport.push_json(500, "{}");
        h.transport.push_value(200, json!({"comments": []}));

        assert!(tl.toggle_comments(1).await.is_err());
        tl.toggle_comments(2).await.unwrap();

        let snap = tl.snapshot();
        let failed = &snap.entry(1).unwrap().thread;
        assert_eq!(failed.error.as_deref(), Some(messages::COULD_NOT_LOAD_COMMENTS));
        assert!(!failed.loading);
        let ok = &snap.entry(2).unwrap().thread;
        assert_eq!(ok.error, None);
        assert_eq!(ok.loaded, Some(vec![]));
        assert!(h.notifier.toasts().is_empty());

        h.transport.push_value(200, json!({"comments": []}));
        tl.retry_comments(1).await.unwrap();
        assert_eq!(tl.snapshot().entry(1).unwrap().thread.error, None);
    }

    #[tokio::test]
    async fn blank_comment_is_never_sent() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        let before = tl.snapshot();

        assert!(matches!(
            tl.submit_comment(1, "   ").await,
            Err(ActionError::Validation(_))
        ));

        assert_eq!(h.transport.request_count(), 1);
        assert_eq!(tl.snapshot(), before);
    }

    #[tokio::test]
    async fn comment_appends_and_takes_server_count() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        h.transport.push_value(200, json!({"comments": []}));
        tl.toggle_comments(1).await.unwrap();

        tl.set_comment_draft(1, "  first!  ").unwrap();
        h.transport.push_value(
            200,
            json!({"comment": {"id": 5, "content": "first!", "created_at": "", "username": "ana"}, "comments": 4}),
        );
        tl.submit_comment_draft(1).await.unwrap();

        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!(entry.post.comments, 4);
        assert_eq!(entry.thread.visible()[0].content, "first!");
        assert_eq!(entry.thread.draft, "");
        assert!(!entry.thread.submitting);
        assert_eq!(
            h.transport.requests()[2].body,
            crate::api::Body::Json(json!({"content": "first!"}))
        );
    }

    #[tokio::test]
    async fn comment_on_unopened_post_leaves_thread_unfetched() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        h.transport.push_value(
            200,
            json!({"comment": {"id": 5, "content": "hey", "created_at": "", "username": "ana"}}),
        );

        tl.submit_comment(1, "hey").await.unwrap();

        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!(entry.thread.loaded, None);
        assert_eq!(entry.post.comments, 1);
    }

    #[tokio::test]
    async fn failed_comment_keeps_the_draft() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        h.transport.push_value(400, json!({"message": "Content is required"}));

        assert!(tl.submit_comment(1, "hello").await.is_err());

        let thread = tl.snapshot().entry(1).unwrap().thread.clone();
        assert_eq!(thread.draft, "hello");
        assert!(!thread.submitting);
        assert_eq!(h.notifier.errors(), vec!["Content is required".to_string()]);
    }

    #[tokio::test]
    async fn comment_reply_after_reload_keeps_the_new_draft() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        let reply = h.transport.push_gated(
            200,
            json!({"comment": {"id": 5, "content": "hey", "created_at": "", "username": "ana"}, "comments": 4}),
        );
        let mut reloaded = post_json(1, "bob", 0, false);
        reloaded["comments"] = json!(4);
        h.transport
            .push_value(200, json!({"posts": [reloaded], "page": 1, "hasMore": false}));

        let reload = async {
            tokio::task::yield_now().await;
            tl.load_first(10).await.unwrap();
            tl.set_comment_draft(1, "second thought").unwrap();
            reply.notify_one();
        };
        let (result, ()) = tokio::join!(tl.submit_comment(1, "hey"), reload);

        assert_eq!(result, Ok(()));
        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!(entry.post.comments, 4);
        assert_eq!(entry.thread.draft, "second thought");
        assert_eq!(entry.thread.loaded, None);
        assert!(!entry.thread.submitting);
    }

    #[tokio::test]
    async fn expired_session_on_comment_keeps_draft_and_redirects() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        h.transport.push_value(401, json!({"detail": "Token has expired"}));

        let err = tl.submit_comment(1, "hello").await.unwrap_err();

        assert!(err.is_session_expired());
        let entry = tl.snapshot().entry(1).cloned().unwrap();
        assert_eq!(entry.thread.draft, "hello");
        assert_eq!(entry.post.comments, 0);
        assert!(!entry.thread.submitting);
        assert_eq!(h.navigator.routes(), vec![Route::Login]);
        assert_eq!(h.notifier.errors(), vec!["Token has expired".to_string()]);
    }

    // ── Lifecycle ──

    #[tokio::test]
    async fn responses_after_close_are_discarded() {
        let h = Harness::logged_in("ana");
        let tl = loaded_with(&h, vec![post_json(1, "bob", 5, false)]).await;
        let gate = h.transport.push_gated(200, json!({"likes": 6, "liked": true}));

        let teardown = async {
            tokio::task::yield_now().await;
            tl.close();
            gate.notify_one();
        };
        let (result, ()) = tokio::join!(tl.toggle_like(1), teardown);

        assert_eq!(result, Err(ActionError::Stale));
        assert!(h.notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn timelines_do_not_share_state() {
        let h = Harness::logged_in("ana");
        h.transport.push_value(200, json!({"posts": [post_json(1, "bob", 5, false)], "hasMore": false}));
        h.transport.push_value(200, json!({"posts": [post_json(1, "bob", 5, false)], "hasMore": false}));
        let feed = feed(&h);
        let profile = Timeline::new(Scope::Author("bob".into()), h.ctx.clone());
        feed.load_first(10).await.unwrap();
        profile.load_first(10).await.unwrap();

        h.transport.push_value(200, json!({"post": {"content": "edited"}}));
        feed.edit_post(1, "edited").await.unwrap();

        assert_eq!(feed.snapshot().entry(1).unwrap().post.content, "edited");
        assert_eq!(profile.snapshot().entry(1).unwrap().post.content, "post 1");
    }

    #[tokio::test]
    async fn listeners_see_every_change() {
        let h = Harness::anonymous();
        h.transport.push_value(200, page_json(1..=2, 1, false));
        let tl = feed(&h);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        tl.on_change(move |snap| sink.borrow_mut().push(snap.load.clone()));

        tl.load_first(2).await.unwrap();

        assert_eq!(*seen.borrow(), vec![LoadState::LoadingFirst, LoadState::Ready]);
    }

    #[tokio::test]
    async fn published_post_goes_on_top_once() {
        let h = Harness::anonymous();
        let tl = loaded_with(&h, vec![post_json(1, "bob", 0, false)]).await;
        let post: Post = serde_json::from_value(post_json(2, "ana", 0, false)).unwrap();

        tl.prepend_published(post.clone());
        tl.prepend_published(post);

        assert_eq!(tl.snapshot().ids(), vec![2, 1]);
    }

    #[tokio::test]
    async fn ownership_follows_session_username() {
        let h = Harness::logged_in("Bob");
        let tl = loaded_with(
            &h,
            vec![post_json(1, "bob", 0, false), post_json(2, "ana", 0, false)],
        )
        .await;
        let snap = tl.snapshot();
        assert!(tl.is_own(&snap.entry(1).unwrap().post));
        assert!(!tl.is_own(&snap.entry(2).unwrap().post));
    }
}
