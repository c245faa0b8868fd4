//! In-memory collaborators for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use crate::api::{Request, Response, Transport};
use crate::context::Context;
use crate::error::TransportError;
use crate::notify::{Navigator, Notifier, Route, ToastKind};
use crate::session::{MemorySession, SessionStore};

enum Step {
    Reply(Result<Response, TransportError>),
    Gated(Rc<Notify>, Result<Response, TransportError>),
}

/// Answers requests from a queue, in order, and records what was sent.
#[derive(Default)]
pub struct ScriptedTransport {
    steps: RefCell<VecDeque<Step>>,
    sent: RefCell<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: &str) {
        self.steps.borrow_mut().push_back(Step::Reply(Ok(Response {
            status,
            body: body.as_bytes().to_vec(),
        })));
    }

    pub fn push_value(&self, status: u16, body: serde_json::Value) {
        self.push_json(status, &body.to_string());
    }

    pub fn push_failure(&self, reason: &str) {
        self.steps
            .borrow_mut()
            .push_back(Step::Reply(Err(TransportError(reason.to_string()))));
    }

    /// Queue a reply that is held back until the returned handle is notified.
    pub fn push_gated(&self, status: u16, body: serde_json::Value) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        self.steps.borrow_mut().push_back(Step::Gated(
            gate.clone(),
            Ok(Response {
                status,
                body: body.to_string().into_bytes(),
            }),
        ));
        gate
    }

    pub fn requests(&self) -> Vec<Request> {
        self.sent.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.sent.borrow().len()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        self.sent.borrow_mut().push(request);
        let step = self.steps.borrow_mut().pop_front();
        // Give other futures in a join! a chance to observe in-flight state.
        tokio::task::yield_now().await;
        match step {
            Some(Step::Reply(reply)) => reply,
            Some(Step::Gated(gate, reply)) => {
                gate.notified().await;
                reply
            }
            None => Err(TransportError("no scripted response".into())),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    toasts: RefCell<Vec<(ToastKind, String)>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<(ToastKind, String)> {
        self.toasts.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.of_kind(ToastKind::Error)
    }

    pub fn successes(&self) -> Vec<String> {
        self.of_kind(ToastKind::Success)
    }

    fn of_kind(&self, kind: ToastKind) -> Vec<String> {
        self.toasts
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: ToastKind, message: &str) {
        self.toasts.borrow_mut().push((kind, message.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: RefCell<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, to: Route) {
        self.routes.borrow_mut().push(to);
    }
}

pub struct Harness {
    pub transport: Rc<ScriptedTransport>,
    pub session: Rc<MemorySession>,
    pub notifier: Rc<RecordingNotifier>,
    pub navigator: Rc<RecordingNavigator>,
    pub ctx: Context,
}

impl Harness {
    pub fn anonymous() -> Self {
        let transport = Rc::new(ScriptedTransport::new());
        let session = Rc::new(MemorySession::new());
        let notifier = Rc::new(RecordingNotifier::default());
        let navigator = Rc::new(RecordingNavigator::default());
        let ctx = Context::new(
            transport.clone(),
            session.clone(),
            notifier.clone(),
            navigator.clone(),
        );
        Self {
            transport,
            session,
            notifier,
            navigator,
            ctx,
        }
    }

    pub fn logged_in(username: &str) -> Self {
        let harness = Self::anonymous();
        harness.session.store("token-123", username);
        harness
    }
}

pub fn post_json(id: i64, author: &str, likes: i64, liked: bool) -> serde_json::Value {
    json!({
        "id": id,
        "content": format!("post {id}"),
        "created_at": "2024-05-01T10:00:00",
        "username": author,
        "email": format!("{author}@example.com"),
        "likes": likes,
        "comments": 0,
        "shares": 0,
        "likedByMe": liked,
        "media": [],
    })
}

/// A page of posts with ids `ids`, all by `author`, none liked.
pub fn page_json(ids: std::ops::RangeInclusive<i64>, page: u32, has_more: bool) -> serde_json::Value {
    let posts: Vec<_> = ids.map(|id| post_json(id, "ana", 0, false)).collect();
    json!({ "posts": posts, "page": page, "limit": 10, "hasMore": has_more })
}
