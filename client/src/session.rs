use std::cell::RefCell;

/// Read/write access to the viewer's credentials.
///
/// Browsers back this with local storage; everything else can use
/// [`MemorySession`]. It is read on every authenticated call, so
/// implementations should be cheap.
pub trait SessionStore {
    fn token(&self) -> Option<String>;
    fn username(&self) -> Option<String>;
    fn store(&self, token: &str, username: &str);
    fn clear(&self);

    fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// When notifications were last fetched, as the server's ISO timestamp
    /// format. Survives logout.
    fn notifications_since(&self) -> Option<String> {
        None
    }

    fn set_notifications_since(&self, _since: &str) {}

    /// Search terms the viewer ran recently, newest first.
    fn recent_searches(&self) -> Vec<String> {
        Vec::new()
    }

    fn set_recent_searches(&self, _terms: &[String]) {}

    /// Whether `author` is the logged-in user. Usernames compare
    /// case-insensitively.
    fn is_viewer(&self, author: &str) -> bool {
        match self.username() {
            Some(me) if !me.is_empty() => me.to_lowercase() == author.to_lowercase(),
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySession {
    inner: RefCell<Credentials>,
    extras: RefCell<Extras>,
}

#[derive(Debug, Default, Clone)]
struct Credentials {
    token: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Default, Clone)]
struct Extras {
    notifications_since: Option<String>,
    recent_searches: Vec<String>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logged_in(token: &str, username: &str) -> Self {
        let session = Self::new();
        session.store(token, username);
        session
    }
}

impl SessionStore for MemorySession {
    fn token(&self) -> Option<String> {
        self.inner.borrow().token.clone()
    }

    fn username(&self) -> Option<String> {
        self.inner.borrow().username.clone()
    }

    fn store(&self, token: &str, username: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.token = Some(token.to_string()).filter(|t| !t.is_empty());
        inner.username = Some(username.to_string()).filter(|u| !u.is_empty());
    }

    fn clear(&self) {
        *self.inner.borrow_mut() = Credentials::default();
    }

    fn notifications_since(&self) -> Option<String> {
        self.extras.borrow().notifications_since.clone()
    }

    fn set_notifications_since(&self, since: &str) {
        self.extras.borrow_mut().notifications_since = Some(since.to_string());
    }

    fn recent_searches(&self) -> Vec<String> {
        self.extras.borrow().recent_searches.clone()
    }

    fn set_recent_searches(&self, terms: &[String]) {
        self.extras.borrow_mut().recent_searches = terms.to_vec();
    }
}
