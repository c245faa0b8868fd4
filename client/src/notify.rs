#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Info => "info",
            ToastKind::Success => "success",
            ToastKind::Error => "error",
        }
    }
}

/// Transient user-facing notifications.
pub trait Notifier {
    fn notify(&self, kind: ToastKind, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Feed,
    Profile(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Feed => "/".to_string(),
            Route::Profile(username) => format!("/profile?u={}", urlencoding::encode(username)),
        }
    }
}

/// Client-side navigation. The core only ever asks for [`Route::Login`].
pub trait Navigator {
    fn redirect(&self, to: Route);
}
