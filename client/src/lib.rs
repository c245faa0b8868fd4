//! Client core for the townsquare social network.
//!
//! Holds the browser-independent half of the front-end: the REST client,
//! the paginated [`Timeline`] with optimistic likes and per-post comments,
//! the post [`Composer`], login, profiles and friends, user search,
//! notification polling and stories. The browser crate plugs
//! in local storage, toasts, navigation and `fetch` through the traits in
//! [`session`], [`notify`] and [`api`].

pub mod api;
pub mod auth;
pub mod composer;
pub mod config;
pub mod context;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod messages;
pub mod notifications;
pub mod notify;
pub mod profile;
pub mod session;
pub mod stories;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, Transport};
pub use auth::Auth;
pub use composer::{Attachment, Composer, Draft};
pub use config::ClientConfig;
pub use context::Context;
pub use error::{ActionError, ApiError, TransportError};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use notifications::Notifications;
pub use notify::{Navigator, Notifier, Route, ToastKind};
pub use profile::Profiles;
pub use session::{MemorySession, SessionStore};
pub use stories::Stories;
pub use timeline::{LoadState, PageLoad, PostEntry, Scope, Timeline, TimelineSnapshot};
