use std::rc::Rc;

use leptos::prelude::*;
use townsquare_client::config::{clamp_page_size, DEFAULT_PAGE_SIZE};
use townsquare_client::{Context, Navigator, Notifier, Route, ToastKind};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::window;

use crate::api::{self, FetchTransport};
use crate::auth::BrowserSession;

const TOAST_HOST: &str = "townsquare-toasts";
const TOAST_MILLIS: i32 = 3000;

/// Appends a toast to `#townsquare-toasts` (created on demand) and removes it
/// after a few seconds.
pub struct DomToasts;

impl Notifier for DomToasts {
    fn notify(&self, kind: ToastKind, message: &str) {
        let Some(document) = window().and_then(|w| w.document()) else {
            return;
        };
        let host = match document.get_element_by_id(TOAST_HOST) {
            Some(el) => el,
            None => {
                let Ok(el) = document.create_element("div") else {
                    return;
                };
                el.set_id(TOAST_HOST);
                if let Some(body) = document.body() {
                    let _ = body.append_child(&el);
                }
                el
            }
        };
        let Ok(toast) = document.create_element("div") else {
            return;
        };
        toast.set_class_name(&format!("townsquare-toast townsquare-toast-{}", kind.as_str()));
        toast.set_text_content(Some(message));
        if host.append_child(&toast).is_err() {
            return;
        }

        let remove = Closure::once_into_js(move || toast.remove());
        if let Some(win) = window() {
            let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
                remove.unchecked_ref(),
                TOAST_MILLIS,
            );
        }
    }
}

/// Full-page navigation via `window.location`.
pub struct LocationNavigator;

impl Navigator for LocationNavigator {
    fn redirect(&self, to: Route) {
        if let Some(win) = window() {
            let _ = win.location().set_href(&to.path());
        }
    }
}

/// `window.confirm`, treating a missing window as "no".
pub fn confirm(prompt: &str) -> bool {
    window()
        .and_then(|w| w.confirm_with_message(prompt).ok())
        .unwrap_or(false)
}

pub fn query_param(name: &str) -> Option<String> {
    let href = window()?.location().href().ok()?;
    let url = web_sys::Url::new(&href).ok()?;
    url.search_params().get(name).filter(|v| !v.is_empty())
}

/// Browser collaborators for one mounted widget, shared through Leptos context.
#[derive(Clone, Copy)]
pub struct Services {
    ctx: StoredValue<Context, LocalStorage>,
    api_base: StoredValue<String>,
    pub page_size: u32,
}

impl Services {
    pub fn new(page_size: Option<u32>) -> Self {
        let api_base = api::api_base();
        let ctx = Context::new(
            Rc::new(FetchTransport::new(api_base.clone())),
            Rc::new(BrowserSession),
            Rc::new(DomToasts),
            Rc::new(LocationNavigator),
        );
        Self {
            ctx: StoredValue::new_local(ctx),
            api_base: StoredValue::new(api_base),
            page_size: clamp_page_size(page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
        }
    }

    pub fn context(&self) -> Context {
        self.ctx.get_value()
    }

    pub fn media_url(&self, url: &str) -> String {
        self.api_base.with_value(|base| api::media_url(base, url))
    }
}
