use leptos::prelude::*;
use townsquare_client::{Auth, Navigator, Route, SessionStore};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;
use web_sys::js_sys::{Array, JSON};
use web_sys::{window, Storage};

use crate::browser::{LocationNavigator, Services};

const TOKEN_KEY: &str = "token";
const USERNAME_KEY: &str = "username";
const SINCE_KEY: &str = "notif_since";
const RECENTS_KEY: &str = "search_recents";

fn storage() -> Option<Storage> {
    window()?.local_storage().ok()?
}

/// Credentials in `localStorage`, shared with the rest of the site.
pub struct BrowserSession;

impl SessionStore for BrowserSession {
    fn token(&self) -> Option<String> {
        storage()?.get_item(TOKEN_KEY).ok()?.filter(|t| !t.is_empty())
    }

    fn username(&self) -> Option<String> {
        storage()?.get_item(USERNAME_KEY).ok()?.filter(|u| !u.is_empty())
    }

    fn store(&self, token: &str, username: &str) {
        if let Some(storage) = storage() {
            let _ = storage.set_item(TOKEN_KEY, token);
            let _ = storage.set_item(USERNAME_KEY, username);
        }
    }

    fn clear(&self) {
        if let Some(storage) = storage() {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USERNAME_KEY);
        }
    }

    fn notifications_since(&self) -> Option<String> {
        storage()?.get_item(SINCE_KEY).ok()?.filter(|s| !s.is_empty())
    }

    fn set_notifications_since(&self, since: &str) {
        if let Some(storage) = storage() {
            let _ = storage.set_item(SINCE_KEY, since);
        }
    }

    /// Stored as a JSON array of strings.
    fn recent_searches(&self) -> Vec<String> {
        let Some(raw) = storage().and_then(|s| s.get_item(RECENTS_KEY).ok().flatten()) else {
            return Vec::new();
        };
        match JSON::parse(&raw) {
            Ok(value) if Array::is_array(&value) => Array::from(&value)
                .iter()
                .filter_map(|v| v.as_string())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn set_recent_searches(&self, terms: &[String]) {
        let array: Array = terms.iter().map(|t| JsValue::from_str(t)).collect();
        let Ok(json) = JSON::stringify(&array) else {
            return;
        };
        if let (Some(storage), Some(json)) = (storage(), json.as_string()) {
            let _ = storage.set_item(RECENTS_KEY, &json);
        }
    }
}

/// Reactive view of who is logged in.
#[derive(Clone, Copy, Debug)]
pub struct AuthState {
    pub username: RwSignal<Option<String>>,
}

/// Provides [`Services`] and [`AuthState`] to its children.
#[component]
pub fn AuthProvider(
    #[prop(optional_no_strip)] page_size: Option<u32>,
    children: Children,
) -> impl IntoView {
    provide_context(Services::new(page_size));
    let username = if BrowserSession.has_token() {
        BrowserSession.username()
    } else {
        None
    };
    provide_context(AuthState {
        username: RwSignal::new(username),
    });
    children()
}

/// Current user with a logout button, or a login link.
#[component]
pub fn UserBadge() -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let services = expect_context::<Services>();

    let on_logout = move |_| {
        Auth::new(services.context()).logout();
        auth.username.set(None);
    };

    move || match auth.username.get() {
        Some(name) => view! {
            <div class="townsquare-auth">
                <a class="townsquare-username" href=Route::Profile(name.clone()).path()>{name.clone()}</a>
                <button class="townsquare-btn townsquare-btn-sm" on:click=on_logout>"Logout"</button>
            </div>
        }
        .into_any(),
        None => view! {
            <a class="townsquare-btn" href=Route::Login.path()>"Log in"</a>
        }
        .into_any(),
    }
}

/// Login and signup in one form.
#[component]
pub fn LoginForm() -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let services = expect_context::<Services>();

    let signing_up = RwSignal::new(false);
    let identifier = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let submitting = RwSignal::new(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if submitting.get_untracked() {
            return;
        }
        submitting.set(true);
        let client = Auth::new(services.context());
        spawn_local(async move {
            let result = if signing_up.get_untracked() {
                client
                    .signup(
                        &identifier.get_untracked(),
                        &email.get_untracked(),
                        &password.get_untracked(),
                    )
                    .await
            } else {
                client
                    .login(&identifier.get_untracked(), &password.get_untracked())
                    .await
            };
            submitting.set(false);
            if let Ok(name) = result {
                password.set(String::new());
                auth.username.set(Some(name));
                LocationNavigator.redirect(client.landing());
            }
        });
    };

    view! {
        <form class="townsquare-login" on:submit=on_submit>
            <input
                class="townsquare-input"
                type="text"
                placeholder=move || if signing_up.get() { "Username" } else { "Email or username" }
                prop:value=move || identifier.get()
                on:input=move |ev| identifier.set(event_target_value(&ev))
            />
            <Show when=move || signing_up.get()>
                <input
                    class="townsquare-input"
                    type="email"
                    placeholder="Email"
                    prop:value=move || email.get()
                    on:input=move |ev| email.set(event_target_value(&ev))
                />
            </Show>
            <input
                class="townsquare-input"
                type="password"
                placeholder="Password"
                prop:value=move || password.get()
                on:input=move |ev| password.set(event_target_value(&ev))
            />
            <button class="townsquare-btn" type="submit" disabled=move || submitting.get()>
                {move || match (signing_up.get(), submitting.get()) {
                    (_, true) => "Please wait...",
                    (true, false) => "Sign up",
                    (false, false) => "Log in",
                }}
            </button>
            <button
                class="townsquare-link"
                type="button"
                on:click=move |_| signing_up.update(|s| *s = !*s)
            >
                {move || if signing_up.get() { "Have an account? Log in" } else { "New here? Sign up" }}
            </button>
        </form>
    }
}
