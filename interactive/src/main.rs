mod api;
mod auth;
mod browser;
mod post;
mod profile;
mod social;
mod timeline;

use leptos::prelude::*;
use townsquare_client::{Scope, SessionStore};
use wasm_bindgen::JsCast;
use web_sys::Element;

fn page_size(el: &Element) -> Option<u32> {
    el.get_attribute("data-page-size")?.parse().ok()
}

fn main() {
    console_error_panic_hook::set_once();

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };

    // Feed with composer
    if let Some(el) = document.get_element_by_id("townsquare-feed") {
        let size = page_size(&el);
        let html_el: web_sys::HtmlElement = el.unchecked_into();
        leptos::mount::mount_to(html_el, move || {
            view! {
                <auth::AuthProvider page_size=size>
                    <auth::UserBadge />
                    <social::NotificationsBell />
                    <social::UserSearch />
                    <social::StoriesBar />
                    <social::FriendRequests />
                    <timeline::TimelineView scope=Scope::Feed composer=true />
                </auth::AuthProvider>
            }
        })
        .forget();
    }

    // Profile: `data-username`, then `?u=`, then the viewer's own profile
    if let Some(el) = document.get_element_by_id("townsquare-profile") {
        let size = page_size(&el);
        let username = el
            .get_attribute("data-username")
            .filter(|u| !u.is_empty())
            .or_else(|| browser::query_param("u"))
            .or_else(|| auth::BrowserSession.username());
        let html_el: web_sys::HtmlElement = el.unchecked_into();
        leptos::mount::mount_to(html_el, move || {
            let username = username.clone();
            view! {
                <auth::AuthProvider page_size=size>
                    <auth::UserBadge />
                    {match username {
                        Some(name) => view! { <profile::ProfilePage username=name /> }.into_any(),
                        None => view! { <auth::LoginForm /> }.into_any(),
                    }}
                </auth::AuthProvider>
            }
        })
        .forget();
    }

    if let Some(el) = document.get_element_by_id("townsquare-login") {
        let html_el: web_sys::HtmlElement = el.unchecked_into();
        leptos::mount::mount_to(html_el, move || {
            view! {
                <auth::AuthProvider>
                    <auth::LoginForm />
                </auth::AuthProvider>
            }
        })
        .forget();
    }
}
