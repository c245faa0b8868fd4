use std::time::Duration;

use leptos::prelude::*;
use townsquare_client::{messages, ApiError, Notifications, Profiles, Route, Stories};
use townsquare_shared::{NotificationSummary, Story, UserSummary};
use wasm_bindgen_futures::spawn_local;
use web_sys::js_sys::Date;

use crate::auth::AuthState;
use crate::browser::Services;

const POLL_INTERVAL: Duration = Duration::from_secs(45);

fn now_iso() -> String {
    Date::new_0().to_iso_string().into()
}

/// Notification counts, refreshed in the background while logged in.
#[component]
pub fn NotificationsBell() -> impl IntoView {
    let services = expect_context::<Services>();
    let auth = expect_context::<AuthState>();
    let summary = RwSignal::new(NotificationSummary::default());
    let failed = RwSignal::new(false);

    let refresh = move || {
        if auth.username.get_untracked().is_none() {
            return;
        }
        let notifications = Notifications::new(services.context());
        spawn_local(async move {
            match notifications.poll(&now_iso()).await {
                Some(s) => {
                    summary.set(s);
                    failed.set(false);
                }
                None => failed.set(true),
            }
        });
    };
    refresh();
    if let Ok(handle) = set_interval_with_handle(refresh, POLL_INTERVAL) {
        on_cleanup(move || handle.clear());
    }

    move || {
        if auth.username.get().is_none() {
            return ().into_any();
        }
        let s = summary.get();
        let class = if s.is_empty() {
            "townsquare-notifications"
        } else {
            "townsquare-notifications townsquare-has-new"
        };
        view! {
            <div class=class>
                <span title="Friend requests">{s.pending_friend_requests}</span>
                <span title="New likes">{s.new_likes}</span>
                <span title="New comments">{s.new_comments}</span>
                <Show when=move || failed.get()>
                    <span class="townsquare-error">{messages::COULD_NOT_LOAD_NOTIFICATIONS}</span>
                </Show>
            </div>
        }
        .into_any()
    }
}

/// Incoming friend requests with accept buttons.
#[component]
pub fn FriendRequests() -> impl IntoView {
    let services = expect_context::<Services>();
    let pending: RwSignal<Vec<UserSummary>> = RwSignal::new(Vec::new());
    let failed = RwSignal::new(false);

    {
        let profiles = Profiles::new(services.context());
        spawn_local(async move {
            match profiles.pending_requests().await {
                Ok(list) => pending.set(list),
                Err(_) => failed.set(true),
            }
        });
    }

    let accept = move |username: String| {
        let profiles = Profiles::new(services.context());
        spawn_local(async move {
            if profiles.accept_friend_request(&username).await.is_ok() {
                pending.update(|list| list.retain(|u| u.username != username));
            }
        });
    };

    view! {
        <div class="townsquare-friend-requests">
            <Show when=move || failed.get()>
                <p class="townsquare-error">{messages::COULD_NOT_LOAD_FRIEND_REQUESTS}</p>
            </Show>
            <For each=move || pending.get() key=|u| u.username.clone() let:user>
                {
                    let name = user.username.clone();
                    view! {
                        <div class="townsquare-friend-request">
                            <a href=Route::Profile(user.username.clone()).path()>{user.username.clone()}</a>
                            <button class="townsquare-btn townsquare-btn-sm" on:click=move |_| accept(name.clone())>
                                "Accept"
                            </button>
                        </div>
                    }
                }
            </For>
        </div>
    }
}

/// People search with the viewer's recent terms underneath.
#[component]
pub fn UserSearch() -> impl IntoView {
    let services = expect_context::<Services>();
    let profiles = StoredValue::new_local(Profiles::new(services.context()));
    let query = RwSignal::new(String::new());
    let results: RwSignal<Vec<UserSummary>> = RwSignal::new(Vec::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let recent = RwSignal::new(profiles.with_value(|p| p.recent_searches()));

    let run = move |term: String| {
        query.set(term.clone());
        let profiles = profiles.get_value();
        spawn_local(async move {
            let outcome = profiles.search(&term).await;
            // Typing moved on while the request was out.
            if query.get_untracked() != term {
                return;
            }
            match outcome {
                Ok(users) => {
                    results.set(users);
                    error.set(None);
                }
                Err(err) => {
                    results.set(Vec::new());
                    let message = match err {
                        ApiError::Rejected { message: Some(m), .. } => m,
                        _ => messages::SEARCH_FAILED.to_string(),
                    };
                    error.set(Some(message));
                }
            }
        });
    };

    let open = move |username: String| {
        let term = query.get_untracked();
        recent.set(profiles.with_value(|p| p.remember_search(&term)));
        if let Some(win) = web_sys::window() {
            let _ = win.location().set_href(&Route::Profile(username).path());
        }
    };

    view! {
        <div class="townsquare-search">
            <input
                class="townsquare-input"
                type="search"
                placeholder="Search people"
                prop:value=move || query.get()
                on:input=move |ev| run(event_target_value(&ev))
            />
            {move || error.get().map(|msg| view! { <p class="townsquare-error">{msg}</p> })}
            <ul class="townsquare-search-results">
                <For each=move || results.get() key=|u| u.username.clone() let:user>
                    {
                        let name = user.username.clone();
                        view! {
                            <li>
                                <button class="townsquare-link" on:click=move |_| open(name.clone())>
                                    {user.username.clone()}
                                </button>
                            </li>
                        }
                    }
                </For>
            </ul>
            <Show when=move || query.with(|q| q.trim().is_empty()) && !recent.with(Vec::is_empty)>
                <ul class="townsquare-search-recent">
                    <For each=move || recent.get() key=|t| t.clone() let:term>
                        {
                            let again = term.clone();
                            view! {
                                <li>
                                    <button class="townsquare-link" on:click=move |_| run(again.clone())>{term.clone()}</button>
                                </li>
                            }
                        }
                    </For>
                </ul>
            </Show>
        </div>
    }
}

/// Horizontal strip of active stories.
#[component]
pub fn StoriesBar() -> impl IntoView {
    let services = expect_context::<Services>();
    let stories: RwSignal<Vec<Story>> = RwSignal::new(Vec::new());
    let failed = RwSignal::new(false);

    {
        let loader = Stories::new(services.context());
        spawn_local(async move {
            match loader.load().await {
                Ok(list) => stories.set(list),
                Err(_) => failed.set(true),
            }
        });
    }

    view! {
        <div class="townsquare-stories">
            <Show when=move || failed.get()>
                <p class="townsquare-error">{messages::COULD_NOT_LOAD_STORIES}</p>
            </Show>
            <For each=move || stories.get() key=|s| s.id let:story>
                <div class="townsquare-story">
                    {story.media_url.clone().map(|url| view! {
                        <img class="townsquare-story-media" src=services.media_url(&url) alt="" />
                    })}
                    <p class="townsquare-story-text">{story.content.clone().unwrap_or_default()}</p>
                    <a class="townsquare-username" href=Route::Profile(story.username.clone()).path()>
                        {story.username.clone()}
                    </a>
                </div>
            </For>
        </div>
    }
}
