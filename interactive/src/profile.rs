use leptos::prelude::*;
use townsquare_client::{Profiles, Scope};
use townsquare_shared::{FriendStatus, Profile};
use wasm_bindgen_futures::spawn_local;

use crate::browser::Services;
use crate::timeline::TimelineView;

/// Profile header, friendship button and the user's own timeline.
#[component]
pub fn ProfilePage(username: String) -> impl IntoView {
    let services = expect_context::<Services>();
    let profile: RwSignal<Option<Profile>> = RwSignal::new(None);
    let error = RwSignal::new(false);
    let status = RwSignal::new(FriendStatus::None);

    {
        let username = username.clone();
        let profiles = Profiles::new(services.context());
        spawn_local(async move {
            match profiles.profile(&username).await {
                Ok(p) => profile.set(Some(p)),
                Err(_) => error.set(true),
            }
            if let Ok(s) = profiles.friend_status(&username).await {
                status.set(s);
            }
        });
    }

    let friend_action = {
        let username = username.clone();
        move |_| {
            let profiles = Profiles::new(services.context());
            let username = username.clone();
            spawn_local(async move {
                let result = match status.get_untracked() {
                    FriendStatus::None => profiles.send_friend_request(&username).await,
                    FriendStatus::PendingIncoming => profiles.accept_friend_request(&username).await,
                    _ => return,
                };
                if let Ok(next) = result {
                    status.set(next);
                }
            });
        }
    };

    view! {
        <section class="townsquare-profile">
            <Show when=move || error.get()>
                <p class="townsquare-error">"Could not load profile."</p>
            </Show>
            {move || profile.get().map(|p| view! {
                <header class="townsquare-profile-header">
                    <h2>{p.name.clone().unwrap_or_else(|| p.username.clone())}</h2>
                    <p class="townsquare-handle">"@"{p.username.clone()}</p>
                    <p class="townsquare-bio">{p.bio.clone().unwrap_or_default()}</p>
                    <p class="townsquare-counts">
                        {format!("{} posts \u{b7} {} friends", p.posts_count, p.friends_count)}
                    </p>
                </header>
            })}
            {move || {
                let label = match status.get() {
                    FriendStatus::SelfProfile => return ().into_any(),
                    FriendStatus::None => "Add friend",
                    FriendStatus::PendingOutgoing => "Request sent",
                    FriendStatus::PendingIncoming => "Accept request",
                    FriendStatus::Friends => "Friends",
                };
                let enabled = matches!(status.get(), FriendStatus::None | FriendStatus::PendingIncoming);
                view! {
                    <button class="townsquare-btn" disabled=!enabled on:click=friend_action.clone()>
                        {label}
                    </button>
                }
                .into_any()
            }}
            <TimelineView scope=Scope::Author(username) />
        </section>
    }
}
