use std::rc::Rc;

use leptos::prelude::*;
use townsquare_client::api::FilePart;
use townsquare_client::{
    messages, ActionError, Attachment, Composer, Draft, LoadState, Scope, Timeline, ToastKind,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::js_sys::Uint8Array;
use web_sys::{File, HtmlInputElement};

use crate::auth::AuthState;
use crate::browser::Services;
use crate::post::{PostCard, SharedTimeline};

/// A feed or profile timeline with paging controls.
#[component]
pub fn TimelineView(scope: Scope, #[prop(optional)] composer: bool) -> impl IntoView {
    let services = expect_context::<Services>();
    let timeline = Rc::new(Timeline::new(scope, services.context()));
    let snapshot = RwSignal::new(timeline.snapshot());
    timeline.on_change(move |snap| snapshot.set(snap.clone()));
    let timeline: SharedTimeline = StoredValue::new_local(timeline);

    on_cleanup(move || {
        let _ = timeline.try_with_value(|t| t.close());
    });

    let page_size = services.page_size;
    let load_first = move || {
        let timeline = timeline.get_value();
        spawn_local(async move {
            let _ = timeline.load_first(page_size).await;
        });
    };
    load_first();

    let load_next = move |_| {
        let timeline = timeline.get_value();
        spawn_local(async move {
            let _ = timeline.load_next().await;
        });
    };

    view! {
        <div class="townsquare-timeline">
            <Show when=move || composer>
                <PostComposer timeline=timeline />
            </Show>
            <Show when=move || snapshot.with(|s| s.load == LoadState::LoadingFirst)>
                <p class="townsquare-loading">"Loading..."</p>
            </Show>
            {move || match snapshot.with(|s| s.load.clone()) {
                LoadState::Failed(msg) => Some(view! {
                    <p class="townsquare-error">
                        {msg}
                        " "
                        <button class="townsquare-link" on:click=move |_| load_first()>"Retry"</button>
                    </p>
                }),
                _ => None,
            }}
            <For
                each=move || snapshot.with(|s| s.ids())
                key=|id| *id
                let:id
            >
                <PostCard id=id timeline=timeline snapshot=snapshot />
            </For>
            {move || {
                let (load, has_more, empty) =
                    snapshot.with(|s| (s.load.clone(), s.has_more, s.entries.is_empty()));
                match load {
                    LoadState::LoadingMore => view! { <p class="townsquare-loading">"Loading more..."</p> }.into_any(),
                    LoadState::FailedMore(msg) => view! {
                        <p class="townsquare-error">
                            {msg}
                            " "
                            <button class="townsquare-link" on:click=load_next>"Retry"</button>
                        </p>
                    }
                    .into_any(),
                    LoadState::Ready if has_more => view! {
                        <button class="townsquare-btn townsquare-load-more" on:click=load_next>"Load more"</button>
                    }
                    .into_any(),
                    LoadState::Ready if empty => view! { <p class="townsquare-hint">"No posts yet."</p> }.into_any(),
                    _ => ().into_any(),
                }
            }}
        </div>
    }
}

async fn read_file(file: &File) -> Result<FilePart, JsValue> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    Ok(FilePart {
        filename: file.name(),
        mime: Some(file.type_()).filter(|m| !m.is_empty()),
        bytes: Uint8Array::new(&buffer).to_vec(),
    })
}

/// Composer above the feed: text plus picked files, uploaded on publish.
/// Published posts go to the top of the list.
#[component]
fn PostComposer(timeline: SharedTimeline) -> impl IntoView {
    let services = expect_context::<Services>();
    let auth = expect_context::<AuthState>();
    let composer = StoredValue::new_local(Rc::new(Composer::new(services.context())));
    let draft = StoredValue::new_local(Draft::default());
    let text = RwSignal::new(String::new());
    let files: RwSignal<Vec<String>> = RwSignal::new(Vec::new());
    let publishing = RwSignal::new(false);

    let sync_files = move || {
        files.set(draft.with_value(|d| {
            d.attachments().iter().map(|a| a.name().to_string()).collect()
        }))
    };

    let on_pick = move |ev: leptos::ev::Event| {
        let input: HtmlInputElement = event_target(&ev);
        let Some(list) = input.files() else {
            return;
        };
        let picked: Vec<File> = (0..list.length()).filter_map(|i| list.get(i)).collect();
        input.set_value("");
        spawn_local(async move {
            for file in picked {
                let part = match read_file(&file).await {
                    Ok(part) => part,
                    Err(_) => {
                        services.context().notify(
                            ToastKind::Error,
                            &messages::upload_failed(&file.name(), messages::UPLOAD_FAILED),
                        );
                        continue;
                    }
                };
                let attached = draft.try_update_value(|d| d.attach(Attachment::pending(part)));
                if let Some(Err(ActionError::Validation(msg))) = attached {
                    services.context().notify(ToastKind::Error, msg);
                    break;
                }
            }
            sync_files();
        });
    };

    let remove = move |index: usize| {
        draft.update_value(|d| {
            d.remove(index);
        });
        sync_files();
    };

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let composer = composer.get_value();
        let timeline = timeline.get_value();
        let mut pending = draft.get_value();
        pending.content = text.get_untracked();
        publishing.set(true);
        spawn_local(async move {
            match composer.publish(&mut pending).await {
                Ok(post) => {
                    text.set(String::new());
                    draft.set_value(Draft::default());
                    timeline.prepend_published(post);
                }
                // Keeps whatever finished uploading for the next attempt.
                Err(_) => draft.set_value(pending),
            }
            sync_files();
            publishing.set(false);
        });
    };

    move || {
        if auth.username.get().is_some() {
            view! {
                <form class="townsquare-composer" on:submit=on_submit>
                    <textarea
                        class="townsquare-textarea"
                        placeholder="What's on your mind?"
                        prop:value=move || text.get()
                        on:input=move |ev| text.set(event_target_value(&ev))
                    />
                    <ul class="townsquare-attachments">
                        {move || {
                            files
                                .get()
                                .into_iter()
                                .enumerate()
                                .map(|(i, name)| view! {
                                    <li>
                                        {name}
                                        " "
                                        <button
                                            class="townsquare-link"
                                            type="button"
                                            disabled=move || publishing.get()
                                            on:click=move |_| remove(i)
                                        >
                                            "Remove"
                                        </button>
                                    </li>
                                })
                                .collect_view()
                        }}
                    </ul>
                    <input
                        class="townsquare-file"
                        type="file"
                        accept="image/*,video/*"
                        multiple=true
                        disabled=move || publishing.get()
                        on:change=on_pick
                    />
                    <button class="townsquare-btn" type="submit" disabled=move || publishing.get()>
                        {move || if publishing.get() { "Posting..." } else { "Post" }}
                    </button>
                </form>
            }
            .into_any()
        } else {
            view! { <p class="townsquare-hint">"Log in to post."</p> }.into_any()
        }
    }
}
