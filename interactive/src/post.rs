use std::rc::Rc;

use leptos::prelude::*;
use townsquare_client::timeline::PostEntry;
use townsquare_client::{Route, Timeline, TimelineSnapshot};
use townsquare_shared::{MediaKind, PostId};
use wasm_bindgen_futures::spawn_local;

use crate::browser::{self, Services};

pub type SharedTimeline = StoredValue<Rc<Timeline>, LocalStorage>;

/// Read one field of a post's entry, or the default once the post is gone.
fn pick<T: Default>(
    snapshot: RwSignal<TimelineSnapshot>,
    id: PostId,
    f: impl Fn(&PostEntry) -> T,
) -> T {
    snapshot.with(|s| s.entry(id).map(&f).unwrap_or_default())
}

#[component]
pub fn PostCard(
    id: PostId,
    timeline: SharedTimeline,
    snapshot: RwSignal<TimelineSnapshot>,
) -> impl IntoView {
    let services = expect_context::<Services>();
    let Some(initial) = snapshot.with_untracked(|s| s.entry(id).cloned()) else {
        return ().into_any();
    };
    let post = initial.post;
    let own = timeline.with_value(|t| t.is_own(&post));
    let editing: RwSignal<Option<String>> = RwSignal::new(None);

    let media = post
        .media
        .iter()
        .map(|m| {
            let src = services.media_url(&m.url);
            match m.kind {
                MediaKind::Image => view! { <img class="townsquare-media" src=src alt="" /> }.into_any(),
                MediaKind::Video => {
                    view! { <video class="townsquare-media" src=src controls=true></video> }.into_any()
                }
            }
        })
        .collect_view();

    let on_save = move |_| {
        let Some(text) = editing.get_untracked() else {
            return;
        };
        let timeline = timeline.get_value();
        spawn_local(async move {
            // Keep the editor open on failure so nothing typed is lost.
            if timeline.edit_post(id, &text).await.is_ok() {
                editing.set(None);
            }
        });
    };

    let on_delete = move |_| {
        let timeline = timeline.get_value();
        spawn_local(async move {
            let _ = timeline.delete_post(id, browser::confirm).await;
        });
    };

    let on_share = move |_| {
        let timeline = timeline.get_value();
        spawn_local(async move {
            let _ = timeline.share_post(id).await;
        });
    };

    view! {
        <article class="townsquare-post">
            <header class="townsquare-post-header">
                <a href=Route::Profile(post.username.clone()).path()><strong>{post.username.clone()}</strong></a>
                <time>{post.created_at.clone()}</time>
            </header>
            {move || match editing.get() {
                Some(text) => view! {
                    <div class="townsquare-edit">
                        <textarea
                            class="townsquare-textarea"
                            prop:value=text
                            on:input=move |ev| editing.set(Some(event_target_value(&ev)))
                        />
                        <button class="townsquare-btn townsquare-btn-sm" on:click=on_save>"Save"</button>
                        <button class="townsquare-btn townsquare-btn-sm" on:click=move |_| editing.set(None)>"Cancel"</button>
                    </div>
                }
                .into_any(),
                None => view! {
                    <p class="townsquare-post-body">{move || pick(snapshot, id, |e| e.post.content.clone())}</p>
                }
                .into_any(),
            }}
            <div class="townsquare-media-grid">{media}</div>
            <footer class="townsquare-post-actions">
                <LikeButton id=id timeline=timeline snapshot=snapshot />
                <button class="townsquare-btn townsquare-btn-sm" on:click=move |_| {
                    let timeline = timeline.get_value();
                    spawn_local(async move {
                        let _ = timeline.toggle_comments(id).await;
                    });
                }>
                    {move || format!("Comments {}", pick(snapshot, id, |e| e.post.comments))}
                </button>
                <button class="townsquare-btn townsquare-btn-sm" on:click=on_share>
                    {move || format!("Share {}", pick(snapshot, id, |e| e.post.shares))}
                </button>
                <Show when=move || own>
                    <button
                        class="townsquare-btn townsquare-btn-sm"
                        on:click=move |_| editing.set(Some(pick(snapshot, id, |e| e.post.content.clone())))
                    >
                        "Edit"
                    </button>
                    <button class="townsquare-btn townsquare-btn-sm townsquare-btn-danger" on:click=on_delete>
                        "Delete"
                    </button>
                </Show>
            </footer>
            <Show when=move || pick(snapshot, id, |e| e.thread.open)>
                <CommentThread id=id timeline=timeline snapshot=snapshot />
            </Show>
        </article>
    }
    .into_any()
}

/// Like toggle with count. The count moves before the server answers and
/// snaps back if the request fails.
#[component]
fn LikeButton(
    id: PostId,
    timeline: SharedTimeline,
    snapshot: RwSignal<TimelineSnapshot>,
) -> impl IntoView {
    let on_click = move |_| {
        let timeline = timeline.get_value();
        spawn_local(async move {
            let _ = timeline.toggle_like(id).await;
        });
    };

    view! {
        <button
            class="townsquare-like-btn"
            class:active=move || pick(snapshot, id, |e| e.liked)
            disabled=move || pick(snapshot, id, |e| e.like_pending)
            on:click=on_click
        >
            "\u{2665} "
            {move || pick(snapshot, id, |e| e.post.likes)}
        </button>
    }
}

#[component]
fn CommentThread(
    id: PostId,
    timeline: SharedTimeline,
    snapshot: RwSignal<TimelineSnapshot>,
) -> impl IntoView {
    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let timeline = timeline.get_value();
        spawn_local(async move {
            let _ = timeline.submit_comment_draft(id).await;
        });
    };

    let on_retry = move |_| {
        let timeline = timeline.get_value();
        spawn_local(async move {
            let _ = timeline.retry_comments(id).await;
        });
    };

    view! {
        <section class="townsquare-comments">
            <Show when=move || pick(snapshot, id, |e| e.thread.loading)>
                <p class="townsquare-loading">"Loading comments..."</p>
            </Show>
            {move || {
                pick(snapshot, id, |e| e.thread.error.clone()).map(|msg| {
                    view! {
                        <p class="townsquare-error">
                            {msg}
                            " "
                            <button class="townsquare-link" on:click=on_retry>"Retry"</button>
                        </p>
                    }
                })
            }}
            <ul class="townsquare-comment-list">
                <For
                    each=move || pick(snapshot, id, |e| e.thread.visible().to_vec())
                    key=|c| c.id
                    let:comment
                >
                    <li class="townsquare-comment">
                        <strong>{comment.username.clone()}</strong>
                        " "
                        <span>{comment.content.clone()}</span>
                    </li>
                </For>
            </ul>
            <form class="townsquare-comment-form" on:submit=on_submit>
                <input
                    class="townsquare-input"
                    placeholder="Write a comment..."
                    prop:value=move || pick(snapshot, id, |e| e.thread.draft.clone())
                    on:input=move |ev| {
                        let _ = timeline.with_value(|t| t.set_comment_draft(id, &event_target_value(&ev)));
                    }
                />
                <button
                    class="townsquare-btn townsquare-btn-sm"
                    type="submit"
                    disabled=move || pick(snapshot, id, |e| e.thread.submitting)
                >
                    "Post"
                </button>
            </form>
        </section>
    }
}
