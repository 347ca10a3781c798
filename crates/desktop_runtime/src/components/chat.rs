//! Chat pane shared by the agent apps: transcript view plus composer.

use std::cell::RefCell;
use std::rc::Rc;

use agent_stream_contract::ChatRole;
use leptos::*;

use crate::{
    apps::{ToolActivity, Transcript, TranscriptMessage, TranscriptStatus},
    chat_client::{self, AbortHandle, ChatClientError},
};

fn tool_label(activity: &ToolActivity) -> String {
    match activity.elapsed {
        Some(elapsed) => format!("{} ({elapsed:.1}s)", activity.tool),
        None => activity.tool.clone(),
    }
}

/// Folds the end of a request into the transcript. An aborted request ends quietly.
fn settle(transcript: &mut Transcript, result: &Result<(), ChatClientError>) {
    if let Err(err) = result {
        if !err.is_abort() {
            transcript.fail(err.to_string());
        }
    }
    transcript.finish();
}

fn render_message(message: &TranscriptMessage) -> View {
    let role_class = match message.role {
        ChatRole::User => "chat-message user",
        ChatRole::Assistant => "chat-message assistant",
    };
    let tools = message
        .tools
        .iter()
        .map(|activity| view! { <li class="chat-tool">{tool_label(activity)}</li> })
        .collect_view();
    let error = message
        .error
        .clone()
        .map(|error| view! { <p class="chat-error" role="alert">{error}</p> });

    view! {
        <div class=role_class>
            <ul class="chat-tools">{tools}</ul>
            <p class="chat-text">{message.content.clone()}</p>
            {error}
        </div>
    }
    .into_view()
}

#[component]
pub fn ChatPane(
    endpoint: &'static str,
    placeholder: &'static str,
    transcript: RwSignal<Transcript>,
) -> impl IntoView {
    let draft = create_rw_signal(String::new());
    let streaming = Signal::derive(move || transcript.with(Transcript::is_streaming));

    // Closing the window aborts the in-flight request so the server stops the agent run.
    let in_flight: Rc<RefCell<Option<AbortHandle>>> = Rc::default();
    let in_flight_slot = store_value(Rc::clone(&in_flight));
    on_cleanup(move || {
        if let Some(handle) = in_flight.borrow_mut().take() {
            handle.abort();
        }
    });

    let send = move || {
        let text = draft.get_untracked();
        let mut accepted = false;
        transcript.update(|t| accepted = t.push_user(&text));
        if !accepted {
            return;
        }
        draft.set(String::new());
        let messages = transcript.with_untracked(Transcript::request_messages);
        let abort = AbortHandle::new();
        in_flight_slot.with_value(|slot| *slot.borrow_mut() = Some(abort.clone()));

        spawn_local(async move {
            let result = chat_client::stream_chat(endpoint, &messages, &abort, |event| {
                transcript.try_update(|t| t.apply(&event));
            })
            .await;
            match &result {
                Err(err) if err.is_abort() => logging::log!("{endpoint} request aborted"),
                Err(err) => logging::warn!("{endpoint} stream failed: {err}"),
                Ok(()) => {}
            }
            transcript.try_update(|t| settle(t, &result));
        });
    };

    view! {
        <div class="app app-chat">
            <div class="chat-log" aria-live="polite">
                {move || {
                    transcript.with(|t| t.messages.iter().map(render_message).collect_view())
                }}
                <Show when=move || streaming.get() fallback=|| ()>
                    <p class="chat-status">"Working..."</p>
                </Show>
            </div>
            <form
                class="chat-composer"
                on:submit=move |ev: ev::SubmitEvent| {
                    ev.prevent_default();
                    send();
                }
            >
                <textarea
                    rows="2"
                    placeholder=placeholder
                    prop:value=move || draft.get()
                    on:input=move |ev| draft.set(event_target_value(&ev))
                    on:keydown=move |ev: ev::KeyboardEvent| {
                        if ev.key() == "Enter" && !ev.shift_key() {
                            ev.prevent_default();
                            send();
                        }
                    }
                />
                <button type="submit" disabled=move || streaming.get()>
                    "Send"
                </button>
            </form>
            <div class="app-statusbar">
                <span>
                    {move || match transcript.with(|t| t.status.clone()) {
                        TranscriptStatus::Idle => "Ready".to_string(),
                        TranscriptStatus::Streaming => "Streaming".to_string(),
                        TranscriptStatus::Failed(message) => format!("Failed: {message}"),
                    }}
                </span>
            </div>
        </div>
    }
}
