//! Browser client for the streaming agent endpoints.
//!
//! Posts the conversation as JSON with `fetch`, reads the response body incrementally, and hands
//! every decoded [`StreamEvent`] to the caller as it arrives.

use std::cell::Cell;
use std::rc::Rc;

use agent_stream_contract::{ChatMessage, ChatRequest, ErrorBody, StreamEvent};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatClientError {
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Request(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("failed to read response stream: {0}")]
    Read(String),
    #[error("request was aborted")]
    Aborted,
    #[error("streaming requests are only available when compiled for wasm32")]
    Unsupported,
}

impl ChatClientError {
    /// Whether the request ended because its [`AbortHandle`] fired rather than failing.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// Cancels one in-flight [`stream_chat`] call.
///
/// Aborting drops the browser connection, which the server sees as a client disconnect.
/// Clones share the same request.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    aborted: Rc<Cell<bool>>,
    #[cfg(target_arch = "wasm32")]
    controller: Option<web_sys::AbortController>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self {
            aborted: Rc::default(),
            #[cfg(target_arch = "wasm32")]
            controller: web_sys::AbortController::new().ok(),
        }
    }

    pub fn abort(&self) {
        if self.aborted.replace(true) {
            return;
        }
        #[cfg(target_arch = "wasm32")]
        if let Some(controller) = &self.controller {
            controller.abort();
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.get()
    }

    #[cfg(target_arch = "wasm32")]
    fn signal(&self) -> Option<web_sys::AbortSignal> {
        self.controller.as_ref().map(web_sys::AbortController::signal)
    }
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_request(messages: &[ChatMessage]) -> Result<String, ChatClientError> {
    let body = ChatRequest {
        messages: messages.to_vec(),
    };
    Ok(serde_json::to_string(&body)?)
}

/// Extracts the `{ "error": ... }` message of a failed response, falling back to the status.
fn status_error(status: u16, body: &str) -> ChatClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| format!("Request failed with status {status}"));
    ChatClientError::Status { status, message }
}

/// Streams the agent's reply to `messages` from `endpoint`, calling `on_event` per event.
///
/// Resolves once the `[DONE]` terminator arrives or the body ends, or with
/// [`ChatClientError::Aborted`] after `abort` fires.
pub async fn stream_chat(
    endpoint: &str,
    messages: &[ChatMessage],
    abort: &AbortHandle,
    on_event: impl FnMut(StreamEvent),
) -> Result<(), ChatClientError> {
    if abort.is_aborted() {
        return Err(ChatClientError::Aborted);
    }
    let body = encode_request(messages)?;
    imp::stream_chat(endpoint, body, abort, on_event).await
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use agent_stream_contract::{SseDecoder, SseFrame, StreamEvent};
    use js_sys::{Reflect, Uint8Array};
    use leptos::logging;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Headers, ReadableStreamDefaultReader, Request, RequestInit, Response};

    use super::{status_error, AbortHandle, ChatClientError};

    fn js_error_to_string(err: JsValue) -> String {
        if let Some(text) = err.as_string() {
            return text;
        }
        if let Ok(message) = Reflect::get(&err, &JsValue::from_str("message")) {
            if let Some(text) = message.as_string() {
                return text;
            }
        }
        format!("{err:?}")
    }

    fn request_error(err: JsValue) -> ChatClientError {
        ChatClientError::Request(js_error_to_string(err))
    }

    fn read_error(err: JsValue) -> ChatClientError {
        ChatClientError::Read(js_error_to_string(err))
    }

    /// Returns `true` once the terminator has been seen.
    fn dispatch_frames(frames: Vec<SseFrame>, on_event: &mut impl FnMut(StreamEvent)) -> bool {
        for frame in frames {
            match frame.to_stream_event() {
                None => return true,
                Some(Ok(event)) => on_event(event),
                Some(Err(err)) => logging::warn!("skipping malformed stream event: {err}"),
            }
        }
        false
    }

    pub(super) async fn stream_chat(
        endpoint: &str,
        body: String,
        abort: &AbortHandle,
        mut on_event: impl FnMut(StreamEvent),
    ) -> Result<(), ChatClientError> {
        // A rejection caused by the abort signal is reported as `Aborted`.
        let request_error = |err: JsValue| {
            if abort.is_aborted() {
                ChatClientError::Aborted
            } else {
                request_error(err)
            }
        };
        let read_error = |err: JsValue| {
            if abort.is_aborted() {
                ChatClientError::Aborted
            } else {
                read_error(err)
            }
        };

        let window = web_sys::window()
            .ok_or_else(|| ChatClientError::Request("no browser window".to_string()))?;

        let headers = Headers::new().map_err(request_error)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(request_error)?;
        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));
        init.set_signal(abort.signal().as_ref());
        let request = Request::new_with_str_and_init(endpoint, &init).map_err(request_error)?;

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(request_error)?
            .dyn_into()
            .map_err(request_error)?;

        if !response.ok() {
            let text = match response.text() {
                Ok(promise) => JsFuture::from(promise)
                    .await
                    .ok()
                    .and_then(|value| value.as_string())
                    .unwrap_or_default(),
                Err(_) => String::new(),
            };
            return Err(status_error(response.status(), &text));
        }

        let Some(stream) = response.body() else {
            return Ok(());
        };
        let reader: ReadableStreamDefaultReader =
            stream
                .get_reader()
                .dyn_into()
                .map_err(|reader: js_sys::Object| read_error(reader.into()))?;

        let mut decoder = SseDecoder::new();
        loop {
            if abort.is_aborted() {
                return Err(ChatClientError::Aborted);
            }
            let chunk = JsFuture::from(reader.read()).await.map_err(read_error)?;
            let done = Reflect::get(&chunk, &JsValue::from_str("done"))
                .map_err(read_error)?
                .as_bool()
                .unwrap_or(true);
            if done {
                break;
            }
            let value = Reflect::get(&chunk, &JsValue::from_str("value")).map_err(read_error)?;
            let bytes = Uint8Array::new(&value).to_vec();
            if dispatch_frames(decoder.push_bytes(&bytes), &mut on_event) {
                reader.release_lock();
                return Ok(());
            }
        }

        if let Some(frame) = decoder.finish() {
            dispatch_frames(vec![frame], &mut on_event);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use agent_stream_contract::StreamEvent;

    use super::{AbortHandle, ChatClientError};

    pub(super) async fn stream_chat(
        _endpoint: &str,
        _body: String,
        _abort: &AbortHandle,
        _on_event: impl FnMut(StreamEvent),
    ) -> Result<(), ChatClientError> {
        Err(ChatClientError::Unsupported)
    }
}
