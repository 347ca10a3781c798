//! App registry and window-content rendering for the desktop's built-in apps.

mod transcript;

use leptos::*;

use crate::{
    components::chat::ChatPane,
    model::{AppId, OpenWindowRequest, WindowRecord, WindowRect},
};

pub use transcript::{ToolActivity, Transcript, TranscriptMessage, TranscriptStatus};

pub const CHAT_ENDPOINT: &str = "/api/chat";
pub const CUSTOMER_RESEARCH_ENDPOINT: &str = "/api/customer-research";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppDescriptor {
    pub app_id: AppId,
    pub launcher_label: &'static str,
    pub show_in_launcher: bool,
    /// Streaming endpoint the app's pane posts its transcript to.
    pub endpoint: Option<&'static str>,
    pub placeholder: &'static str,
    pub default_rect: WindowRect,
}

const CHAT_APP: AppDescriptor = AppDescriptor {
    app_id: AppId::Chat,
    launcher_label: "Chat",
    show_in_launcher: true,
    endpoint: Some(CHAT_ENDPOINT),
    placeholder: "Ask anything...",
    default_rect: WindowRect {
        x: 72,
        y: 56,
        width: 480,
        height: 420,
    },
};

const CUSTOMER_RESEARCH_APP: AppDescriptor = AppDescriptor {
    app_id: AppId::CustomerResearch,
    launcher_label: "Customer Research",
    show_in_launcher: true,
    endpoint: Some(CUSTOMER_RESEARCH_ENDPOINT),
    placeholder: "Describe the customer or paste a company URL...",
    default_rect: WindowRect {
        x: 136,
        y: 88,
        width: 560,
        height: 480,
    },
};

const ABOUT_APP: AppDescriptor = AppDescriptor {
    app_id: AppId::About,
    launcher_label: "About",
    show_in_launcher: true,
    endpoint: None,
    placeholder: "",
    default_rect: WindowRect {
        x: 200,
        y: 120,
        width: 340,
        height: 220,
    },
};

const APP_REGISTRY: [AppDescriptor; 3] = [CHAT_APP, CUSTOMER_RESEARCH_APP, ABOUT_APP];

pub fn app_registry() -> &'static [AppDescriptor] {
    &APP_REGISTRY
}

pub fn launcher_apps() -> Vec<AppDescriptor> {
    app_registry()
        .iter()
        .copied()
        .filter(|entry| entry.show_in_launcher)
        .collect()
}

pub fn app_descriptor(app_id: AppId) -> &'static AppDescriptor {
    match app_id {
        AppId::Chat => &CHAT_APP,
        AppId::CustomerResearch => &CUSTOMER_RESEARCH_APP,
        AppId::About => &ABOUT_APP,
    }
}

pub fn default_open_request(app_id: AppId) -> OpenWindowRequest {
    let descriptor = app_descriptor(app_id);
    let request = OpenWindowRequest::for_app(app_id).with_rect(descriptor.default_rect);
    match app_id {
        AppId::About => request.with_min_size(280, 160),
        AppId::Chat | AppId::CustomerResearch => request.with_min_size(320, 240),
    }
}

/// Mounts the app view for `window`; agent apps render into the window-owned `transcript`.
pub fn render_window_contents(window: &WindowRecord, transcript: RwSignal<Transcript>) -> View {
    let descriptor = app_descriptor(window.content.app_id);
    match descriptor.endpoint {
        Some(endpoint) => view! {
            <ChatPane endpoint=endpoint placeholder=descriptor.placeholder transcript=transcript />
        }
        .into_view(),
        None => render_about(),
    }
}

fn render_about() -> View {
    view! {
        <div class="app app-about">
            <p><strong>"Agent Desktop"</strong></p>
            <p>"Chat and customer research agents, streamed into draggable windows."</p>
        </div>
    }
    .into_view()
}
