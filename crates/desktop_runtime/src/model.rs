use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// First z-index handed out is `BASE_Z_INDEX + 1`; values at or below it belong to static chrome.
pub const BASE_Z_INDEX: u32 = 100;
pub const DEFAULT_WINDOW_WIDTH: i32 = 420;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 300;
pub const DEFAULT_MIN_WINDOW_WIDTH: i32 = 220;
pub const DEFAULT_MIN_WINDOW_HEIGHT: i32 = 140;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub String);

impl WindowId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppId {
    Chat,
    CustomerResearch,
    About,
}

impl AppId {
    pub fn title(self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::CustomerResearch => "Customer Research",
            Self::About => "About",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Chat => "💬",
            Self::CustomerResearch => "🔎",
            Self::About => "ℹ️",
        }
    }

    /// Stable window id for single-instance apps; reopening focuses the existing window.
    pub fn window_id(self) -> WindowId {
        match self {
            Self::Chat => WindowId::from("chat"),
            Self::CustomerResearch => WindowId::from("customer-research"),
            Self::About => WindowId::from("about"),
        }
    }
}

/// Caller-owned payload rendered inside a window. The window manager never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowContent {
    pub app_id: AppId,
    pub launch_params: Value,
}

impl WindowContent {
    pub fn app(app_id: AppId) -> Self {
        Self {
            app_id,
            launch_params: Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowRect {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

impl Default for WindowRect {
    fn default() -> Self {
        Self {
            x: 48,
            y: 48,
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub title: String,
    pub icon: String,
    pub content: WindowContent,
    pub rect: WindowRect,
    pub min_width: i32,
    pub min_height: i32,
    pub z_index: u32,
    pub is_minimized: bool,
    pub is_maximized: bool,
    pub is_focused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenWindowRequest {
    pub id: WindowId,
    pub title: String,
    pub icon: String,
    pub content: WindowContent,
    pub rect: WindowRect,
    pub min_width: i32,
    pub min_height: i32,
    pub is_minimized: bool,
    pub is_maximized: bool,
}

impl OpenWindowRequest {
    pub fn new(id: impl Into<WindowId>, title: impl Into<String>, content: WindowContent) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            icon: content.app_id.icon().to_string(),
            content,
            rect: WindowRect::default(),
            min_width: DEFAULT_MIN_WINDOW_WIDTH,
            min_height: DEFAULT_MIN_WINDOW_HEIGHT,
            is_minimized: false,
            is_maximized: false,
        }
    }

    /// Request for the single window of `app_id`.
    pub fn for_app(app_id: AppId) -> Self {
        Self::new(app_id.window_id(), app_id.title(), WindowContent::app(app_id))
    }

    pub fn with_rect(mut self, rect: WindowRect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_min_size(mut self, min_width: i32, min_height: i32) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }
}

impl From<String> for WindowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Complete window-manager state. Collection order carries no meaning; stacking is `z_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowManagerState {
    pub windows: Vec<WindowRecord>,
    pub top_z_index: u32,
}

impl Default for WindowManagerState {
    fn default() -> Self {
        Self {
            windows: Vec::new(),
            top_z_index: BASE_Z_INDEX,
        }
    }
}

impl WindowManagerState {
    pub fn window(&self, window_id: &WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| &w.id == window_id)
    }

    pub fn focused_window_id(&self) -> Option<&WindowId> {
        self.windows.iter().find(|w| w.is_focused).map(|w| &w.id)
    }

    /// Windows ordered bottom to top.
    pub fn stacking_order(&self) -> Vec<&WindowRecord> {
        let mut windows: Vec<&WindowRecord> = self.windows.iter().collect();
        windows.sort_by_key(|w| w.z_index);
        windows
    }
}
