//! Browser desktop shell: window manager state machine, pointer gestures, and Leptos views.

pub mod apps;
pub mod chat_client;
pub mod components;
pub mod interaction;
pub mod model;
pub mod reducer;
pub mod runtime_context;
pub mod telemetry;
pub mod window_manager;

pub use components::DesktopShell;
pub use model::*;
pub use reducer::{reduce_windows, WindowAction, WindowEffect};
pub use runtime_context::DesktopRuntime;
pub use telemetry::{ConsoleTelemetrySink, NoopTelemetrySink, TelemetrySink};
pub use window_manager::WindowManager;
