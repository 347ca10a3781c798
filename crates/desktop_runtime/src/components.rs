//! Desktop shell UI composition and pointer interaction surfaces.

pub mod chat;
mod taskbar;
mod window;

use leptos::*;

use self::{taskbar::Taskbar, window::DesktopWindow};

use crate::{
    apps,
    interaction::PointerPosition,
    model::{WindowId, WindowRecord},
    runtime_context::DesktopRuntime,
};

pub(crate) const TASKBAR_HEIGHT_PX: i32 = 38;

fn stop_mouse_event(ev: &web_sys::MouseEvent) {
    ev.prevent_default();
    ev.stop_propagation();
}

fn pointer_from_pointer_event(ev: &web_sys::PointerEvent) -> PointerPosition {
    PointerPosition {
        x: ev.client_x(),
        y: ev.client_y(),
    }
}

/// Primary-button mouse presses and primary touch/pen contacts start gestures.
fn is_primary_pointer(ev: &web_sys::PointerEvent) -> bool {
    if ev.pointer_type() == "mouse" {
        ev.button() == 0
    } else {
        ev.is_primary()
    }
}

/// Taskbar order: windows in the order they were opened, which never changes with focus.
fn taskbar_windows(windows: &[WindowRecord]) -> Vec<(WindowId, String, String)> {
    windows
        .iter()
        .map(|w| (w.id.clone(), w.title.clone(), w.icon.clone()))
        .collect()
}

#[component]
/// Renders the launcher, the window layer, and the taskbar for `runtime`.
pub fn DesktopShell(runtime: DesktopRuntime) -> impl IntoView {
    let state = runtime.state;

    let on_pointer_move = move |ev: web_sys::PointerEvent| {
        runtime.pointer_moved(pointer_from_pointer_event(&ev));
    };
    let on_pointer_end = move |_| runtime.end_pointer_interaction();

    view! {
        <div
            id="desktop-shell-root"
            class="desktop-shell"
            tabindex="-1"
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_end
            on:pointercancel=on_pointer_end
        >
            <div class="desktop-backdrop">
                <nav class="desktop-launcher" aria-label="Apps">
                    <For each=apps::launcher_apps key=|app| app.app_id.window_id().0 let:app>
                        <button
                            type="button"
                            class="desktop-icon"
                            on:click=move |_| {
                                runtime.open_app(app.app_id);
                            }
                        >
                            <span class="desktop-icon-glyph" aria-hidden="true">
                                {app.app_id.icon()}
                            </span>
                            <span>{app.launcher_label}</span>
                        </button>
                    </For>
                </nav>

                <div class="desktop-window-layer">
                    <For
                        each=move || state.get().windows
                        key=|win| win.id.0.clone()
                        let:win
                    >
                        <DesktopWindow runtime=runtime window_id=win.id />
                    </For>
                </div>
            </div>

            <Taskbar runtime=runtime />
        </div>
    }
}
