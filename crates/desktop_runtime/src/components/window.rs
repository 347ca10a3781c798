use super::*;
use crate::apps::Transcript;
use crate::interaction::ResizeEdge;
use crate::reducer::WindowAction;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

#[cfg(target_arch = "wasm32")]
fn try_set_pointer_capture(ev: &web_sys::PointerEvent) {
    if let Some(target) = ev.current_target() {
        if let Ok(element) = target.dyn_into::<web_sys::Element>() {
            let _ = element.set_pointer_capture(ev.pointer_id());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn try_set_pointer_capture(_: &web_sys::PointerEvent) {}

fn window_style(win: &WindowRecord, preview: Option<crate::model::WindowRect>) -> String {
    if win.is_maximized {
        return format!(
            "left:0;top:0;width:100%;height:calc(100% - {TASKBAR_HEIGHT_PX}px);z-index:{};",
            win.z_index
        );
    }
    let rect = preview.unwrap_or(win.rect);
    format!(
        "left:{}px;top:{}px;width:{}px;height:{}px;z-index:{};",
        rect.x, rect.y, rect.width, rect.height, win.z_index
    )
}

#[component]
pub(super) fn DesktopWindow(runtime: DesktopRuntime, window_id: WindowId) -> impl IntoView {
    let Some(initial) = runtime
        .state
        .with_untracked(|state| state.window(&window_id).cloned())
    else {
        return ().into_view();
    };
    let id = store_value(window_id);
    // Outlives the body view so the conversation survives minimize and restore.
    let transcript = create_rw_signal(Transcript::default());

    let window = Signal::derive(move || {
        id.with_value(|id| runtime.state.with(|state| state.window(id).cloned()))
    });
    let preview = Signal::derive(move || {
        id.with_value(|id| runtime.interaction.with(|i| i.preview_rect(id)))
    });
    let visible =
        Signal::derive(move || window.with(|w| w.as_ref().is_some_and(|w| !w.is_minimized)));
    let maximized =
        Signal::derive(move || window.with(|w| w.as_ref().is_some_and(|w| w.is_maximized)));

    let focus = move |_: web_sys::PointerEvent| {
        id.with_value(|id| runtime.focus_from_pointer(id));
    };
    let minimize = move || {
        id.with_value(|id| {
            runtime.dispatch(WindowAction::Minimize {
                window_id: id.clone(),
            })
        });
    };
    let toggle_maximize = move || {
        id.with_value(|id| {
            runtime.dispatch(WindowAction::ToggleMaximize {
                window_id: id.clone(),
            })
        });
    };
    let close = move || {
        id.with_value(|id| {
            runtime.dispatch(WindowAction::Close {
                window_id: id.clone(),
            })
        });
    };
    let begin_move = move |ev: web_sys::PointerEvent| {
        if !is_primary_pointer(&ev) {
            return;
        }
        try_set_pointer_capture(&ev);
        ev.prevent_default();
        ev.stop_propagation();
        let pointer = pointer_from_pointer_event(&ev);
        id.with_value(|id| runtime.begin_move(id, pointer));
    };
    let titlebar_double_click = move |ev: web_sys::MouseEvent| {
        stop_mouse_event(&ev);
        toggle_maximize();
    };

    view! {
        // Minimized windows render nothing; the taskbar still lists them.
        <Show when=move || visible.get() fallback=|| ()>
            <section
                class=move || {
                    let focused = window.with(|w| w.as_ref().is_some_and(|w| w.is_focused));
                    format!(
                        "desktop-window{}{}",
                        if focused { " focused" } else { "" },
                        if maximized.get() { " maximized" } else { "" },
                    )
                }
                style=move || {
                    window
                        .get()
                        .map(|w| window_style(&w, preview.get()))
                        .unwrap_or_default()
                }
                on:pointerdown=focus
                role="dialog"
                aria-label=initial.title.clone()
            >
                <header
                    class="titlebar"
                    on:pointerdown=begin_move
                    on:dblclick=titlebar_double_click
                >
                    <div class="titlebar-title">
                        <span class="titlebar-app-icon" aria-hidden="true">
                            {initial.icon.clone()}
                        </span>
                        <span>{initial.title.clone()}</span>
                    </div>
                    <div class="titlebar-controls">
                        <TitlebarButton
                            label="Minimize window"
                            glyph="_"
                            on_press=Callback::new(move |_| minimize())
                        />
                        <TitlebarButton
                            label=Signal::derive(move || {
                                if maximized.get() { "Restore window" } else { "Maximize window" }
                            })
                            glyph=Signal::derive(move || if maximized.get() { "❐" } else { "□" })
                            on_press=Callback::new(move |_| toggle_maximize())
                        />
                        <TitlebarButton
                            label="Close window"
                            glyph="×"
                            on_press=Callback::new(move |_| close())
                        />
                    </div>
                </header>
                <div class="window-body">
                    {crate::apps::render_window_contents(&initial, transcript)}
                </div>
                <Show when=move || !maximized.get() fallback=|| ()>
                    {ResizeEdge::ALL
                        .into_iter()
                        .map(|edge| {
                            view! { <WindowResizeHandle runtime=runtime id=id edge=edge /> }
                        })
                        .collect_view()}
                </Show>
            </section>
        </Show>
    }
    .into_view()
}

#[component]
fn TitlebarButton(
    #[prop(into)] label: MaybeSignal<&'static str>,
    #[prop(into)] glyph: MaybeSignal<&'static str>,
    on_press: Callback<()>,
) -> impl IntoView {
    view! {
        <button
            type="button"
            aria-label=move || label.get()
            on:pointerdown=move |ev: web_sys::PointerEvent| {
                ev.prevent_default();
                ev.stop_propagation();
            }
            on:mousedown=move |ev| stop_mouse_event(&ev)
            on:click=move |ev| {
                stop_mouse_event(&ev);
                on_press.call(());
            }
        >
            {move || glyph.get()}
        </button>
    }
}

#[component]
fn WindowResizeHandle(
    runtime: DesktopRuntime,
    id: StoredValue<WindowId>,
    edge: ResizeEdge,
) -> impl IntoView {
    let class_name = format!("window-resize-handle {}", edge.css_class());

    let on_pointerdown = move |ev: web_sys::PointerEvent| {
        if !is_primary_pointer(&ev) {
            return;
        }
        try_set_pointer_capture(&ev);
        ev.prevent_default();
        ev.stop_propagation();
        let pointer = pointer_from_pointer_event(&ev);
        id.with_value(|id| runtime.begin_resize(id, edge, pointer));
    };

    view! {
        <div
            class=class_name
            aria-hidden="true"
            on:pointerdown=on_pointerdown
        />
    }
}
