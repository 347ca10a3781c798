use super::*;

#[component]
pub(super) fn Taskbar(runtime: DesktopRuntime) -> impl IntoView {
    let state = runtime.state;

    view! {
        <footer
            class="taskbar"
            role="toolbar"
            aria-label="Running windows"
            style=format!("height:{TASKBAR_HEIGHT_PX}px;")
        >
            <div class="taskbar-running-strip">
                <For
                    each=move || state.with(|s| taskbar_windows(&s.windows))
                    key=|(id, _, _)| id.0.clone()
                    let:entry
                >
                    {
                        let (window_id, title, icon) = entry;
                        let id = store_value(window_id);
                        let status = Signal::derive(move || {
                            id.with_value(|id| {
                                state.with(|s| {
                                    s.window(id)
                                        .map(|w| (w.is_focused, w.is_minimized))
                                        .unwrap_or((false, false))
                                })
                            })
                        });
                        view! {
                            <button
                                type="button"
                                class=move || {
                                    let (focused, minimized) = status.get();
                                    format!(
                                        "taskbar-app{}{}",
                                        if focused { " focused" } else { "" },
                                        if minimized { " minimized" } else { "" },
                                    )
                                }
                                aria-pressed=move || status.get().0.to_string()
                                on:mousedown=move |ev| stop_mouse_event(&ev)
                                on:click=move |_| {
                                    id.with_value(|id| runtime.activate(id));
                                }
                            >
                                <span class="taskbar-app-icon" aria-hidden="true">{icon}</span>
                                <span class="taskbar-app-label">{title}</span>
                            </button>
                        }
                    }
                </For>
            </div>
        </footer>
    }
}
