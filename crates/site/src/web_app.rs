use std::rc::Rc;

use desktop_runtime::{ConsoleTelemetrySink, DesktopRuntime, DesktopShell};
use leptos::*;
use leptos_meta::*;

#[component]
pub fn SiteApp() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Agent Desktop" />
        <Meta name="description" content="A desktop-style shell for streaming chat and customer research agents." />

        <main class="site-root">
            <DesktopEntry />
        </main>
    }
}

/// Builds the window manager instance for this page and hands it to the shell.
#[component]
pub fn DesktopEntry() -> impl IntoView {
    let runtime = DesktopRuntime::new(Rc::new(ConsoleTelemetrySink::new()));

    view! { <DesktopShell runtime=runtime /> }
}
