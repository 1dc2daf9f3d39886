//! History API router.
//!
//! Every navigation goes through the same guard: a protected route without a
//! session lands on login, login/signup with a session land on the dashboard.
//! The session state is injected as a signal so the router knows nothing
//! about authentication itself.

use leptos::prelude::*;
use tracing::debug;
use wasm_bindgen::prelude::*;

use super::route::AppRoute;

fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

fn write_history(path: &str, push: bool) {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    let _ = if push {
        history.push_state_with_url(&JsValue::NULL, "", Some(path))
    } else {
        history.replace_state_with_url(&JsValue::NULL, "", Some(path))
    };
}

/// Where `target` actually leads for the given session state.
fn guard(target: AppRoute, is_auth: bool) -> AppRoute {
    if target.requires_auth() && !is_auth {
        AppRoute::auth_failure_redirect()
    } else if target.should_redirect_when_authenticated() && is_auth {
        AppRoute::auth_success_redirect()
    } else {
        target
    }
}

#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: ReadSignal<AppRoute>,
    set_route: WriteSignal<AppRoute>,
    is_authenticated: Signal<bool>,
}

impl RouterService {
    fn new(is_authenticated: Signal<bool>) -> Self {
        let requested = AppRoute::from_path(&current_path());
        let initial = guard(requested, is_authenticated.get_untracked());
        if initial != requested {
            write_history(initial.to_path(), false);
        }
        let (current_route, set_route) = signal(initial);

        Self {
            current_route,
            set_route,
            is_authenticated,
        }
    }

    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    pub fn navigate(&self, route: AppRoute) {
        self.go(route, true);
    }

    fn go(&self, target: AppRoute, push: bool) {
        let resolved = guard(target, self.is_authenticated.get_untracked());
        if resolved != target {
            debug!(from = %target, to = %resolved, "route redirected");
        }
        write_history(resolved.to_path(), push);
        self.set_route.set(resolved);
    }

    /// Back/forward buttons run through the same guard.
    fn listen_popstate(&self) {
        let router = *self;
        let closure = Closure::<dyn Fn()>::new(move || {
            router.go(AppRoute::from_path(&current_path()), false);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // lives as long as the page
        closure.forget();
    }

    /// Re-checks the current route whenever the session appears or vanishes.
    fn follow_auth(&self) {
        let router = *self;
        Effect::new(move |_| {
            let is_auth = router.is_authenticated.get();
            let route = router.current_route.get_untracked();
            let resolved = guard(route, is_auth);
            if resolved != route {
                debug!(authenticated = is_auth, to = %resolved, "session changed, redirecting");
                write_history(resolved.to_path(), true);
                router.set_route.set(resolved);
            }
        });
    }
}

pub fn use_router() -> RouterService {
    expect_context::<RouterService>()
}

#[component]
pub fn Router(is_authenticated: Signal<bool>, children: Children) -> impl IntoView {
    let router = RouterService::new(is_authenticated);
    router.listen_popstate();
    router.follow_auth();
    provide_context(router);

    children()
}

#[component]
pub fn RouterOutlet(matcher: fn(AppRoute) -> AnyView) -> impl IntoView {
    let router = use_router();
    move || matcher(router.current_route().get())
}

/// In-app link that navigates without a page load.
#[component]
pub fn Link(
    to: AppRoute,
    #[prop(optional, into)] class: String,
    children: Children,
) -> impl IntoView {
    let router = use_router();
    let on_click = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        router.navigate(to);
    };

    view! {
        <a href=to.to_path() class=class on:click=on_click>
            {children()}
        </a>
    }
}
