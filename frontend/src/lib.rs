//! GlycoWatch 前端应用
//!
//! Leptos CSR shell around the `glycowatch` core:
//! - `web`: browser bindings (fetch, localStorage, setInterval, History API)
//! - `auth`: session context shared by all pages
//! - `components`: pages and their widgets

mod auth;
mod components {
    pub mod dashboard;
    pub mod history_table;
    pub mod login;
    pub mod prediction_panel;
    pub mod sensor_cards;
    pub mod signup;
}
pub mod logging;
pub mod panic_hook;
pub(crate) mod web;

use crate::auth::AuthContext;
use crate::components::dashboard::DashboardPage;
use crate::components::login::LoginPage;
use crate::components::signup::SignupPage;

use leptos::prelude::*;

use web::route::AppRoute;
use web::router::{Link, Router, RouterOutlet};

fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Signup => view! { <SignupPage /> }.into_any(),
        AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                    <Link to=AppRoute::Login class="btn btn-primary mt-6">"Back to login"</Link>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    let auth = AuthContext::new();
    provide_context(auth);

    view! {
        <Router is_authenticated=auth.is_authenticated_signal()>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
