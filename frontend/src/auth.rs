//! Session context shared by every page.
//!
//! Holds the one API client for the app and mirrors the stored session into
//! signals. The router only sees `authenticated`; when the API client reports
//! an expired session the signal drops and the router sends the user to login.

use std::rc::Rc;

use glycowatch::{
    ClientConfig, ClientResult, DashboardController, EnvSource, GlycoApi, SessionStore,
};
use glycowatch_shared::{SignupRequest, User};
use leptos::prelude::*;

use crate::web::{BrowserStorage, FetchClient, IntervalTicker};

pub type BrowserApi = GlycoApi<FetchClient, BrowserStorage>;
pub type BrowserController = DashboardController<FetchClient, BrowserStorage, IntervalTicker>;

/// Configuration baked in by the build (`GLYCOWATCH_API_URL=... trunk build`).
struct BuildEnv;

impl EnvSource for BuildEnv {
    fn var(&self, name: &str) -> Option<String> {
        let value = match name {
            "GLYCOWATCH_API_URL" => option_env!("GLYCOWATCH_API_URL"),
            "GLYCOWATCH_TOKEN_KEY" => option_env!("GLYCOWATCH_TOKEN_KEY"),
            "GLYCOWATCH_USER_KEY" => option_env!("GLYCOWATCH_USER_KEY"),
            "GLYCOWATCH_REFRESH_SECS" => option_env!("GLYCOWATCH_REFRESH_SECS"),
            _ => None,
        };
        value.map(str::to_string)
    }
}

#[derive(Clone, Copy)]
pub struct AuthContext {
    api: StoredValue<Rc<BrowserApi>, LocalStorage>,
    config: StoredValue<ClientConfig>,
    pub authenticated: RwSignal<bool>,
    pub user: RwSignal<Option<User>>,
}

impl AuthContext {
    pub fn new() -> Self {
        let config = ClientConfig::from_env(&BuildEnv);
        let session = Rc::new(SessionStore::from_config(BrowserStorage, &config));
        let api = Rc::new(GlycoApi::from_config(&config, FetchClient, session));

        let authenticated = RwSignal::new(api.session().is_authenticated());
        let user = RwSignal::new(api.session().get_user());
        api.on_session_expired(move || {
            user.set(None);
            authenticated.set(false);
        });

        Self {
            api: StoredValue::new_local(api),
            config: StoredValue::new(config),
            authenticated,
            user,
        }
    }

    pub fn api(&self) -> Rc<BrowserApi> {
        self.api.get_value()
    }

    pub fn config(&self) -> ClientConfig {
        self.config.get_value()
    }

    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        self.authenticated.into()
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<()> {
        let resp = self.api().login(username, password).await?;
        self.enter(resp.user);
        Ok(())
    }

    pub async fn signup(&self, req: &SignupRequest) -> ClientResult<()> {
        let resp = self.api().signup(req).await?;
        self.enter(resp.user);
        Ok(())
    }

    /// Builds the dashboard controller. Its redirect hook drops the session
    /// signals so the router leaves the dashboard.
    pub fn dashboard(&self) -> Rc<BrowserController> {
        let controller = DashboardController::new(self.api(), IntervalTicker, &self.config());
        let ctx = *self;
        controller.on_redirect(move || ctx.leave());
        controller
    }

    fn enter(&self, user: User) {
        self.user.set(Some(user));
        self.authenticated.set(true);
    }

    fn leave(&self) {
        self.user.set(None);
        self.authenticated.set(false);
    }
}

pub fn use_auth() -> AuthContext {
    expect_context::<AuthContext>()
}
