//! Dashboard controller
//!
//! Owns the dashboard state and drives it through
//! `Unauthenticated -> Loading -> Ready`. Every response is tagged with the
//! generation current when its request started; logout bumps the generation,
//! so late responses from the previous session are dropped.
//!
//! All state lives in a `RefCell` that is never borrowed across an await.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;
use glycowatch_shared::{PredictionHistoryRecord, PredictionResult, RiskLevel, SensorReading, User};
use tracing::{debug, info, warn};

use crate::api::GlycoApi;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::request::HttpClient;
use crate::session::KeyValueStore;
use crate::ticker::{TickFn, Ticker};

/// Countdown resolution.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

// =========================================================
// 状态定义 (State)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Unauthenticated,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoRefresh {
    #[default]
    Off,
    On { interval_secs: u32 },
}

impl AutoRefresh {
    pub fn is_on(&self) -> bool {
        matches!(self, AutoRefresh::On { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The prediction came back low risk.
    Success,
    Warning,
}

/// Emitted once per successful prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub risk_level: RiskLevel,
    pub probability: f64,
}

impl Notification {
    pub fn for_result(result: &PredictionResult) -> Self {
        let kind = if result.risk_level == RiskLevel::Low {
            NotificationKind::Success
        } else {
            NotificationKind::Warning
        };
        Self {
            kind,
            risk_level: result.risk_level.clone(),
            probability: result.probability,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub phase: Phase,
    pub user: Option<User>,
    pub sensor: Option<SensorReading>,
    pub prediction: Option<PredictionResult>,
    /// Server order.
    pub history: Vec<PredictionHistoryRecord>,
    pub pregnancies: u32,
    pub auto_refresh: AutoRefresh,
    /// Period used the next time auto-refresh is switched on.
    pub refresh_interval: u32,
    pub auto_predict: bool,
    /// Seconds until the next automatic sensor refresh.
    pub countdown: u32,
    /// A predict call is in flight.
    pub predicting: bool,
    /// Message of the last failed predict.
    pub error: Option<String>,
    pub notification: Option<Notification>,
}

impl DashboardState {
    fn with_interval(refresh_interval: u32) -> Self {
        Self {
            phase: Phase::Unauthenticated,
            user: None,
            sensor: None,
            prediction: None,
            history: Vec::new(),
            pregnancies: 0,
            auto_refresh: AutoRefresh::Off,
            refresh_interval,
            auto_predict: false,
            countdown: refresh_interval,
            predicting: false,
            error: None,
            notification: None,
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::with_interval(crate::config::DEFAULT_REFRESH_SECS)
    }
}

// =========================================================
// 控制器 (Controller)
// =========================================================

type Observer = Rc<dyn Fn(&DashboardState)>;
type Hook = Rc<dyn Fn()>;

pub struct DashboardController<C, S, T: Ticker> {
    api: Rc<GlycoApi<C, S>>,
    ticker: T,
    tick_handle: RefCell<Option<T::Handle>>,
    state: RefCell<DashboardState>,
    generation: Cell<u64>,
    default_refresh_secs: u32,
    observer: RefCell<Option<Observer>>,
    on_redirect: RefCell<Option<Hook>>,
}

impl<C, S, T> DashboardController<C, S, T>
where
    C: HttpClient + 'static,
    S: KeyValueStore + 'static,
    T: Ticker + 'static,
{
    pub fn new(api: Rc<GlycoApi<C, S>>, ticker: T, config: &ClientConfig) -> Rc<Self> {
        let default_refresh_secs = config.default_refresh_secs.max(1);
        Rc::new(Self {
            api,
            ticker,
            tick_handle: RefCell::new(None),
            state: RefCell::new(DashboardState::with_interval(default_refresh_secs)),
            generation: Cell::new(0),
            default_refresh_secs,
            observer: RefCell::new(None),
            on_redirect: RefCell::new(None),
        })
    }

    pub fn api(&self) -> &Rc<GlycoApi<C, S>> {
        &self.api
    }

    /// Called whenever the controller decides the user must log in.
    pub fn on_redirect(&self, hook: impl Fn() + 'static) {
        *self.on_redirect.borrow_mut() = Some(Rc::new(hook));
    }

    /// Called with a fresh snapshot after every state change.
    pub fn subscribe(&self, observer: impl Fn(&DashboardState) + 'static) {
        *self.observer.borrow_mut() = Some(Rc::new(observer));
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    // --- Lifecycle ---

    /// Loads the dashboard for the stored session.
    pub async fn mount(&self) {
        if !self.api.session().is_authenticated() {
            debug!("no session, redirecting to login");
            self.enter_unauthenticated();
            self.redirect();
            return;
        }

        let generation = self.generation.get();
        let user = self.api.session().get_user();
        self.update(|s| {
            s.phase = Phase::Loading;
            s.user = user;
        });

        futures::join!(self.refresh_sensor(), self.refresh_history());

        if self.is_current(generation) {
            self.update(|s| s.phase = Phase::Ready);
        }
    }

    pub fn logout(&self) {
        self.api.logout();
        self.enter_unauthenticated();
        self.redirect();
    }

    // --- Data ---

    /// Fetches the latest reading, then predicts if auto-predict is on.
    pub async fn refresh_sensor(&self) {
        let generation = self.generation.get();
        let result = self.api.latest_sensor_reading().await;
        if !self.is_current(generation) {
            debug!("discarding stale sensor reading");
            return;
        }

        match result {
            Ok(reading) => {
                self.update(|s| s.sensor = Some(reading));
                let auto_predict = self.state.borrow().auto_predict;
                if auto_predict && self.api.session().is_authenticated() {
                    self.predict().await;
                }
            }
            Err(e) => self.background_failure(e, "sensor refresh"),
        }
    }

    pub async fn refresh_history(&self) {
        let generation = self.generation.get();
        let result = self.api.history().await;
        if !self.is_current(generation) {
            debug!("discarding stale history");
            return;
        }

        match result {
            Ok(history) => self.update(|s| s.history = history),
            Err(e) => self.background_failure(e, "history refresh"),
        }
    }

    /// Runs a prediction with the current pregnancies value.
    ///
    /// Does nothing while another predict is in flight or before both a
    /// sensor reading and a user are loaded.
    pub async fn predict(&self) {
        let pregnancies = {
            let s = self.state.borrow();
            let ready = !s.predicting
                && s.phase != Phase::Unauthenticated
                && s.sensor.is_some()
                && s.user.is_some();
            if !ready {
                return;
            }
            s.pregnancies
        };

        let generation = self.generation.get();
        self.update(|s| {
            s.predicting = true;
            s.error = None;
        });

        let result = self.api.predict(pregnancies).await;
        if !self.is_current(generation) {
            debug!("discarding stale prediction");
            return;
        }

        match result {
            Ok(prediction) => {
                let notification = Notification::for_result(&prediction);
                info!(
                    risk = %prediction.risk_level,
                    probability = prediction.probability,
                    "prediction received"
                );
                self.update(|s| {
                    s.prediction = Some(prediction);
                    s.notification = Some(notification);
                    s.predicting = false;
                });
                self.refresh_history().await;
            }
            Err(e) if e.is_session_expired() => self.expire(),
            Err(e) => {
                warn!(error = %e, "prediction failed");
                self.update(|s| {
                    s.error = Some(e.message().to_string());
                    s.predicting = false;
                });
            }
        }
    }

    // --- Inputs ---

    pub fn set_pregnancies(&self, pregnancies: u32) {
        self.update(|s| s.pregnancies = pregnancies);
    }

    pub fn set_auto_predict(&self, enabled: bool) {
        self.update(|s| s.auto_predict = enabled);
    }

    /// Hands out the pending notification, if any.
    pub fn take_notification(&self) -> Option<Notification> {
        let taken = self.state.borrow_mut().notification.take();
        if taken.is_some() {
            self.notify();
        }
        taken
    }

    pub fn clear_error(&self) {
        self.update(|s| s.error = None);
    }

    // --- Auto-refresh ---

    /// Auto-refresh only runs for a signed-in dashboard; turning it on while
    /// unauthenticated is ignored.
    pub fn set_auto_refresh(self: &Rc<Self>, mode: AutoRefresh) {
        match mode {
            AutoRefresh::On { interval_secs } => {
                if self.state.borrow().phase == Phase::Unauthenticated {
                    debug!("auto-refresh ignored without a session");
                    return;
                }
                let interval_secs = interval_secs.max(1);
                self.update(|s| {
                    s.auto_refresh = AutoRefresh::On { interval_secs };
                    s.refresh_interval = interval_secs;
                    s.countdown = interval_secs;
                });
                self.start_ticker();
            }
            AutoRefresh::Off => {
                self.stop_ticker();
                self.update(|s| s.auto_refresh = AutoRefresh::Off);
            }
        }
    }

    pub fn toggle_auto_refresh(self: &Rc<Self>) {
        let (current, interval_secs) = {
            let s = self.state.borrow();
            (s.auto_refresh, s.refresh_interval)
        };
        let next = match current {
            AutoRefresh::Off => AutoRefresh::On { interval_secs },
            AutoRefresh::On { .. } => AutoRefresh::Off,
        };
        self.set_auto_refresh(next);
    }

    /// Changes the period. An active countdown restarts from the new value.
    pub fn set_refresh_interval(&self, secs: u32) {
        let secs = secs.max(1);
        self.update(|s| {
            s.refresh_interval = secs;
            s.countdown = secs;
            if s.auto_refresh.is_on() {
                s.auto_refresh = AutoRefresh::On { interval_secs: secs };
            }
        });
    }

    /// One second of countdown. Refreshes the sensor when it reaches zero.
    pub async fn tick(&self) {
        let due = {
            let mut s = self.state.borrow_mut();
            if s.phase == Phase::Unauthenticated {
                return;
            }
            let AutoRefresh::On { interval_secs } = s.auto_refresh else {
                return;
            };
            s.countdown = s.countdown.saturating_sub(1);
            if s.countdown == 0 {
                s.countdown = interval_secs;
                true
            } else {
                false
            }
        };
        self.notify();

        if due {
            self.refresh_sensor().await;
        }
    }

    fn start_ticker(self: &Rc<Self>) {
        if self.tick_handle.borrow().is_some() {
            return;
        }

        let weak = Rc::downgrade(self);
        let on_tick: TickFn = Rc::new(move || {
            let weak = weak.clone();
            async move {
                if let Some(controller) = weak.upgrade() {
                    controller.tick().await;
                }
            }
            .boxed_local()
        });

        let handle = self.ticker.every(TICK_PERIOD, on_tick);
        *self.tick_handle.borrow_mut() = Some(handle);
        debug!("auto-refresh started");
    }

    fn stop_ticker(&self) {
        let handle = self.tick_handle.borrow_mut().take();
        if handle.is_some() {
            debug!("auto-refresh stopped");
        }
        drop(handle);
    }

    // --- Internals ---

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    /// Drops the ticker and everything loaded for the previous session.
    fn enter_unauthenticated(&self) {
        self.generation.set(self.generation.get() + 1);
        self.stop_ticker();
        *self.state.borrow_mut() = DashboardState::with_interval(self.default_refresh_secs);
        self.notify();
    }

    /// The API client already cleared the session and ran its own hook.
    fn expire(&self) {
        info!("session expired, dashboard reset");
        self.enter_unauthenticated();
    }

    fn background_failure(&self, error: ClientError, what: &str) {
        if error.is_session_expired() {
            self.expire();
        } else {
            warn!(error = %error, "{} failed", what);
        }
    }

    fn redirect(&self) {
        let hook = self.on_redirect.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn update(&self, f: impl FnOnce(&mut DashboardState)) {
        f(&mut self.state.borrow_mut());
        self.notify();
    }

    fn notify(&self) {
        let observer = self.observer.borrow().clone();
        if let Some(observer) = observer {
            let snapshot = self.snapshot();
            observer(&snapshot);
        }
    }
}
