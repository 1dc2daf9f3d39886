//! GlycoWatch client core
//!
//! Everything the dashboard does short of touching the DOM: the session store,
//! the typed API client, the dashboard state machine and the history filter.
//! Browser bindings live in the `glycowatch-frontend` crate and plug in through
//! the [`HttpClient`], [`KeyValueStore`] and [`Ticker`] seams.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod request;
pub mod session;
pub mod ticker;
pub mod validation;

pub use api::GlycoApi;
pub use config::{ClientConfig, EnvSource, ProcessEnv};
pub use controller::{
    AutoRefresh, DashboardController, DashboardState, Notification, NotificationKind, Phase,
};
pub use error::{ClientError, ClientErrorKind, ClientResult};
pub use filter::{HistoryFilter, HistorySummary, ProbabilityBucket};
pub use request::{HttpClient, HttpRequest, HttpResponse};
pub use session::{KeyValueStore, MemoryStore, NullStore, SessionStore};
pub use ticker::{TickFn, TickFuture, Ticker};
pub use validation::SignupForm;

#[cfg(not(target_arch = "wasm32"))]
pub use request::ReqwestHttpClient;

pub use glycowatch_shared as shared;
