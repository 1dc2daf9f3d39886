//! Browser bindings: the `fetch` transport, `localStorage`, `setInterval`
//! and the History API router.

mod http;
pub mod route;
pub mod router;
mod storage;
mod timer;

pub use http::FetchClient;
pub use storage::BrowserStorage;
pub use timer::IntervalTicker;
