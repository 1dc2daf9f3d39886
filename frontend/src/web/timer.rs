//! `setInterval` wrapper and the dashboard ticker built on it.

use std::time::Duration;

use glycowatch::{TickFn, Ticker};
use tracing::error;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// Periodic timer. Dropping it clears the interval.
pub struct Interval {
    handle: i32,
    _closure: Closure<dyn Fn()>,
}

impl Interval {
    /// Returns `None` when there is no window or the browser refuses the timer.
    pub fn new<F>(millis: u32, callback: F) -> Option<Self>
    where
        F: Fn() + 'static,
    {
        let closure = Closure::<dyn Fn()>::new(callback);
        let window = web_sys::window()?;
        let timeout = i32::try_from(millis).unwrap_or(i32::MAX);

        let handle = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                timeout,
            )
            .ok()?;

        Some(Self {
            handle,
            _closure: closure,
        })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.handle);
        }
    }
}

/// Runs each tick as a local task.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalTicker;

impl Ticker for IntervalTicker {
    type Handle = Option<Interval>;

    fn every(&self, period: Duration, on_tick: TickFn) -> Self::Handle {
        let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
        let interval = Interval::new(millis, move || spawn_local(on_tick()));
        if interval.is_none() {
            error!("could not start the refresh timer");
        }
        interval
    }
}
