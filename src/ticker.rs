//! Periodic tick scheduling
//!
//! The controller asks a [`Ticker`] for a handle that runs a callback once per
//! period. Dropping the handle stops the schedule.

use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;

pub type TickFuture = LocalBoxFuture<'static, ()>;
pub type TickFn = Rc<dyn Fn() -> TickFuture>;

pub trait Ticker {
    /// Cancels the schedule when dropped.
    type Handle;

    fn every(&self, period: Duration, on_tick: TickFn) -> Self::Handle;
}

impl<T: Ticker + ?Sized> Ticker for Rc<T> {
    type Handle = T::Handle;

    fn every(&self, period: Duration, on_tick: TickFn) -> Self::Handle {
        (**self).every(period, on_tick)
    }
}

// =========================================================
// 测试工具: ManualTicker
// =========================================================

#[cfg(test)]
pub use manual::{ManualTickHandle, ManualTicker};

#[cfg(test)]
mod manual {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Weak;

    /// Fires only when the test says so.
    pub struct ManualTicker {
        slot: RefCell<Option<Weak<dyn Fn() -> TickFuture>>>,
        pub started: Cell<usize>,
        pub last_period: Cell<Option<Duration>>,
    }

    /// Owns the callback; the ticker only keeps a weak reference.
    pub struct ManualTickHandle {
        _on_tick: TickFn,
    }

    impl ManualTicker {
        pub fn new() -> Self {
            Self {
                slot: RefCell::new(None),
                started: Cell::new(0),
                last_period: Cell::new(None),
            }
        }

        pub fn is_running(&self) -> bool {
            self.slot
                .borrow()
                .as_ref()
                .is_some_and(|weak| weak.strong_count() > 0)
        }

        /// Runs one tick. Returns `false` when the handle has been dropped.
        pub async fn fire(&self) -> bool {
            let callback = self.slot.borrow().as_ref().and_then(Weak::upgrade);
            match callback {
                Some(callback) => {
                    callback().await;
                    true
                }
                None => false,
            }
        }
    }

    impl Ticker for ManualTicker {
        type Handle = ManualTickHandle;

        fn every(&self, period: Duration, on_tick: TickFn) -> Self::Handle {
            *self.slot.borrow_mut() = Some(Rc::downgrade(&on_tick));
            self.started.set(self.started.get() + 1);
            self.last_period.set(Some(period));
            ManualTickHandle { _on_tick: on_tick }
        }
    }
}
