use std::sync::Arc;

use crate::time::Time;

pub trait TimeGetterFn: Send + Sync {
    fn get_time(&self) -> Time;
}

/// A function wrapper that contains the function that will be used to get
/// the current time throughout a backup run.
#[derive(Clone)]
pub struct TimeGetter {
    f: Arc<dyn TimeGetterFn>,
}

impl TimeGetter {
    #[must_use]
    pub fn new(f: Arc<dyn TimeGetterFn>) -> Self {
        Self { f }
    }

    /// A getter that always returns the same time. For tests that need a
    /// predictable date.
    #[must_use]
    pub fn fixed(time: Time) -> Self {
        struct FixedTimeGetterFn(Time);

        impl TimeGetterFn for FixedTimeGetterFn {
            fn get_time(&self) -> Time {
                self.0
            }
        }

        Self::new(Arc::new(FixedTimeGetterFn(time)))
    }

    #[must_use]
    pub fn get_time(&self) -> Time {
        self.f.get_time()
    }
}

impl Default for TimeGetter {
    fn default() -> Self {
        struct SystemTimeGetterFn;

        impl TimeGetterFn for SystemTimeGetterFn {
            fn get_time(&self) -> Time {
                Time::now()
            }
        }

        Self::new(Arc::new(SystemTimeGetterFn))
    }
}
