use esp_idf_hal::delay::FreeRtos;
use std::time::{Duration, Instant};

use elpris_core::Clock;

/// Monotonic clock; sleeping yields the FreeRTOS task
pub struct SystemClock {
    boot: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { boot: Instant::now() }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.boot.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        FreeRtos::delay_ms(duration.as_millis().min(u32::MAX as u128) as u32);
    }
}
