// ============================================
// TIMING UTILITY - Stage Measurement
// ============================================
// Usage:
//   let timer = Timer::start("fetch products");
//   ...
//   let elapsed = timer.stop();
// ============================================

use std::time::{Duration, Instant};

use tracing::info;

/// Timer for one pipeline stage. Logs its elapsed time when stopped or dropped.
pub struct Timer {
    name: String,
    start: Instant,
    logged: bool,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            logged: false,
        }
    }

    /// Stop the timer and log the result
    pub fn stop(mut self) -> Duration {
        let duration = self.start.elapsed();
        self.log_duration(duration);
        duration
    }

    fn log_duration(&mut self, duration: Duration) {
        if self.logged {
            return;
        }
        self.logged = true;
        info!(
            stage = %self.name,
            elapsed_ms = duration.as_millis() as u64,
            "{} {}",
            Self::label(duration.as_millis()),
            format_duration(duration)
        );
    }

    fn label(ms: u128) -> &'static str {
        match ms {
            0..=100 => "fast",
            101..=1000 => "ok",
            1001..=5000 => "slow",
            _ => "very slow",
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.log_duration(duration);
    }
}

/// `850ms` below one second, `2.35s` above.
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(2350)), "2.35s");
    }

    #[test]
    fn test_stop_returns_elapsed() {
        let timer = Timer::start("noop");
        let elapsed = timer.stop();
        assert!(elapsed < Duration::from_secs(5));
    }
}
