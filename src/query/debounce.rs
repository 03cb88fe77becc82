use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceState<T> {
    Idle,
    Pending { value: T, deadline: Instant },
}

/// Trailing-edge debouncer: a value is released once `delay` has passed
/// without another input. Every input restarts the wait and there is no
/// maximum wait.
///
/// Time is passed in by the caller so the state machine can be driven by a
/// paused tokio clock in tests.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    state: DebounceState<T>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: DebounceState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> &DebounceState<T> {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            DebounceState::Idle => None,
            DebounceState::Pending { deadline, .. } => Some(*deadline),
        }
    }

    /// Record a new value, replacing any pending one.
    pub fn input(&mut self, value: T, now: Instant) {
        self.state = DebounceState::Pending {
            value,
            deadline: now + self.delay,
        };
    }

    /// Release the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.state {
            DebounceState::Pending { deadline, .. } if now >= *deadline => {}
            _ => return None,
        }
        match std::mem::replace(&mut self.state, DebounceState::Idle) {
            DebounceState::Pending { value, .. } => Some(value),
            DebounceState::Idle => None,
        }
    }

    /// Release the pending value immediately.
    pub fn flush(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.state, DebounceState::Idle) {
            DebounceState::Pending { value, .. } => Some(value),
            DebounceState::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = DebounceState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(800);

    #[test]
    fn test_idle_until_input() {
        let mut d: Debouncer<&str> = Debouncer::new(DELAY);
        assert!(!d.is_pending());
        assert_eq!(d.poll(Instant::now()), None);
    }

    #[test]
    fn test_fires_after_quiet_period() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.input("abc", start);
        assert_eq!(d.poll(start + Duration::from_millis(799)), None);
        assert_eq!(d.poll(start + DELAY), Some("abc"));
        assert!(!d.is_pending());
        assert_eq!(d.poll(start + DELAY * 2), None);
    }

    #[test]
    fn test_each_input_resets_deadline() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.input("a", start);
        d.input("ab", start + Duration::from_millis(500));
        d.input("abc", start + Duration::from_millis(1000));

        // the first deadline has passed but the wait restarted
        assert_eq!(d.poll(start + Duration::from_millis(1300)), None);
        assert_eq!(d.deadline(), Some(start + Duration::from_millis(1800)));
        assert_eq!(d.poll(start + Duration::from_millis(1800)), Some("abc"));
    }

    #[test]
    fn test_flush_and_cancel() {
        let start = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.input(1, start);
        assert_eq!(d.flush(), Some(1));
        d.input(2, start);
        d.cancel();
        assert_eq!(d.poll(start + DELAY), None);
        assert_eq!(d.state(), &DebounceState::Idle);
    }
}
