use std::time::Duration;
use tokio::time::Instant;

/// Time budget and silence tracking for one object's dialogue block
#[derive(Debug, Clone)]
pub struct ObjectBudget {
    started: Instant,
    last_speech: Instant,
    budget: Duration,
    idle_after: Duration,
}

impl ObjectBudget {
    pub fn new(now: Instant, budget: Duration, idle_after: Duration) -> Self {
        Self {
            started: now,
            last_speech: now,
            budget,
            idle_after,
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.budget.saturating_sub(self.elapsed(now))
    }

    /// The block is over once the whole budget has elapsed
    pub fn expired(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.budget
    }

    /// Time since either side last spoke
    pub fn silence(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_speech)
    }

    pub fn idle_due(&self, now: Instant) -> bool {
        self.silence(now) >= self.idle_after
    }

    pub fn mark_speech(&mut self, now: Instant) {
        self.last_speech = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(now: Instant) -> ObjectBudget {
        ObjectBudget::new(now, Duration::from_secs(180), Duration::from_secs(15))
    }

    #[test]
    fn test_expires_exactly_at_budget() {
        let start = Instant::now();
        let budget = budget(start);

        assert!(!budget.expired(start));
        assert!(!budget.expired(start + Duration::from_millis(179_999)));
        assert!(budget.expired(start + Duration::from_secs(180)));
        assert_eq!(budget.remaining(start + Duration::from_secs(200)), Duration::ZERO);
    }

    #[test]
    fn test_idle_only_after_silence_interval() {
        let start = Instant::now();
        let mut budget = budget(start);

        assert!(!budget.idle_due(start + Duration::from_secs(14)));
        assert!(budget.idle_due(start + Duration::from_secs(15)));

        budget.mark_speech(start + Duration::from_secs(15));
        assert!(!budget.idle_due(start + Duration::from_secs(29)));
        assert!(budget.idle_due(start + Duration::from_secs(30)));
    }

    #[test]
    fn test_speech_does_not_extend_budget() {
        let start = Instant::now();
        let mut budget = budget(start);

        budget.mark_speech(start + Duration::from_secs(179));
        assert!(budget.expired(start + Duration::from_secs(180)));
        assert_eq!(budget.silence(start + Duration::from_secs(180)), Duration::from_secs(1));
    }
}
