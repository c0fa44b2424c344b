use std::time::Duration;

/// Identifies one scheduled phase transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    /// Numeric value of the token.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Transition performed when the phase timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerAction {
    /// Flip the prepared wave to active.
    BeginWave,
    /// Prepare the wave after the one that just completed.
    PrepareNextWave,
}

/// Read-only view of the pending transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTimer {
    /// Token the transition was scheduled under.
    pub token: TimerToken,
    /// Time left until the transition fires.
    pub remaining: Duration,
    /// Transition to perform.
    pub action: TimerAction,
}

/// Single-shot, cancellable deferred transition advanced by ticks.
#[derive(Debug, Default)]
pub(crate) struct PhaseTimer {
    next_token: u64,
    pending: Option<PendingTimer>,
}

impl PhaseTimer {
    /// Schedules `action` after `delay`, replacing any pending transition.
    pub(crate) fn schedule(&mut self, delay: Duration, action: TimerAction) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.pending = Some(PendingTimer {
            token,
            remaining: delay,
            action,
        });
        token
    }

    /// Drops the pending transition, if any.
    pub(crate) fn cancel(&mut self) -> Option<TimerToken> {
        self.pending.take().map(|pending| pending.token)
    }

    /// Advances the timer and yields the action once its delay elapsed.
    pub(crate) fn advance(&mut self, dt: Duration) -> Option<TimerAction> {
        let pending = self.pending.as_mut()?;
        pending.remaining = pending.remaining.saturating_sub(dt);
        if !pending.remaining.is_zero() {
            return None;
        }
        self.pending.take().map(|fired| fired.action)
    }

    pub(crate) fn pending(&self) -> Option<PendingTimer> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_delay() {
        let mut timer = PhaseTimer::default();
        let _ = timer.schedule(Duration::from_secs(2), TimerAction::BeginWave);

        assert_eq!(timer.advance(Duration::from_secs(1)), None);
        assert_eq!(
            timer.advance(Duration::from_secs(1)),
            Some(TimerAction::BeginWave)
        );
        assert_eq!(timer.advance(Duration::from_secs(5)), None);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timer = PhaseTimer::default();
        let token = timer.schedule(Duration::from_secs(1), TimerAction::PrepareNextWave);

        assert_eq!(timer.cancel(), Some(token));
        assert_eq!(timer.advance(Duration::from_secs(10)), None);
        assert_eq!(timer.pending(), None);
    }

    #[test]
    fn rescheduling_issues_a_fresh_token() {
        let mut timer = PhaseTimer::default();
        let first = timer.schedule(Duration::from_secs(1), TimerAction::BeginWave);
        let second = timer.schedule(Duration::from_secs(1), TimerAction::BeginWave);

        assert_ne!(first, second);
        assert_eq!(timer.pending().map(|pending| pending.token), Some(second));
    }
}
