//! Reconnection policy: exponential backoff with jitter and a hard cap on
//! attempts.
//!
//! ```text
//!  Idle ──close──► Scheduled ──timer──► Idle (open attempt in flight)
//!   ▲                                    │
//!   └──────────── open succeeded ────────┘  (attempts reset)
//!
//!  Idle ──close, attempts == max──► GaveUp ──reset──► Idle
//! ```
//!
//! The delay used for attempt `n` is `min(base * 2^(n-1), cap)` plus a
//! random jitter in `0..=max_jitter`.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, info};

use crate::config::ReconnectConfig;
use crate::timer::{Scheduler, TimerId, TimerKind};

// ── Jitter ───────────────────────────────────────────────────────

/// Source of the random delay added to each attempt.
pub trait Jitter: fmt::Debug + Send {
    fn sample(&mut self, max: Duration) -> Duration;
}

/// Uniform jitter from the thread-local RNG.
#[derive(Debug, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&mut self, max: Duration) -> Duration {
        let max_ms = max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

/// Constant jitter, clamped to the allowed maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub Duration);

impl Jitter for FixedJitter {
    fn sample(&mut self, max: Duration) -> Duration {
        self.0.min(max)
    }
}

// ── Policy ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPhase {
    Idle,
    Scheduled {
        attempt: u32,
        delay: Duration,
        timer: TimerId,
    },
    /// Terminal until [`ReconnectPolicy::reset`].
    GaveUp,
}

/// What the policy decided after a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectOutcome {
    Scheduled { attempt: u32, delay: Duration },
    GaveUp,
}

#[derive(Debug)]
pub struct ReconnectPolicy {
    base: Duration,
    cap: Duration,
    max_attempts: u32,
    max_jitter: Duration,
    attempts: u32,
    current: Duration,
    phase: ReconnectPhase,
    jitter: Box<dyn Jitter>,
}

impl ReconnectPolicy {
    pub fn new(
        base: Duration,
        cap: Duration,
        max_attempts: u32,
        max_jitter: Duration,
        jitter: Box<dyn Jitter>,
    ) -> Self {
        Self {
            base,
            cap,
            max_attempts,
            max_jitter,
            attempts: 0,
            current: base,
            phase: ReconnectPhase::Idle,
            jitter,
        }
    }

    pub fn from_config(cfg: &ReconnectConfig) -> Self {
        Self::new(
            Duration::from_millis(cfg.base_delay_ms),
            Duration::from_millis(cfg.cap_ms),
            cfg.max_attempts,
            Duration::from_millis(cfg.max_jitter_ms),
            Box::new(RandomJitter),
        )
    }

    pub fn set_jitter(&mut self, jitter: Box<dyn Jitter>) {
        self.jitter = jitter;
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts
    }

    /// Backoff for the next attempt, before jitter.
    pub fn next_delay(&self) -> Duration {
        self.current
    }

    pub fn phase(&self) -> ReconnectPhase {
        self.phase
    }

    pub fn has_given_up(&self) -> bool {
        self.phase == ReconnectPhase::GaveUp
    }

    /// The channel opened: forget all failures.
    pub fn on_open(&mut self) {
        if self.attempts > 0 {
            info!(attempts = self.attempts, "reconnected");
        }
        self.attempts = 0;
        self.current = self.base;
        self.phase = ReconnectPhase::Idle;
    }

    /// The channel closed or failed to open.
    pub fn on_close<S: Scheduler>(&mut self, scheduler: &mut S) -> ReconnectOutcome {
        match self.phase {
            ReconnectPhase::GaveUp => return ReconnectOutcome::GaveUp,
            ReconnectPhase::Scheduled { attempt, delay, .. } => {
                debug!(attempt, "close while reconnect pending");
                return ReconnectOutcome::Scheduled { attempt, delay };
            }
            ReconnectPhase::Idle => {}
        }

        if self.attempts >= self.max_attempts {
            error!(attempts = self.attempts, "giving up on reconnection");
            self.phase = ReconnectPhase::GaveUp;
            return ReconnectOutcome::GaveUp;
        }

        self.attempts += 1;
        let delay = self.current.saturating_add(self.jitter.sample(self.max_jitter));
        let timer = scheduler.schedule(TimerKind::Reconnect, delay);
        self.phase = ReconnectPhase::Scheduled {
            attempt: self.attempts,
            delay,
            timer,
        };
        info!(
            attempt = self.attempts,
            max = self.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "reconnect scheduled"
        );
        ReconnectOutcome::Scheduled {
            attempt: self.attempts,
            delay,
        }
    }

    /// A reconnect timer fired. Returns `true` if the caller should open
    /// the channel now.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        match self.phase {
            ReconnectPhase::Scheduled { timer, .. } if timer == id => {
                self.phase = ReconnectPhase::Idle;
                self.current = self.current.saturating_mul(2).min(self.cap);
                true
            }
            _ => {
                debug!(?id, "stale reconnect timer ignored");
                false
            }
        }
    }

    /// Back to a fresh policy, cancelling any pending attempt. This is the
    /// only way out of [`ReconnectPhase::GaveUp`].
    pub fn reset<S: Scheduler>(&mut self, scheduler: &mut S) {
        if let ReconnectPhase::Scheduled { timer, .. } = self.phase {
            scheduler.cancel(timer);
        }
        self.attempts = 0;
        self.current = self.base;
        self.phase = ReconnectPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualScheduler;

    fn policy(jitter_ms: u64) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(1000),
            Duration::from_millis(30_000),
            10,
            Duration::from_millis(500),
            Box::new(FixedJitter(Duration::from_millis(jitter_ms))),
        )
    }

    /// Close, then let the timer fire, as a failed attempt would.
    fn fail_once(p: &mut ReconnectPolicy, s: &mut ManualScheduler) -> ReconnectOutcome {
        let outcome = p.on_close(s);
        if let Some(id) = s.take(TimerKind::Reconnect) {
            assert!(p.on_timer(id));
        }
        outcome
    }

    #[test]
    fn huge_cap_saturates_instead_of_overflowing() {
        let mut s = ManualScheduler::new();
        let mut p = ReconnectPolicy::new(
            Duration::MAX / 2,
            Duration::MAX,
            5,
            Duration::from_millis(500),
            Box::new(FixedJitter(Duration::from_millis(500))),
        );
        for _ in 0..4 {
            assert!(matches!(
                fail_once(&mut p, &mut s),
                ReconnectOutcome::Scheduled { .. }
            ));
        }
        assert_eq!(p.next_delay(), Duration::MAX);
    }

    #[test]
    fn delays_double_until_cap() {
        let mut s = ManualScheduler::new();
        let mut p = policy(0);
        let mut delays = Vec::new();
        for _ in 0..10 {
            match fail_once(&mut p, &mut s) {
                ReconnectOutcome::Scheduled { delay, .. } => delays.push(delay.as_millis() as u64),
                ReconnectOutcome::GaveUp => panic!("gave up early"),
            }
        }
        assert_eq!(
            delays,
            vec![1000, 2000, 4000, 8000, 16000, 30000, 30000, 30000, 30000, 30000]
        );
    }

    #[test]
    fn jitter_is_added_and_bounded() {
        let mut s = ManualScheduler::new();
        let mut p = policy(250);
        assert_eq!(
            p.on_close(&mut s),
            ReconnectOutcome::Scheduled {
                attempt: 1,
                delay: Duration::from_millis(1250)
            }
        );

        let mut p = policy(10_000);
        let mut s = ManualScheduler::new();
        assert_eq!(
            p.on_close(&mut s),
            ReconnectOutcome::Scheduled {
                attempt: 1,
                delay: Duration::from_millis(1500)
            }
        );
    }

    #[test]
    fn random_jitter_stays_in_range() {
        let mut j = RandomJitter;
        for _ in 0..100 {
            assert!(j.sample(Duration::from_millis(500)) <= Duration::from_millis(500));
        }
        assert_eq!(j.sample(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut s = ManualScheduler::new();
        let mut p = policy(0);
        for n in 1..=10 {
            assert!(matches!(
                fail_once(&mut p, &mut s),
                ReconnectOutcome::Scheduled { attempt, .. } if attempt == n
            ));
        }
        assert_eq!(p.on_close(&mut s), ReconnectOutcome::GaveUp);
        assert!(p.has_given_up());
        assert_eq!(s.pending_count(TimerKind::Reconnect), 0);

        // Terminal: further closes schedule nothing.
        assert_eq!(p.on_close(&mut s), ReconnectOutcome::GaveUp);
        assert_eq!(s.pending_count(TimerKind::Reconnect), 0);
    }

    #[test]
    fn open_resets_attempts_and_delay() {
        let mut s = ManualScheduler::new();
        let mut p = policy(0);
        fail_once(&mut p, &mut s);
        fail_once(&mut p, &mut s);
        assert_eq!(p.attempt_count(), 2);
        assert_eq!(p.next_delay(), Duration::from_millis(4000));

        p.on_open();
        assert_eq!(p.attempt_count(), 0);
        assert_eq!(p.next_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn reset_leaves_gave_up_and_cancels_pending() {
        let mut s = ManualScheduler::new();
        let mut p = policy(0);
        for _ in 0..10 {
            fail_once(&mut p, &mut s);
        }
        p.on_close(&mut s);
        assert!(p.has_given_up());

        p.reset(&mut s);
        assert_eq!(p.phase(), ReconnectPhase::Idle);
        p.on_close(&mut s);
        assert_eq!(s.pending_count(TimerKind::Reconnect), 1);
        p.reset(&mut s);
        assert_eq!(s.pending_count(TimerKind::Reconnect), 0);
    }

    #[test]
    fn duplicate_close_does_not_stack_timers() {
        let mut s = ManualScheduler::new();
        let mut p = policy(0);
        p.on_close(&mut s);
        p.on_close(&mut s);
        assert_eq!(s.pending_count(TimerKind::Reconnect), 1);
        assert_eq!(p.attempt_count(), 1);
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut s = ManualScheduler::new();
        let mut p = policy(0);
        p.on_close(&mut s);
        assert!(!p.on_timer(TimerId(999)));
    }
}
