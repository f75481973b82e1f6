//! Response timeout tracking for chat stages.
//!
//! A chat view feeds every "latest message" observation into a
//! [`ResponseTimeoutTracker`]. When a participant message goes unanswered
//! for longer than the configured duration, the tracker flips to timed out
//! and invokes its callback exactly once, so the UI can drop its loading
//! indicator and show a "no response" notice. Message timestamps let the
//! tracker recover the correct remaining time after a page reload.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Clock capability, injected so tests can control time.
pub trait Clock: Send + Sync + 'static {
    /// Current wall-clock time in seconds since the Unix epoch.
    fn now_seconds(&self) -> f64;
}

/// Default clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> f64 {
        chrono::Utc::now().timestamp_millis() as f64 / 1000.0
    }
}

/// Invoked (at most once per wait episode) when the wait expires.
pub type TimeoutCallback = Arc<dyn Fn() + Send + Sync>;

/// Wait-episode state. `Waiting`/`TimedOut` carry the id of the message
/// whose reply is awaited; the id may be absent (a wait can be keyed on
/// "no message yet", which is distinct from being idle).
#[derive(Debug, Clone, PartialEq, Eq)]
enum WaitState {
    Idle,
    Waiting { message_id: Option<String> },
    TimedOut { message_id: Option<String> },
}

impl WaitState {
    fn message_id(&self) -> Option<&Option<String>> {
        match self {
            WaitState::Idle => None,
            WaitState::Waiting { message_id } | WaitState::TimedOut { message_id } => {
                Some(message_id)
            }
        }
    }
}

struct TrackerShared {
    state: WaitState,
    /// Bumped on every new episode; a timer fire for a stale episode is ignored.
    episode: u64,
}

/// Tracks whether an awaited chat reply has exceeded a bounded interval.
///
/// Owns at most one outstanding timer task. All state changes happen in
/// [`update`](Self::update), [`clear`](Self::clear), or the timer firing;
/// the timer is cancelled (aborted) whenever a new episode starts or the
/// wait is cleared, so a cancelled timer never invokes the callback.
pub struct ResponseTimeoutTracker {
    timeout: Duration,
    clock: Arc<dyn Clock>,
    on_timed_out: TimeoutCallback,
    shared: Arc<Mutex<TrackerShared>>,
    timer: Option<JoinHandle<()>>,
}

impl ResponseTimeoutTracker {
    /// Create a tracker with the system clock.
    pub fn new(timeout: Duration, on_timed_out: TimeoutCallback) -> Self {
        Self::with_clock(timeout, on_timed_out, Arc::new(SystemClock))
    }

    /// Create a tracker with an injected clock (used by tests).
    pub fn with_clock(
        timeout: Duration,
        on_timed_out: TimeoutCallback,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            timeout,
            clock,
            on_timed_out,
            shared: Arc::new(Mutex::new(TrackerShared {
                state: WaitState::Idle,
                episode: 0,
            })),
            timer: None,
        }
    }

    /// Whether the active (or most recent) wait episode has expired
    /// without a response.
    pub fn timed_out(&self) -> bool {
        matches!(
            self.shared.lock().unwrap().state,
            WaitState::TimedOut { .. }
        )
    }

    /// Feed the latest message observation.
    ///
    /// `awaiting_reply` is true when the most recent message is from the
    /// side whose reply is being awaited (a participant message that
    /// should be answered). A new awaiting-side message id starts a fresh
    /// wait episode; re-observing the tracked id is a no-op; anything
    /// else clears the tracker. `sent_at_seconds` is the message's
    /// wall-clock send time, used to compute the remaining wait after a
    /// reload.
    pub fn update(
        &mut self,
        latest_message_id: Option<&str>,
        awaiting_reply: bool,
        sent_at_seconds: Option<f64>,
    ) {
        if !awaiting_reply {
            self.clear();
            return;
        }

        {
            let shared = self.shared.lock().unwrap();
            if let Some(tracked) = shared.state.message_id() {
                if tracked.as_deref() == latest_message_id {
                    // Same pending message re-observed (e.g. a re-render):
                    // the original deadline stands.
                    return;
                }
            }
        }

        self.start_episode(latest_message_id, sent_at_seconds);
    }

    /// Cancel any pending timer and return to idle. Never invokes the
    /// callback. Safe to call when no wait is active.
    pub fn clear(&mut self) {
        self.cancel_timer();
        let mut shared = self.shared.lock().unwrap();
        shared.episode += 1;
        shared.state = WaitState::Idle;
    }

    fn start_episode(&mut self, message_id: Option<&str>, sent_at_seconds: Option<f64>) {
        self.cancel_timer();

        let remaining = self.remaining_wait(sent_at_seconds);
        let episode = {
            let mut shared = self.shared.lock().unwrap();
            shared.episode += 1;
            shared.state = WaitState::Waiting {
                message_id: message_id.map(String::from),
            };
            shared.episode
        };

        debug!(
            message_id = message_id.unwrap_or("<none>"),
            remaining_seconds = remaining.as_secs_f64(),
            "starting response wait"
        );

        if remaining.is_zero() {
            // Deadline already passed (e.g. page reload after the fact):
            // flip state synchronously, defer the notification one tick so
            // listeners attached right after this call still observe it.
            self.mark_timed_out();
            let callback = self.on_timed_out.clone();
            self.timer = Some(tokio::spawn(async move {
                callback();
            }));
            return;
        }

        let shared = self.shared.clone();
        let callback = self.on_timed_out.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let fired = {
                let mut guard = shared.lock().unwrap();
                if guard.episode != episode {
                    false
                } else {
                    let message_id = match &guard.state {
                        WaitState::Waiting { message_id } => message_id.clone(),
                        _ => return,
                    };
                    guard.state = WaitState::TimedOut { message_id };
                    true
                }
            };
            if fired {
                callback();
            }
        }));
    }

    /// Remaining wait for an episode, given the triggering message's send
    /// time. Without a timestamp the full duration applies.
    fn remaining_wait(&self, sent_at_seconds: Option<f64>) -> Duration {
        match sent_at_seconds {
            Some(sent_at) => {
                let elapsed = self.clock.now_seconds() - sent_at;
                let remaining = self.timeout.as_secs_f64() - elapsed;
                if remaining <= 0.0 {
                    Duration::ZERO
                } else {
                    Duration::from_secs_f64(remaining)
                }
            }
            None => self.timeout,
        }
    }

    fn mark_timed_out(&self) {
        let mut shared = self.shared.lock().unwrap();
        let message_id = match &shared.state {
            WaitState::Waiting { message_id } => message_id.clone(),
            _ => return,
        };
        shared.state = WaitState::TimedOut { message_id };
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for ResponseTimeoutTracker {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
