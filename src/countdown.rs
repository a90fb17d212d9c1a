//! Live recomputation of an under-age countdown.
//!
//! [`Countdown::spawn`] starts a background task that re-evaluates a user's
//! eligibility on a fixed interval and publishes each result. Every tick
//! recomputes from the absolute eighteenth-birthday instant, so the countdown
//! cannot drift. The task ends by itself once the user is no longer under
//! age, and is aborted as soon as its [`CountdownHandle`] is dropped.

use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::domain::{
    eligibility::{parse_date_of_birth, EligibilityClassifier, EligibilityError},
    EligibilityState, SignupReason, UserProfile,
};

/// A source of the current local date and time.
pub trait Clock: Send + Sync + 'static {
    /// The current wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

/// The system's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl<F> Clock for F
where
    F: Fn() -> NaiveDateTime + Send + Sync + 'static,
{
    fn now(&self) -> NaiveDateTime {
        self()
    }
}

/// Schedules periodic eligibility recomputation.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    classifier: EligibilityClassifier,
    interval: Duration,
}

impl Countdown {
    /// The default time between recomputations.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

    /// Recompute with `classifier` every `interval`.
    #[must_use]
    pub const fn new(classifier: EligibilityClassifier, interval: Duration) -> Self {
        Self {
            classifier,
            interval,
        }
    }

    /// Evaluate `profile` now and keep re-evaluating it in the background.
    ///
    /// The first state is computed before this returns. If the profile is not
    /// under age no background task is needed, and the returned handle is
    /// already finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile's date of birth is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn spawn<C: Clock>(
        &self,
        profile: &UserProfile,
        clock: C,
    ) -> Result<CountdownHandle, EligibilityError> {
        let dob = profile
            .date_of_birth
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_date_of_birth)
            .transpose()?;
        let reason = profile.signup_reason;

        let initial = self.classifier.evaluate(dob, reason, clock.now())?;
        let (sender, receiver) = watch::channel(initial);

        let task = match (dob, initial) {
            (Some(dob), EligibilityState::UnderAge { .. }) => {
                let ticker = Ticker {
                    classifier: self.classifier,
                    interval: self.interval,
                    dob,
                    reason,
                };
                tokio::spawn(ticker.run(clock, sender))
            }
            _ => tokio::spawn(async {}),
        };

        Ok(CountdownHandle { receiver, task })
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(EligibilityClassifier::default(), Self::DEFAULT_INTERVAL)
    }
}

struct Ticker {
    classifier: EligibilityClassifier,
    interval: Duration,
    dob: NaiveDate,
    reason: SignupReason,
}

impl Ticker {
    async fn run<C: Clock>(self, clock: C, sender: watch::Sender<EligibilityState>) {
        let mut ticks = time::interval_at(Instant::now() + self.interval, self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticks.tick().await;

            let state = match self
                .classifier
                .evaluate(Some(self.dob), self.reason, clock.now())
            {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!("Stopping countdown: {e}");
                    return;
                }
            };
            tracing::trace!(%state, "countdown tick");

            if sender.send(state).is_err() {
                return;
            }
            if !matches!(state, EligibilityState::UnderAge { .. }) {
                tracing::debug!(%state, "countdown finished");
                return;
            }
        }
    }
}

/// Receives recomputed states from a running countdown.
///
/// Dropping the handle stops the countdown.
#[derive(Debug)]
pub struct CountdownHandle {
    receiver: watch::Receiver<EligibilityState>,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    /// The most recently computed state.
    #[must_use]
    pub fn current(&self) -> EligibilityState {
        *self.receiver.borrow()
    }

    /// Wait for the next recomputed state.
    ///
    /// Returns `None` once the countdown has finished and every state has
    /// been seen.
    pub async fn changed(&mut self) -> Option<EligibilityState> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }

    /// Another receiver for the same stream of states.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EligibilityState> {
        self.receiver.clone()
    }

    /// Returns `true` once the background task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the countdown.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
