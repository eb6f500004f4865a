//! Update poller runner.
//!
//! The poller follows a simple state machine:
//! 1. Idle until `run` is called
//! 2. Polling: long-poll the transport, interruptible by the stop signal
//! 3. Dispatching: hand every message of the batch to the dispatcher in
//!    arrival order, one at a time, never interrupted
//! 4. Back to Polling, or Stopped once the stop signal has been raised
//!
//! Transport failures sleep with exponential backoff and retry.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{Backoff, PollerState, PollerStats};
use crate::commands::Dispatcher;
use crate::telegram::Transport;

/// Long-polling loop feeding the dispatcher.
pub struct UpdatePoller {
    transport: Arc<dyn Transport>,
    dispatcher: Arc<Dispatcher>,
    poll_timeout: Duration,
    backoff: Backoff,
    state: PollerState,
}

impl UpdatePoller {
    /// Creates a new poller.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        dispatcher: Arc<Dispatcher>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            dispatcher,
            poll_timeout,
            backoff: Backoff::default(),
            state: PollerState::Idle,
        }
    }

    /// Sets the retry backoff used after transport failures.
    #[cfg(test)]
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub const fn state(&self) -> PollerState {
        self.state
    }

    fn transition(&mut self, next: PollerState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "poller state change");
            self.state = next;
        }
    }

    /// Runs until `stop` becomes `true` (or its sender is dropped).
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> PollerStats {
        let mut stats = PollerStats::default();
        info!(
            timeout_secs = self.poll_timeout.as_secs(),
            "Update poller started"
        );

        loop {
            if *stop.borrow_and_update() {
                break;
            }
            self.transition(PollerState::Polling);

            let result = tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                    continue;
                }
                result = self.transport.poll(self.poll_timeout) => result,
            };

            match result {
                Ok(batch) => {
                    self.backoff.reset();
                    stats.batches += 1;
                    if batch.is_empty() {
                        continue;
                    }

                    self.transition(PollerState::Dispatching);
                    debug!(messages = batch.len(), "dispatching batch");
                    for message in &batch {
                        let outcome = self
                            .dispatcher
                            .dispatch(self.transport.as_ref(), message)
                            .await;
                        debug!(?outcome, "message handled");
                        stats.messages += 1;
                    }
                }
                Err(e) => {
                    stats.transport_failures += 1;
                    let delay = self.backoff.next_delay();
                    warn!(
                        error = %e,
                        backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "poll failed, backing off"
                    );

                    tokio::select! {
                        biased;
                        changed = stop.changed() => {
                            if changed.is_err() || *stop.borrow() {
                                break;
                            }
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.transition(PollerState::Stopped);
        info!(
            batches = stats.batches,
            messages = stats.messages,
            failures = stats.transport_failures,
            "Update poller stopped"
        );
        stats
    }
}

impl std::fmt::Debug for UpdatePoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdatePoller")
            .field("poll_timeout", &self.poll_timeout)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{Recorder, message};
    use crate::commands::{CommandDescriptor, CommandRegistry};
    use crate::config::BotIdentity;
    use crate::telegram::mock::MockTransport;

    fn setup(recorder: &Recorder) -> (Arc<MockTransport>, UpdatePoller) {
        let registry = CommandRegistry::from_descriptors([CommandDescriptor::new(
            "note",
            "Record a note",
            recorder.clone(),
        )])
        .unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            registry,
            BotIdentity::new("token", ["alice"]),
            '/',
        ));
        let transport = Arc::new(MockTransport::new());
        let poller = UpdatePoller::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            dispatcher,
            Duration::from_secs(1),
        )
        .with_backoff(Backoff::new(Duration::from_millis(1), Duration::from_millis(5)));
        (transport, poller)
    }

    #[tokio::test]
    async fn test_batch_dispatched_in_order() {
        let recorder = Recorder::default();
        let (transport, mut poller) = setup(&recorder);
        let (stop_tx, stop_rx) = watch::channel(false);

        transport.push_batch(vec![
            message("/note m1", "alice"),
            message("/note m2", "bob"),
            message("/note m3", "alice"),
        ]);
        transport.stop_when_drained(stop_tx);

        assert_eq!(poller.state(), PollerState::Idle);
        let stats = poller.run(stop_rx).await;

        assert_eq!(poller.state(), PollerState::Stopped);
        assert_eq!(
            recorder.calls(),
            vec!["/note m1".to_owned(), "/note m2".to_owned(), "/note m3".to_owned()]
        );
        assert_eq!(stats.messages, 3);
    }

    #[tokio::test]
    async fn test_batches_keep_arrival_order() {
        let recorder = Recorder::default();
        let (transport, mut poller) = setup(&recorder);
        let (stop_tx, stop_rx) = watch::channel(false);

        transport.push_batch(vec![message("/note a", "alice"), message("hello", "bob")]);
        transport.push_batch(vec![message("/unknown", "bob"), message("/note b", "bob")]);
        transport.stop_when_drained(stop_tx);

        let stats = poller.run(stop_rx).await;

        assert_eq!(recorder.calls(), vec!["/note a".to_owned(), "/note b".to_owned()]);
        assert_eq!(stats.messages, 4);
        assert!(transport.replies().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_retried() {
        let recorder = Recorder::default();
        let (transport, mut poller) = setup(&recorder);
        let (stop_tx, stop_rx) = watch::channel(false);

        transport.push_failure();
        transport.push_failure();
        transport.push_batch(vec![message("/note after", "alice")]);
        transport.stop_when_drained(stop_tx);

        let stats = poller.run(stop_rx).await;

        assert_eq!(stats.transport_failures, 2);
        assert_eq!(recorder.calls(), vec!["/note after".to_owned()]);
    }

    #[tokio::test]
    async fn test_stop_before_start_never_polls() {
        let recorder = Recorder::default();
        let (transport, mut poller) = setup(&recorder);
        let (stop_tx, stop_rx) = watch::channel(false);
        stop_tx.send(true).unwrap();

        let stats = poller.run(stop_rx).await;

        assert_eq!(transport.poll_count(), 0);
        assert_eq!(stats, PollerStats::default());
        assert_eq!(poller.state(), PollerState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_interrupts_backoff() {
        let recorder = Recorder::default();
        let (transport, poller) = setup(&recorder);
        let mut poller =
            poller.with_backoff(Backoff::new(Duration::from_secs(60), Duration::from_secs(60)));
        let (stop_tx, stop_rx) = watch::channel(false);
        transport.push_failure();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stop_tx.send(true).unwrap();
        });

        let stats = tokio::time::timeout(Duration::from_secs(5), poller.run(stop_rx))
            .await
            .unwrap();
        stopper.await.unwrap();

        assert_eq!(stats.transport_failures, 1);
        assert_eq!(transport.poll_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_interrupts_poll_in_progress() {
        let recorder = Recorder::default();
        let (transport, mut poller) = setup(&recorder);
        let (stop_tx, stop_rx) = watch::channel(false);
        transport.push_hang();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stop_tx.send(true).unwrap();
        });

        let stats = tokio::time::timeout(Duration::from_secs(5), poller.run(stop_rx))
            .await
            .unwrap();
        stopper.await.unwrap();

        assert_eq!(transport.poll_count(), 1);
        assert_eq!(stats, PollerStats::default());
        assert_eq!(poller.state(), PollerState::Stopped);
    }
}
