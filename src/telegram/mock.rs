//! In-memory transport used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use super::{ChatId, InboundMessage, Transport, TransportError};

/// Outcome of one scripted `poll` call.
pub enum Poll {
    Batch(Vec<InboundMessage>),
    Fail,
    /// Never completes, like a long-poll that gets no updates.
    Hang,
}

/// Scripted transport that records every reply.
#[derive(Default)]
pub struct MockTransport {
    polls: Mutex<VecDeque<Poll>>,
    replies: Mutex<Vec<(ChatId, String)>>,
    poll_count: Mutex<usize>,
    stop_when_drained: Mutex<Option<watch::Sender<bool>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&self, batch: Vec<InboundMessage>) {
        self.polls.lock().unwrap().push_back(Poll::Batch(batch));
    }

    pub fn push_failure(&self) {
        self.polls.lock().unwrap().push_back(Poll::Fail);
    }

    pub fn push_hang(&self) {
        self.polls.lock().unwrap().push_back(Poll::Hang);
    }

    /// Raises the stop signal once every scripted poll has been served.
    pub fn stop_when_drained(&self, stop: watch::Sender<bool>) {
        *self.stop_when_drained.lock().unwrap() = Some(stop);
    }

    pub fn replies(&self) -> Vec<(ChatId, String)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn reply_texts(&self) -> Vec<String> {
        self.replies().into_iter().map(|(_, text)| text).collect()
    }

    pub fn poll_count(&self) -> usize {
        *self.poll_count.lock().unwrap()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn poll(&self, _timeout: Duration) -> Result<Vec<InboundMessage>, TransportError> {
        *self.poll_count.lock().unwrap() += 1;

        let next = self.polls.lock().unwrap().pop_front();
        match next {
            Some(Poll::Batch(batch)) => Ok(batch),
            Some(Poll::Fail) => Err(TransportError::Api("scripted failure".to_owned())),
            Some(Poll::Hang) => std::future::pending().await,
            None => {
                if let Some(stop) = self.stop_when_drained.lock().unwrap().take() {
                    let _ = stop.send(true);
                }
                Ok(Vec::new())
            }
        }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        self.replies.lock().unwrap().push((chat_id, text.to_owned()));
        Ok(())
    }
}
