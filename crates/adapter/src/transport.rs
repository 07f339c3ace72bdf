//! Message transport between nodes.
//!
//! A [`Transport`] delivers opaque payloads to topics. Every message carries a
//! timeout; receivers see what is left of it and messages that run out while
//! queued are dropped. [`LocalBus`] is the in-process implementation used by
//! the binary and the tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::debug;
use thiserror::Error;
use tokio::sync::mpsc;

/// Correlation id of a message, kept across forwards.
pub type TransId = u64;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no subscriber for topic {0}")]
    NoRoute(String),
    #[error("topic {0} is closed")]
    Closed(String),
}

/// A delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub topic: String,
    pub payload: Vec<u8>,
    /// Remaining timeout when the message was taken off the queue.
    pub timeout_ms: u32,
    pub trans_id: TransId,
}

#[derive(Debug)]
struct Envelope {
    topic: String,
    payload: Vec<u8>,
    deadline: Instant,
    trans_id: TransId,
}

impl Envelope {
    /// `None` once the deadline has passed.
    fn open(self, now: Instant) -> Option<Request> {
        let left = self.deadline.checked_duration_since(now)?;
        if left.is_zero() {
            return None;
        }
        Some(Request {
            topic: self.topic,
            payload: self.payload,
            timeout_ms: left.as_millis().min(u32::MAX as u128) as u32,
            trans_id: self.trans_id,
        })
    }
}

/// Sending half of a topic queue.
#[derive(Debug, Clone)]
pub struct Mailbox {
    topic: String,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl Mailbox {
    pub fn deliver(
        &self,
        payload: Vec<u8>,
        timeout_ms: u32,
        trans_id: TransId,
    ) -> Result<(), TransportError> {
        let envelope = Envelope {
            topic: self.topic.clone(),
            payload,
            deadline: Instant::now() + Duration::from_millis(timeout_ms as u64),
            trans_id,
        };
        self.tx
            .send(envelope)
            .map_err(|_| TransportError::Closed(self.topic.clone()))
    }
}

/// Receiving half of a topic queue, shared by all workers of the topic.
#[derive(Debug, Clone)]
pub struct Subscription {
    topic: String,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Envelope>>>,
}

impl Subscription {
    /// A connected mailbox and subscription for `topic`.
    pub fn channel(topic: &str) -> (Mailbox, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Mailbox {
                topic: topic.to_string(),
                tx,
            },
            Subscription {
                topic: topic.to_string(),
                rx: Arc::new(tokio::sync::Mutex::new(rx)),
            },
        )
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next live message, `None` once every sender is gone.
    pub async fn recv(&self) -> Option<Request> {
        let mut rx = self.rx.lock().await;
        loop {
            let envelope = rx.recv().await?;
            match envelope.open(Instant::now()) {
                Some(request) => return Some(request),
                None => debug!("{}: message timed out in queue", self.topic),
            }
        }
    }

    /// Next live message if one is queued right now.
    pub fn try_recv(&self) -> Option<Request> {
        let mut rx = self.rx.try_lock().ok()?;
        while let Ok(envelope) = rx.try_recv() {
            if let Some(request) = envelope.open(Instant::now()) {
                return Some(request);
            }
            debug!("{}: message timed out in queue", self.topic);
        }
        None
    }
}

pub trait Transport: Send + Sync {
    /// Send a new message; returns its correlation id.
    fn send(&self, topic: &str, payload: Vec<u8>, timeout_ms: u32)
        -> Result<TransId, TransportError>;

    /// Pass a received message on, keeping its correlation id.
    fn forward(
        &self,
        topic: &str,
        payload: Vec<u8>,
        timeout_ms: u32,
        trans_id: TransId,
    ) -> Result<(), TransportError>;

    fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError>;
}

/// In-process transport: one unbounded queue per subscribed topic.
#[derive(Debug, Default)]
pub struct LocalBus {
    routes: Mutex<HashMap<String, (Mailbox, Subscription)>>,
    next_id: AtomicU64,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn mailbox(&self, topic: &str) -> Result<Mailbox, TransportError> {
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        routes
            .get(topic)
            .map(|(mailbox, _)| mailbox.clone())
            .ok_or_else(|| TransportError::NoRoute(topic.to_string()))
    }
}

impl Transport for LocalBus {
    fn send(
        &self,
        topic: &str,
        payload: Vec<u8>,
        timeout_ms: u32,
    ) -> Result<TransId, TransportError> {
        let trans_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.mailbox(topic)?.deliver(payload, timeout_ms, trans_id)?;
        Ok(trans_id)
    }

    fn forward(
        &self,
        topic: &str,
        payload: Vec<u8>,
        timeout_ms: u32,
        trans_id: TransId,
    ) -> Result<(), TransportError> {
        self.mailbox(topic)?.deliver(payload, timeout_ms, trans_id)
    }

    fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError> {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let (_, subscription) = routes
            .entry(topic.to_string())
            .or_insert_with(|| Subscription::channel(topic));
        Ok(subscription.clone())
    }
}
