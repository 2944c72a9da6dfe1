//! Signed submission and lifecycle tracking.
//!
//! A submission signs the payload, hands the extrinsic to a
//! [`SubmissionChannel`] and gets back a [`Subscription`]: a stream of
//! [`TxEvent`]s plus a handle that releases the stream. The tracker maps
//! events onto [`SubmissionStatus`] and releases the handle exactly once,
//! on the first terminal event.

use std::future::Future;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;

use crate::encoder::Payload;
use crate::error::ExplorerError;

// ── Collaborators ────────────────────────────────────────────────

/// Identity used to sign outgoing extrinsics, along with the signed
/// extensions the chain expects.
pub trait Signer: Send + Sync {
    /// Encoded address placed in the signed envelope.
    fn address(&self) -> Vec<u8>;
    /// Encoded extension data carried in the envelope (era, nonce, tip).
    fn extra(&self) -> Vec<u8>;
    /// Encoded data that is signed but not sent (spec version, genesis hash).
    fn additional(&self) -> Vec<u8>;
    /// Sign `message`, which is call ++ extra ++ additional. Chains that sign
    /// the blake2-256 hash of messages over 256 bytes expect the signer to do it.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ExplorerError>;
}

/// Releases a live status subscription. Consuming `self` makes a second
/// release impossible.
pub trait SubscriptionHandle: Send {
    fn cancel(self: Box<Self>);
}

pub struct Subscription {
    pub events: BoxStream<'static, TxEvent>,
    pub handle: Box<dyn SubscriptionHandle>,
}

/// Network layer: dispatch a signed extrinsic and watch its lifecycle.
pub trait SubmissionChannel: Send + Sync {
    fn submit_and_watch(
        &self,
        extrinsic: Vec<u8>,
    ) -> impl Future<Output = Result<Subscription, ExplorerError>> + Send;
}

/// Receives every status transition as it happens.
pub trait StatusSink: Send + Sync {
    fn emit_status(&self, status: &SubmissionStatus);
}

// ── Events and status ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    DispatchError(String),
    InBlock(String),
    Finalized(String),
    /// Any other lifecycle event (ready, broadcast, ...). Carries its kind.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "block")]
pub enum SubmissionStatus {
    Error,
    Included(String),
    Finalized(String),
}

impl SubmissionStatus {
    /// Status for `event`, or `None` when the event doesn't change it.
    pub fn from_event(event: &TxEvent) -> Option<Self> {
        match event {
            TxEvent::DispatchError(_) => Some(SubmissionStatus::Error),
            TxEvent::InBlock(hash) => Some(SubmissionStatus::Included(hash.clone())),
            TxEvent::Finalized(hash) => Some(SubmissionStatus::Finalized(hash.clone())),
            TxEvent::Other(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Error | SubmissionStatus::Finalized(_))
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Error => write!(f, "there was an error submitting the transaction"),
            SubmissionStatus::Included(hash) => write!(f, "included at block {hash}"),
            SubmissionStatus::Finalized(hash) => write!(f, "finalized at block {hash}"),
        }
    }
}

/// Holds only the most recent status; no history.
#[derive(Debug, Default)]
pub struct StatusBoard(Mutex<Option<SubmissionStatus>>);

impl StatusBoard {
    pub fn latest(&self) -> Option<SubmissionStatus> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        *self.0.lock() = None;
    }
}

impl StatusSink for StatusBoard {
    fn emit_status(&self, status: &SubmissionStatus) {
        *self.0.lock() = Some(status.clone());
    }
}

// ── Submit + track ───────────────────────────────────────────────

/// Sign `payload` and dispatch it. The signature covers the call and the
/// signer's extensions.
pub async fn dispatch<C: SubmissionChannel + ?Sized>(
    payload: &Payload,
    signer: &dyn Signer,
    channel: &C,
) -> Result<Subscription, ExplorerError> {
    let extra = signer.extra();
    let signature = signer.sign(&payload.signing_payload(&extra, &signer.additional()))?;
    let extrinsic = payload.signed_extrinsic(&signer.address(), &signature, &extra);
    tracing::info!(
        group = payload.group(),
        operation = payload.operation(),
        bytes = extrinsic.len(),
        "dispatching signed extrinsic"
    );
    channel.submit_and_watch(extrinsic).await
}

/// Drive `subscription` until a terminal event or the end of the stream.
///
/// Returns the last status reported. The handle is cancelled on the first
/// terminal event and nothing after it is read. If the stream ends first,
/// the handle is dropped without a cancel.
pub async fn track(subscription: Subscription, sink: &dyn StatusSink) -> Option<SubmissionStatus> {
    let Subscription { mut events, handle } = subscription;
    let mut last = None;

    while let Some(event) = events.next().await {
        let Some(status) = SubmissionStatus::from_event(&event) else {
            tracing::debug!(?event, "ignoring lifecycle event");
            continue;
        };

        match &event {
            TxEvent::DispatchError(reason) => tracing::warn!(%reason, "dispatch rejected"),
            _ => tracing::info!(%status, "submission status"),
        }
        sink.emit_status(&status);

        if status.is_terminal() {
            handle.cancel();
            return Some(status);
        }
        last = Some(status);
    }

    tracing::debug!("subscription ended without a terminal event");
    last
}
