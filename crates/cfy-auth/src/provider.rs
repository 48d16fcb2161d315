//! Credential provider boundary and identity-change subscriptions.
//!
//! A subscription is an [`IdentityStream`]. Dropping it unregisters it: the
//! broadcaster prunes senders whose receiver is gone on the next publish.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cfy_core::Identity;
use tokio::sync::mpsc;

use crate::error::AuthError;

/// One identity-change notification. `identity: None` means signed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityChange {
    pub identity: Option<Identity>,
}

/// Ordered stream of identity changes for one subscriber.
#[derive(Debug)]
pub struct IdentityStream {
    rx: mpsc::UnboundedReceiver<IdentityChange>,
}

impl IdentityStream {
    /// Next change in arrival order. `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<IdentityChange> {
        self.rx.recv().await
    }
}

/// Third-party identity backend.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Subscribe to identity changes.
    ///
    /// The current identity (or `None`) is delivered immediately, so every
    /// subscriber sees at least one event.
    fn on_identity_change(&self) -> IdentityStream;

    /// Snapshot of the signed-in identity.
    fn current_identity(&self) -> Option<Identity>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError>;

    async fn sign_in_with_google(&self) -> Result<(), AuthError>;

    async fn sign_in_with_github(&self) -> Result<(), AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

#[derive(Debug, Default)]
struct BroadcastState {
    current: Option<Identity>,
    subscribers: Vec<mpsc::UnboundedSender<IdentityChange>>,
}

/// Fan-out of identity changes to every live subscription.
#[derive(Debug, Default)]
pub struct IdentityBroadcaster {
    state: Mutex<BroadcastState>,
}

impl IdentityBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BroadcastState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a subscriber and replay the current identity to it.
    pub fn subscribe(&self) -> IdentityStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let _ = tx.send(IdentityChange {
            identity: state.current.clone(),
        });
        state.subscribers.push(tx);
        IdentityStream { rx }
    }

    /// Set the current identity and notify every subscriber.
    ///
    /// Fires even when the identity is unchanged (token refresh).
    pub fn publish(&self, identity: Option<Identity>) {
        let mut state = self.lock();
        state.current.clone_from(&identity);
        state.subscribers.retain(|tx| {
            tx.send(IdentityChange {
                identity: identity.clone(),
            })
            .is_ok()
        });
        tracing::debug!(
            uid = identity.as_ref().map(|i| i.uid.as_str()),
            subscribers = state.subscribers.len(),
            "identity change published"
        );
    }

    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.lock().current.clone()
    }

    /// Live subscriber count as of the last publish or subscribe.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfy_core::ProviderKind;

    #[tokio::test]
    async fn subscribe_replays_current_identity() {
        let broadcaster = IdentityBroadcaster::new();
        broadcaster.publish(Some(Identity::new("u1", ProviderKind::Password)));

        let mut stream = broadcaster.subscribe();
        let first = stream.next().await.expect("replayed event");
        assert_eq!(first.identity.map(|i| i.uid), Some("u1".to_string()));
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let broadcaster = IdentityBroadcaster::new();
        let mut stream = broadcaster.subscribe();
        broadcaster.publish(Some(Identity::new("a", ProviderKind::Google)));
        broadcaster.publish(None);

        assert_eq!(stream.next().await.map(|c| c.identity), Some(None));
        assert_eq!(
            stream.next().await.and_then(|c| c.identity).map(|i| i.uid),
            Some("a".to_string())
        );
        assert_eq!(stream.next().await.map(|c| c.identity), Some(None));
    }

    #[test]
    fn dropped_stream_is_pruned_on_publish() {
        let broadcaster = IdentityBroadcaster::new();
        let keep = broadcaster.subscribe();
        let dropped = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        drop(dropped);
        broadcaster.publish(None);
        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(keep);
    }
}
