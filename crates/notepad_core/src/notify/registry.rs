//! Subscriber registry and fan-out.

use crate::routing::uri::NoteUri;
use log::debug;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Receives changed addresses. Implementations re-query on their own.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, uri: &NoteUri);
}

impl<F> ChangeObserver for F
where
    F: Fn(&NoteUri) + Send + Sync,
{
    fn on_change(&self, uri: &NoteUri) {
        self(uri)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(Uuid);

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Subscription {
    uri: NoteUri,
    notify_for_descendants: bool,
    observer: Arc<dyn ChangeObserver>,
}

impl Subscription {
    fn wants(&self, changed: &NoteUri) -> bool {
        self.uri == *changed
            || (self.notify_for_descendants && self.uri.is_ancestor_of(changed))
            || changed.is_ancestor_of(&self.uri)
    }
}

struct ChannelObserver {
    sender: Sender<NoteUri>,
}

impl ChangeObserver for ChannelObserver {
    fn on_change(&self, uri: &NoteUri) {
        if self.sender.send(uri.clone()).is_err() {
            debug!("event=change_deliver module=notify status=skipped reason=receiver_closed");
        }
    }
}

/// Registry of change subscriptions.
///
/// A subscription on `uri` is told about changes to `uri` itself and to any
/// ancestor of it (a bulk change covers its items). With
/// `notify_for_descendants` it also hears about changes below `uri`, which is
/// how a collection watcher sees single-item writes.
#[derive(Default)]
pub struct ObserverRegistry {
    subscriptions: RwLock<BTreeMap<SubscriptionId, Subscription>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` for `uri`.
    pub fn subscribe(
        &self,
        uri: NoteUri,
        notify_for_descendants: bool,
        observer: Arc<dyn ChangeObserver>,
    ) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        debug!(
            "event=subscribe module=notify subscription={} uri={} descendants={}",
            id, uri, notify_for_descendants
        );
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Subscription {
                    uri,
                    notify_for_descendants,
                    observer,
                },
            );
        id
    }

    /// Registers a subscription whose notifications arrive on a channel.
    pub fn subscribe_channel(
        &self,
        uri: NoteUri,
        notify_for_descendants: bool,
    ) -> (SubscriptionId, Receiver<NoteUri>) {
        let (sender, receiver) = mpsc::channel();
        let id = self.subscribe(
            uri,
            notify_for_descendants,
            Arc::new(ChannelObserver { sender }),
        );
        (id, receiver)
    }

    /// Removes a subscription. Returns `false` when it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        debug!("event=unsubscribe module=notify subscription={id} removed={removed}");
        removed
    }

    pub fn len(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `uri` to every interested subscriber; returns how many.
    pub fn notify(&self, uri: &NoteUri) -> usize {
        let targets: Vec<Arc<dyn ChangeObserver>> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|subscription| subscription.wants(uri))
            .map(|subscription| Arc::clone(&subscription.observer))
            .collect();

        for observer in &targets {
            observer.on_change(uri);
        }
        debug!(
            "event=change_notify module=notify uri={} delivered={}",
            uri,
            targets.len()
        );
        targets.len()
    }
}
