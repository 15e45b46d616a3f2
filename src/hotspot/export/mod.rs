//! Latest-snapshot exporter for management surfaces
//!
//! `LatestNotification` keeps the most recent notification behind a shared
//! handle. Readers always see either nothing or one complete snapshot, and
//! before the first rollover every accessor returns a neutral value.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::hotspot::traits::{Notification, NotificationHandler, SensorError, SensorResult};

/// Shared holder of the latest notification
#[derive(Debug)]
pub struct LatestNotification<E: Eq + Hash> {
    latest: Arc<RwLock<Option<Arc<Notification<E>>>>>,
}

impl<E: Eq + Hash> Clone for LatestNotification<E> {
    fn clone(&self) -> Self {
        Self {
            latest: self.latest.clone(),
        }
    }
}

impl<E: Eq + Hash> Default for LatestNotification<E> {
    fn default() -> Self {
        Self {
            latest: Arc::new(RwLock::new(None)),
        }
    }
}

impl<E: Eq + Hash> LatestNotification<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held snapshot
    pub fn publish(&self, notification: Arc<Notification<E>>) {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *latest = Some(notification);
    }

    /// Latest snapshot, if any rollover has happened
    pub fn snapshot(&self) -> Option<Arc<Notification<E>>> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn element_set_changed(&self) -> bool {
        self.snapshot().is_some_and(|n| n.element_set_changed())
    }

    pub fn entry_set_changed(&self) -> bool {
        self.snapshot().is_some_and(|n| n.entry_set_changed())
    }

    pub fn total_count(&self) -> u64 {
        self.snapshot().map_or(0, |n| n.total_count())
    }
}

impl<E: Eq + Hash + Clone> LatestNotification<E> {
    pub fn hot_elements(&self) -> HashSet<E> {
        self.snapshot()
            .map(|n| n.hot_elements().clone())
            .unwrap_or_default()
    }

    /// Hot entries keyed by element
    pub fn hot_entries(&self) -> HashMap<E, u64> {
        self.snapshot()
            .map(|n| {
                n.hot_entries()
                    .iter()
                    .map(|entry| (entry.element().clone(), entry.count()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<E: Eq + Hash + Serialize> LatestNotification<E> {
    /// Render the latest snapshot, or an empty one, as JSON
    pub fn to_json(&self) -> SensorResult<String> {
        let rendered = match self.snapshot() {
            Some(notification) => serde_json::to_string(notification.as_ref()),
            None => serde_json::to_string(&Notification::<E>::empty()),
        };
        rendered.map_err(|e| SensorError::invalid_state(format!("snapshot encoding failed: {}", e)))
    }
}

impl<E: Eq + Hash + Clone + Send + Sync> NotificationHandler<E> for LatestNotification<E> {
    fn handle_notification(&mut self, notification: &Notification<E>) {
        self.publish(Arc::new(notification.clone()));
    }
}
