//! Bounded hand-off channel between collectors and the aggregator
//!
//! Multi-producer, single-consumer. Producers only ever `try_send`: a full
//! or closed channel drops the summary with a warning and reports failure,
//! it never blocks the calling thread. The consumer blocks on `recv` with no
//! timeout.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::hotspot::clock::WindowId;
use crate::hotspot::collector::CollectorId;
use crate::hotspot::traits::{Element, Entry, SensorError, SensorResult};
use crate::telemetry::sensor_stats::SensorStatistics;

/// Summary of one collector window
#[derive(Debug, Clone)]
pub struct WindowSummary<E> {
    pub collector_id: CollectorId,
    pub window_id: WindowId,
    /// Tier-2 entries; counts are one below the local occurrence count
    pub entries: Vec<Entry<E>>,
    /// Every access seen by the collector during the window
    pub total_count: u64,
}

/// Message carried by the channel
#[derive(Debug)]
pub(crate) enum ChannelMessage<E> {
    Summary(WindowSummary<E>),
    Shutdown,
}

/// Producer half, cloned into every collector
#[derive(Debug)]
pub struct HandOffSender<E> {
    sender: Sender<ChannelMessage<E>>,
    stats: Arc<SensorStatistics>,
}

impl<E> Clone for HandOffSender<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// Consumer half, owned by the aggregator thread
#[derive(Debug)]
pub(crate) struct HandOffReceiver<E> {
    receiver: Receiver<ChannelMessage<E>>,
}

/// Create a bounded channel of `capacity` messages
pub(crate) fn hand_off_channel<E: Element>(
    capacity: usize,
    stats: Arc<SensorStatistics>,
) -> SensorResult<(HandOffSender<E>, HandOffReceiver<E>)> {
    if capacity == 0 {
        return Err(SensorError::invalid_configuration(
            "channel_size must be positive",
        ));
    }
    let (sender, receiver) = bounded(capacity);
    Ok((HandOffSender { sender, stats }, HandOffReceiver { receiver }))
}

impl<E: Element> HandOffSender<E> {
    /// Submit a window summary without blocking
    ///
    /// Returns false if the summary was dropped.
    pub fn submit(&self, summary: WindowSummary<E>) -> bool {
        match self.sender.try_send(ChannelMessage::Summary(summary)) {
            Ok(()) => {
                self.stats.record_submitted();
                true
            }
            Err(TrySendError::Full(ChannelMessage::Summary(summary))) => {
                self.stats.record_dropped();
                log::warn!(
                    "hot detect, server channel overflow, discard collector {}, window {}",
                    summary.collector_id,
                    summary.window_id
                );
                false
            }
            Err(TrySendError::Disconnected(ChannelMessage::Summary(summary))) => {
                self.stats.record_dropped();
                log::warn!(
                    "hot detect, server channel closed, discard collector {}, window {}",
                    summary.collector_id,
                    summary.window_id
                );
                false
            }
            Err(_) => {
                self.stats.record_dropped();
                false
            }
        }
    }

    /// Queue the shutdown marker, waiting for room if necessary
    ///
    /// Never called from the producer path.
    pub(crate) fn send_shutdown(&self) -> SensorResult<()> {
        self.sender
            .send(ChannelMessage::Shutdown)
            .map_err(|_| SensorError::ChannelClosed)
    }

    /// Messages currently queued
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }
}

impl<E> HandOffReceiver<E> {
    /// Block until the next message; `None` once every sender is gone
    pub(crate) fn recv(&self) -> Option<ChannelMessage<E>> {
        self.receiver.recv().ok()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
