//! Consumer thread driving the aggregator
//!
//! Strictly sequential: one blocking `recv`, one `process`, repeat. Every
//! message is processed under `catch_unwind`, so a failure while handling
//! one summary is logged and the loop moves on to the next. The loop exits
//! on the shutdown marker or when every sender is gone.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::hotspot::channel::{ChannelMessage, HandOffReceiver};
use crate::hotspot::traits::{Element, SensorError, SensorResult};
use crate::telemetry::sensor_stats::SensorStatistics;

use super::engine::Aggregator;

pub const CONSUMER_THREAD_NAME: &str = "hotspot-sensor-consumer";

/// Spawn the consumer thread, which takes ownership of the aggregator
pub(crate) fn spawn_consumer<E: Element>(
    aggregator: Aggregator<E>,
    receiver: HandOffReceiver<E>,
    stats: Arc<SensorStatistics>,
) -> SensorResult<JoinHandle<()>> {
    thread::Builder::new()
        .name(CONSUMER_THREAD_NAME.to_string())
        .spawn(move || run(aggregator, receiver, stats))
        .map_err(|e| SensorError::worker_failure(format!("failed to spawn consumer: {}", e)))
}

fn run<E: Element>(
    mut aggregator: Aggregator<E>,
    receiver: HandOffReceiver<E>,
    stats: Arc<SensorStatistics>,
) {
    log::info!("hotspot sensor consumer started");

    while let Some(message) = receiver.recv() {
        let summary = match message {
            ChannelMessage::Summary(summary) => summary,
            ChannelMessage::Shutdown => break,
        };
        let collector_id = summary.collector_id;
        let window_id = summary.window_id;

        if panic::catch_unwind(AssertUnwindSafe(|| aggregator.process(summary))).is_err() {
            log::error!(
                "meet error in consumer while processing collector {}, window {}",
                collector_id,
                window_id
            );
            stats.record_consumer_failure();
        }
    }

    log::info!("hotspot sensor consumer stopped");
}
