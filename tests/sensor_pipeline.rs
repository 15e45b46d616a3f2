//! End-to-end pipeline tests through the public API

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use hotspot_sensor::prelude::*;

fn manual_sensor<E: Element>(
    clock: &Arc<ManualWatch>,
    windows_number: usize,
    hot_threshold: u64,
) -> HotspotSensorBuilder<E> {
    HotspotSensor::builder()
        .with_clock(clock.clone())
        .windows_number(windows_number)
        .hot_threshold(hot_threshold)
}

#[test]
fn test_collector_window_reaches_notification() {
    let clock = Arc::new(ManualWatch::new());
    let sensor = manual_sensor::<&'static str>(&clock, 3, 4)
        .l1_capacity(2)
        .l2_capacity(2)
        .build()
        .unwrap();

    let mut collector = sensor.collector().unwrap();
    for element in ["a", "b", "a", "a", "c", "a", "d", "c", "d"] {
        collector.access(element);
    }
    clock.advance(1);
    // counted in window 0, then flushes it
    collector.access("x");

    // close the horizon with an empty summary three windows later
    assert!(sensor.submit(CollectorId::next(), WindowId::new(3), Vec::new(), 0));
    sensor.shutdown().unwrap();

    let latest = sensor.latest().unwrap();
    let entries: HashMap<_, _> = latest
        .hot_entries()
        .iter()
        .map(|e| (*e.element(), e.count()))
        .collect();
    assert_eq!(entries, HashMap::from([("a", 4)]));
    assert_eq!(latest.total_count(), 10);
    assert!(latest.element_set_changed());

    let stats = sensor.stats();
    assert_eq!(stats.submitted, 2);
    assert_eq!(stats.merged, 2);
    assert_eq!(stats.rollovers, 1);
    // d is seen twice after tier-2 filled up
    assert_eq!(stats.l2_overflow, 1);
}

#[test]
fn test_increase_from_many_threads() {
    let clock = Arc::new(ManualWatch::new());
    let exporter: LatestNotification<String> = LatestNotification::new();
    let sensor = manual_sensor::<String>(&clock, 4, 100)
        .add_notification_handler(exporter.clone())
        .build()
        .unwrap();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let sensor = sensor.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    sensor.increase("hot".to_string());
                    sensor.increase(format!("cold-{}-{}", worker, i));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    // the workers are gone; their windows wait for this sweep
    clock.advance(1);
    assert_eq!(sensor.flush_elapsed(), 4);
    assert!(sensor.submit(CollectorId::next(), WindowId::new(4), Vec::new(), 0));
    sensor.shutdown().unwrap();

    assert_eq!(exporter.hot_elements(), HashSet::from(["hot".to_string()]));
    assert_eq!(exporter.hot_entries().get("hot"), Some(&200));
    assert_eq!(exporter.total_count(), 400);
}

#[test]
fn test_exited_producer_window_goes_out_with_next_access() {
    let clock = Arc::new(ManualWatch::new());
    let exporter: LatestNotification<u32> = LatestNotification::new();
    let sensor = manual_sensor::<u32>(&clock, 2, 2)
        .add_notification_handler(exporter.clone())
        .build()
        .unwrap();

    let producer = sensor.clone();
    thread::spawn(move || {
        for _ in 0..5 {
            producer.increase(42);
        }
    })
    .join()
    .unwrap();

    // any access hands the parked window to the channel first
    sensor.increase(0);
    assert!(sensor.submit(CollectorId::next(), WindowId::new(2), Vec::new(), 0));
    sensor.shutdown().unwrap();

    assert_eq!(exporter.hot_entries().get(&42), Some(&5));
    assert_eq!(exporter.total_count(), 5);
    assert_eq!(sensor.stats().merged, 2);
}

#[test]
fn test_shutdown_hands_over_exited_producer_windows() {
    let clock = Arc::new(ManualWatch::new());
    let sensor = manual_sensor::<u32>(&clock, 2, 2).build().unwrap();

    let producers: Vec<_> = (0..3)
        .map(|_| {
            let sensor = sensor.clone();
            thread::spawn(move || sensor.increase(1))
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    sensor.shutdown().unwrap();
    let stats = sensor.stats();
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.merged, 3);
}

#[test]
fn test_handlers_observe_every_rollover_in_order() {
    let clock = Arc::new(ManualWatch::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    let (first, second) = (log.clone(), log.clone());

    let sensor = manual_sensor::<u64>(&clock, 2, 3)
        .add_notification_handler(move |n: &Notification<u64>| {
            first.lock().unwrap().push(("first", n.element_set_changed(), n.entry_set_changed()));
        })
        .add_notification_handler(move |n: &Notification<u64>| {
            second.lock().unwrap().push(("second", n.element_set_changed(), n.entry_set_changed()));
        })
        .build()
        .unwrap();

    let counted = |count| vec![Entry::new(7u64, count).unwrap()];
    sensor.submit(CollectorId::next(), WindowId::new(0), counted(2), 3);
    sensor.submit(CollectorId::next(), WindowId::new(2), counted(3), 4);
    sensor.submit(CollectorId::next(), WindowId::new(4), Vec::new(), 0);
    sensor.submit(CollectorId::next(), WindowId::new(6), Vec::new(), 0);
    sensor.shutdown().unwrap();

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec![
            // {7:3} appears
            ("first", true, true),
            ("second", true, true),
            // the rollover payload lands in the new window: {7:4}
            ("first", false, true),
            ("second", false, true),
            // nothing left
            ("first", true, true),
            ("second", true, true),
        ]
    );
}

#[test]
fn test_stale_and_duplicate_summaries_are_diagnostics_only() {
    let clock = Arc::new(ManualWatch::starting_at(WindowId::new(10)));
    let sensor = manual_sensor::<u8>(&clock, 2, 1).build().unwrap();
    let id = CollectorId::next();

    assert!(sensor.submit(id, WindowId::new(9), Vec::new(), 1));
    assert!(sensor.submit(id, WindowId::new(10), Vec::new(), 1));
    assert!(sensor.submit(id, WindowId::new(10), Vec::new(), 1));
    sensor.shutdown().unwrap();

    let stats = sensor.stats();
    assert_eq!(stats.stale_discarded, 1);
    assert_eq!(stats.duplicate_rejected, 1);
    assert_eq!(stats.merged, 1);
    assert!(sensor.latest().is_none());
}

#[test]
fn test_submit_after_shutdown_is_dropped() {
    let clock = Arc::new(ManualWatch::new());
    let sensor = manual_sensor::<u8>(&clock, 2, 1).build().unwrap();
    sensor.shutdown().unwrap();

    assert!(!sensor.submit(CollectorId::next(), WindowId::ZERO, Vec::new(), 1));
    assert_eq!(sensor.stats().dropped, 1);
}

#[test]
fn test_config_from_json() {
    let config = SensorConfig::from_json(
        r#"{"windows_number": 5, "window_size_millis": 20, "hot_threshold": 3, "l2_strategy": "open_addressing"}"#,
    )
    .unwrap();
    let clock = Arc::new(ManualWatch::new());
    let sensor = HotspotSensor::<u32>::builder()
        .with_config(config.clone())
        .with_clock(clock)
        .build()
        .unwrap();
    assert_eq!(sensor.config(), &config);
    sensor.shutdown().unwrap();
}

#[test]
fn test_wall_clock_detection() {
    let sensor = HotspotSensor::<u32>::builder()
        .windows_number(5)
        .window_size_millis(10)
        .hot_threshold(20)
        .build()
        .unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let producer = {
        let sensor = sensor.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            let mut cold = 1_000u32;
            while !stop.load(Ordering::Relaxed) {
                for _ in 0..50 {
                    sensor.increase(1);
                    sensor.increase(cold);
                    cold = cold.wrapping_add(1).max(1_000);
                }
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut detected = false;
    while Instant::now() < deadline {
        if sensor.latest().is_some_and(|n| n.hot_elements().contains(&1)) {
            detected = true;
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    stop.store(true, Ordering::Relaxed);
    producer.join().unwrap();
    sensor.shutdown().unwrap();

    assert!(detected);
    let latest = sensor.latest().unwrap();
    assert!(latest.hot_entries().iter().all(|e| e.count() >= 20));
}
