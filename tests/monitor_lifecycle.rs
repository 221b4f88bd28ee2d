//! Monitor driver lifecycle tests
//!
//! Start/stop behaviour of the timer thread and snapshot consistency while
//! it runs.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use healthmon_service::alert::{AlertReadiness, Alerter, MemorySink};
use healthmon_service::config::MonitorConfig;
use healthmon_service::monitor::{Monitor, MonitorError};
use healthmon_service::registry::{Registry, RegistryOptions};

fn fast_monitor(sink: MemorySink) -> Monitor {
    let mut registry = Registry::new(RegistryOptions::default(), Some(99));
    let now = chrono::Utc::now();
    registry.add_water_body("Riverside Reservoir", now);
    registry.add_water_body("Mill Creek", now);
    registry.add_toilet("Central Park");
    Monitor::new(registry, Alerter::new(Box::new(sink)), Duration::from_millis(2))
}

#[test]
fn test_snapshots_are_never_partial_while_running() {
    let monitor = fast_monitor(MemorySink::new());
    let handle = monitor.start().unwrap();

    for _ in 0..200 {
        let snapshot = handle.snapshot();
        for body in &snapshot.water_bodies {
            let n = body.readings().len();
            assert!((12..=60).contains(&n), "unexpected history length {}", n);
            assert!(body.readings().windows(2).all(|w| w[0].id < w[1].id));
            assert!(body.readings().windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
        for toilet in &snapshot.toilets {
            assert!(toilet.history.len() <= 20);
            assert_eq!(
                toilet.history.last().map(|s| s.usage).unwrap_or(0),
                toilet.usage,
                "current usage matches latest sample"
            );
        }
        thread::sleep(Duration::from_micros(200));
    }

    handle.stop();
}

#[test]
fn test_stop_halts_ticks_and_alerts() {
    let sink = MemorySink::new();
    let monitor = fast_monitor(sink.clone());
    monitor.arm_alerts();

    let handle = monitor.start().unwrap();
    thread::sleep(Duration::from_millis(100));
    handle.stop();

    let ticks = monitor.snapshot().tick;
    let alerts = sink.events().len();
    assert!(ticks > 0);

    thread::sleep(Duration::from_millis(30));
    assert_eq!(monitor.snapshot().tick, ticks);
    assert_eq!(sink.events().len(), alerts);
}

#[test]
fn test_alerts_delivered_match_tick_events() {
    let sink = MemorySink::new();
    let monitor = fast_monitor(sink.clone());
    monitor.arm_alerts();

    let reported = Arc::new(Mutex::new(0usize));
    let reported_in_thread = Arc::clone(&reported);
    let handle = monitor
        .start_with(move |report, _| {
            *reported_in_thread.lock().unwrap() += report.events.len();
        })
        .unwrap();
    thread::sleep(Duration::from_millis(150));
    handle.stop();

    assert_eq!(sink.events().len(), *reported.lock().unwrap());
    if !sink.events().is_empty() {
        assert_eq!(monitor.alerter().lock().unwrap().readiness(), AlertReadiness::Active);
    }
}

#[test]
fn test_monitor_from_default_config() {
    let monitor = Monitor::from_config(&MonitorConfig::default(), Box::new(MemorySink::new()));
    assert_eq!(monitor.interval(), Duration::from_secs(2));

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.water_bodies.len(), 2);
    assert_eq!(snapshot.toilets.len(), 2);
    assert!(snapshot.water_bodies.iter().all(|b| b.readings().len() == 12));

    let report = monitor.tick_once();
    assert_eq!(report.water_bodies_updated, 2);
    assert_eq!(report.toilets_updated, 2);
}

#[test]
fn test_clones_share_one_driver() {
    let monitor = fast_monitor(MemorySink::new());
    let clone = monitor.clone();

    let handle = monitor.start().unwrap();
    assert!(clone.is_running());
    assert!(matches!(clone.start(), Err(MonitorError::AlreadyRunning)));

    handle.stop();
    assert!(!clone.is_running());
    clone.start().expect("clone may drive once the first driver stopped").stop();
}
