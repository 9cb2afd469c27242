//! End-to-end polling against the simulated controller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use voltage_s7::result::ERR_TCP_CONNECTION_FAILED;
use voltage_s7::sim::MemoryPlc;
use voltage_s7::{
    ConnectionConfig, PlcConnection, PollEngine, PollSummary, TaggedValue, TickOutcome,
};

fn engine_with(plc: MemoryPlc, config: ConnectionConfig) -> Arc<PollEngine<MemoryPlc>> {
    let connection = Arc::new(PlcConnection::with_config("192.168.0.10", plc, config));
    Arc::new(PollEngine::new(connection))
}

#[test]
fn test_mixed_tags_single_tick() {
    let mut plc = MemoryPlc::new().with_block(12, 80);
    plc.set_bytes(12, 4, &[0b0001_0000]);
    plc.set_bytes(12, 10, &[0xFF, 0x9C]);
    plc.set_bytes(12, 20, &[0x00, 0x01, 0x86, 0xA0]);
    plc.set_bytes(12, 30, &[0x24, 0x03, 0x15, 0x13, 0x45, 0x30, 0x12, 0x36]);
    plc.set_bytes(12, 60, &[10, 5, b'h', b'e', b'l', b'l', b'o']);

    let engine = engine_with(plc, ConnectionConfig::default());
    let door = engine.add_address("door", "DB12,X4.4").unwrap();
    let temp = engine.add_address("temp", "DB12,INT10").unwrap();
    let count = engine.add_address("count", "DB12,DINT20").unwrap();
    let stamp = engine.add_address("stamp", "DB12,DT30").unwrap();
    let label = engine.add_address("label", "DB12,STRING60.10").unwrap();

    assert_eq!(
        engine.tick(),
        TickOutcome::Completed(PollSummary {
            succeeded: 5,
            failed: 0
        })
    );

    assert!(door.as_bool());
    assert_eq!(temp.as_integer(), -100);
    assert_eq!(count.as_integer(), 100_000);
    assert_eq!(
        stamp.as_timestamp(),
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_milli_opt(13, 45, 30, 123)
            .unwrap()
    );
    assert_eq!(label.as_text(), "hello");

    // Reconnected once by the first tag; later tags reuse the session
    assert_eq!(engine.connection().with_client(|c| c.connect_calls()), 1);
}

#[test]
fn test_transient_failures_are_retried() {
    let mut plc = MemoryPlc::new().with_block(1, 8);
    plc.set_bytes(1, 0, &[42]);
    plc.fail_next(3, ERR_TCP_CONNECTION_FAILED);

    let engine = engine_with(plc, ConnectionConfig::default());
    engine.connection().connect();
    let tag = engine.add_address("value", "DB1,B0").unwrap();

    assert!(tag.read_from_device());
    assert_eq!(tag.value(), TaggedValue::Byte(42));
    assert_eq!(engine.connection().with_client(|c| c.read_calls()), 4);
}

#[test]
fn test_failed_tag_keeps_cached_value() {
    let plc = MemoryPlc::new().with_block(1, 8);
    let engine = engine_with(plc, ConnectionConfig::default());
    engine.connection().connect();
    let tag = engine.add_address("value", "DB1,INT0").unwrap();
    let other = engine.add_address("other", "DB1,B2").unwrap();

    assert!(tag.set_integer(1234));
    engine.tick();
    assert_eq!(tag.as_integer(), 1234);

    engine
        .connection()
        .with_client(|c| c.fail_next(8, ERR_TCP_CONNECTION_FAILED));
    assert_eq!(
        engine.tick(),
        TickOutcome::Completed(PollSummary {
            succeeded: 0,
            failed: 2
        })
    );
    assert_eq!(tag.as_integer(), 1234);
    assert_eq!(other.value(), TaggedValue::Byte(0));
}

#[test]
fn test_item_changed_spans_all_tags() {
    let plc = MemoryPlc::new().with_block(1, 8);
    let engine = engine_with(plc, ConnectionConfig::default());
    let changed = Arc::new(Mutex::new(Vec::new()));
    let sink = changed.clone();
    engine
        .connection()
        .on_item_changed(move |tag| sink.lock().unwrap().push(tag.name().to_string()));

    engine.add_address("a", "DB1,B0").unwrap();
    engine.add_address("b", "DB1,B1").unwrap();

    engine.tick();
    engine.tick();
    engine.connection().with_client(|c| c.set_bytes(1, 1, &[5]));
    engine.tick();

    assert_eq!(*changed.lock().unwrap(), vec!["a", "b", "b"]);
}

#[cfg(feature = "runtime")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timer_delivers_device_changes() {
    let plc = MemoryPlc::new().with_block(3, 4);
    let engine = engine_with(plc, ConnectionConfig::new().with_poll_interval_ms(15));
    let level = engine.add_address("level", "DB3,INT0").unwrap();

    let changes = Arc::new(AtomicUsize::new(0));
    let counter = changes.clone();
    level.on_change(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let handle = engine.start().expect("interval configured");
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    engine
        .connection()
        .with_client(|c| c.set_bytes(3, 0, &[0x01, 0xF4]));
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;

    assert!(handle.stop().await);
    assert_eq!(changes.load(Ordering::SeqCst), 2);
    assert_eq!(level.as_integer(), 500);
}

#[cfg(feature = "runtime")]
#[test]
fn test_timer_disabled_by_default() {
    let engine = engine_with(MemoryPlc::new(), ConnectionConfig::default());
    tokio_test::block_on(async {
        assert!(engine.start().is_none());
    });
}

#[cfg(feature = "runtime")]
#[test]
fn test_timer_stops_on_current_thread_runtime() {
    let plc = MemoryPlc::new().with_block(2, 4);
    let engine = engine_with(plc, ConnectionConfig::new().with_poll_interval_ms(10));
    let flag = engine.add_address("flag", "DB2,X0.0").unwrap();

    tokio_test::block_on(async {
        let handle = engine.start().expect("interval configured");
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(handle.stop().await);
    });

    assert_eq!(flag.value(), TaggedValue::Bool(false));
}

#[test]
fn test_try_operations_report_errors() {
    let plc = MemoryPlc::new().with_block(4, 4);
    let engine = engine_with(plc, ConnectionConfig::new().with_max_attempts(1));
    let word = engine.add_address("word", "DB4,INT0").unwrap();
    let outside = engine.add_address("outside", "DB4,DINT2").unwrap();

    tokio_test::assert_ok!(word.try_write(-7i16));
    let value = tokio_test::assert_ok!(word.try_read());
    assert_eq!(value, TaggedValue::Int16(-7));

    tokio_test::assert_err!(outside.try_read());
    tokio_test::assert_err!(word.try_write("not a number"));
}
