//! Voltage S7 Demo
//!
//! Demonstrates the voltage_s7 library features including:
//! - Address parsing and the typed codec
//! - Tags with retry on a flaky connection
//! - The polling engine driven by a tokio timer
//!
//! Usage: cargo run --bin demo [poll_interval_ms]
//! Example: cargo run --bin demo 200

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use voltage_s7::result::ERR_TCP_CONNECTION_RESET;
use voltage_s7::sim::MemoryPlc;
use voltage_s7::{
    decode_value, encode_value, AddressDescriptor, ConnectionConfig, PlcConnection, PollEngine,
    TaggedValue,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 {}", voltage_s7::info());
    println!("=============================\n");

    let interval_ms = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(200u64);

    // =========================================================================
    // Part 1: Codec (no connection required)
    // =========================================================================
    println!("📦 Part 1: Field Codec");
    println!("----------------------");

    let samples = [
        ("DB1,X0.3", TaggedValue::Bool(true)),
        ("DB1,B1", TaggedValue::Byte(200)),
        ("DB1,INT2", TaggedValue::Int16(-1234)),
        ("DB1,DINT4", TaggedValue::Int32(123_456)),
        ("DB1,STRING8.6", TaggedValue::from("overflowing")),
    ];

    for (address, value) in &samples {
        let desc = AddressDescriptor::parse("sample", address)?;
        let bytes = encode_value(&desc, value)?;
        let back = decode_value(&desc, &bytes)?;
        println!("  {:<14} {:<12} -> {:02X?} -> {}", address, value.to_string(), bytes, back);
    }

    // =========================================================================
    // Part 2: Retry on a flaky link
    // =========================================================================
    println!("\n🔁 Part 2: Retry");
    println!("----------------");

    let mut plc = MemoryPlc::new().with_block(10, 32);
    plc.fail_next(2, ERR_TCP_CONNECTION_RESET);
    let config = ConnectionConfig::new().with_poll_interval_ms(interval_ms);
    let connection = Arc::new(PlcConnection::with_config("192.168.0.10", plc, config));

    let engine = Arc::new(PollEngine::new(connection.clone()));
    let setpoint = engine.add_address("setpoint", "DB10,INT0")?;
    let alarm = engine.add_address("alarm", "DB10,X2.0")?;
    let message = engine.add_address("message", "DB10,STRING4.20")?;

    let ok = setpoint.set_integer(750);
    println!(
        "  write setpoint=750 -> {} after {} connect(s), {} write call(s)",
        ok,
        connection.with_client(|c| c.connect_calls()),
        connection.with_client(|c| c.write_calls())
    );

    // =========================================================================
    // Part 3: Polling
    // =========================================================================
    println!("\n⏱  Part 3: Polling every {} ms", interval_ms);
    println!("--------------------------------");

    connection.on_item_changed(|tag| println!("  {} -> {}", tag.name(), tag.value()));

    let Some(handle) = engine.start() else {
        println!("  polling disabled (interval 0)");
        return Ok(());
    };

    sleep(Duration::from_millis(interval_ms * 2)).await;
    alarm.set_bool(true);
    message.set_text("pressure high");
    sleep(Duration::from_millis(interval_ms * 2)).await;

    let stopped = handle.stop().await;
    println!("\n✅ Demo finished (timer stopped: {})", stopped);
    connection.close();
    Ok(())
}
