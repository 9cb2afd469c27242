//! Poll Changes Example
//!
//! Runs the polling engine on a tokio timer while a background task mutates
//! the simulated controller, printing every change notification.
//!
//! # Running this example
//!
//! ```bash
//! cargo run --example poll_changes
//! ```

use std::sync::Arc;
use std::time::Duration;

use voltage_s7::sim::MemoryPlc;
use voltage_s7::{ConnectionConfig, PlcConnection, PollEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConnectionConfig::new().with_poll_interval_ms(100);
    let plc = MemoryPlc::new().with_block(5, 16);
    let connection = Arc::new(PlcConnection::with_config("192.168.0.20", plc, config));

    connection.on_item_changed(|tag| {
        println!("  [item changed] {} = {}", tag.name(), tag.value());
    });

    let engine = Arc::new(PollEngine::new(connection.clone()));
    let running = engine.add_address("running", "DB5,X0.0")?;
    engine.add_address("speed", "DB5,INT2")?;
    engine.add_address("batch", "DB5,DINT4")?;

    running.on_change(|tag| {
        let state = if tag.as_bool() { "started" } else { "stopped" };
        println!("  [running] machine {}", state);
    });

    let handle = engine
        .start()
        .ok_or("poll interval must be non-zero")?;
    println!("polling {} tags every 100 ms", engine.len());

    for step in 1..=5i16 {
        tokio::time::sleep(Duration::from_millis(250)).await;
        connection.with_client(|plc| {
            plc.set_bytes(5, 0, &[u8::from(step % 2 == 1)]);
            plc.set_bytes(5, 2, &(step * 300).to_be_bytes());
            plc.set_bytes(5, 4, &(i32::from(step) * 1000).to_be_bytes());
        });
    }

    tokio::time::sleep(Duration::from_millis(250)).await;
    let stopped = handle.stop().await;
    println!("timer stopped cleanly: {}", stopped);

    connection.close();
    Ok(())
}
