//! Read Tags Example
//!
//! Parses a handful of data-block addresses, writes values through tags and
//! reads them back from an in-memory controller.
//!
//! # Address Syntax
//!
//! | Address | Field |
//! |---------|-------|
//! | `DB12,X4.4` | bit 4 of byte 4 |
//! | `DB12,INT10` | 16-bit integer at byte 10 |
//! | `DB12,DINT20` | 32-bit integer at byte 20 |
//! | `DB12,DT30` | DATE_AND_TIME at byte 30 |
//! | `DB12,STRING60.10` | string of up to 10 chars at byte 60 |
//!
//! # Running this example
//!
//! ```bash
//! cargo run --example read_tags
//! ```

use std::sync::Arc;

use chrono::Local;
use voltage_s7::sim::MemoryPlc;
use voltage_s7::{encode_value, AddressDescriptor, PlcConnection, Tag, TaggedValue};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // =========================================================================
    // Part 1: Address descriptors
    // =========================================================================
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║                   Address Descriptors                      ║");
    println!("╚════════════════════════════════════════════════════════════╝\n");

    let addresses = [
        "DB12,X4.4",
        "DB12,INT10",
        "DB12,DINT20",
        "DB12,DT30",
        "DB12,STRING60.10",
    ];

    println!(
        "{:<18} {:<6} {:<6} {:<4} {:<6} {}",
        "Address", "Block", "Byte", "Bit", "Len", "Type"
    );
    println!("{}", "-".repeat(60));
    for address in addresses {
        let desc: AddressDescriptor = address.parse()?;
        println!(
            "{:<18} {:<6} {:<6} {:<4} {:<6} {:?}",
            address, desc.block_number, desc.byte_offset, desc.bit_offset, desc.byte_length,
            desc.logical_type
        );
    }

    for bad in ["DB12,REAL4", "DB12,X4", "db12,INT2"] {
        if let Err(err) = AddressDescriptor::parse("bad", bad) {
            println!("  {:<16} -> {}", bad, err);
        }
    }

    // =========================================================================
    // Part 2: Counted string encoding
    // =========================================================================
    println!("\n📦 String truncation");
    let label = AddressDescriptor::parse("label", "DB12,STRING60.10")?;
    let bytes = encode_value(&label, &TaggedValue::from("test-1234567890"))?;
    println!("  \"test-1234567890\" -> {:02X?}", bytes);

    // =========================================================================
    // Part 3: Tags against a simulated controller
    // =========================================================================
    println!("\n🔌 Tags");
    let plc = MemoryPlc::new().with_block(12, 80);
    let connection = Arc::new(PlcConnection::new("192.168.0.10", plc));
    connection.connect();

    let door = Tag::new(connection.clone(), "door_open", "DB12,X4.4")?;
    let temperature = Tag::new(connection.clone(), "temperature", "DB12,INT10")?;
    let counter = Tag::new(connection.clone(), "counter", "DB12,DINT20")?;
    let stamp = Tag::new(connection.clone(), "last_change", "DB12,DT30")?;
    let text = Tag::new(connection.clone(), "label", "DB12,STRING60.10")?;

    door.set_bool(true);
    temperature.set_integer(-125);
    counter.write_to_device("250000");
    stamp.set_timestamp(Local::now().naive_local());
    text.set_text("test-1234567890");

    for tag in [&door, &temperature, &counter, &stamp, &text] {
        tag.read_from_device();
        println!("  {:<12} {:<18} = {}", tag.name(), tag.address(), tag.value());
    }

    connection.close();
    Ok(())
}
