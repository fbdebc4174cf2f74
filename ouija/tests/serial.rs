mod common;

use std::thread;

use common::{no_breakpoints, Cart, ToyCore};
use ouija::{Config, Debugger, Stop};

/// Writes "Hi" to the serial port, then loops.
fn hello() -> Cart {
    Cart::new(2).at(
        0x0100,
        &[0x3E, b'H', 0xE0, 0x01, 0x3E, b'i', 0xE0, 0x01, 0x18, 0xFE],
    )
}

#[test_log::test]
fn consumer_thread_receives_bytes_in_order() {
    let mut dbg = Debugger::with_config(ToyCore::new(), hello().banks(), &no_breakpoints());
    let output = dbg.serial_output();
    let consumer = thread::spawn(move || output.take(2).collect::<Vec<u8>>());

    assert_eq!(dbg.run(), Stop::NaturalLoop(0x0108));
    assert_eq!(consumer.join().unwrap(), b"Hi");
}

#[test]
fn output_is_dropped_without_a_consumer() {
    let mut dbg = Debugger::with_config(ToyCore::new(), hello().banks(), &no_breakpoints());
    assert_eq!(dbg.run(), Stop::NaturalLoop(0x0108));
}

#[test]
fn hung_up_consumer_does_not_block() {
    let mut dbg = Debugger::with_config(ToyCore::new(), hello().banks(), &no_breakpoints());
    drop(dbg.serial_output());
    assert_eq!(dbg.run(), Stop::NaturalLoop(0x0108));
}

#[test]
fn buffered_output_can_be_drained_later() {
    let config = Config {
        serial_capacity: 4,
        ..no_breakpoints()
    };
    let mut dbg = Debugger::with_config(ToyCore::new(), hello().banks(), &config);
    let output = dbg.serial_output();
    assert_eq!(dbg.run(), Stop::NaturalLoop(0x0108));
    assert_eq!(output.try_recv(), Some(b'H'));
    assert_eq!(output.try_recv(), Some(b'i'));
    assert_eq!(output.try_recv(), None);
}

#[test]
fn only_the_serial_register_is_intercepted() {
    // `ldh ($ff02), a` is the serial control register.
    let cart = Cart::new(2).at(0x0100, &[0x3E, b'x', 0xE0, 0x02, 0x18, 0xFE]);
    let config = Config {
        serial_capacity: 1,
        ..no_breakpoints()
    };
    let mut dbg = Debugger::with_config(ToyCore::new(), cart.banks(), &config);
    let output = dbg.serial_output();
    assert_eq!(dbg.run(), Stop::NaturalLoop(0x0104));
    assert_eq!(output.try_recv(), None);
}
