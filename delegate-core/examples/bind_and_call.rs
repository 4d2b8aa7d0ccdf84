//! Bind free functions and methods to one delegate type and call them
//!
//! Usage:
//!   cargo run -p delegate-core --example bind_and_call

use delegate_core::Delegate;
use std::cell::Cell;

fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

struct Thermostat {
    offset: f64,
    readings: Cell<u32>,
}

impl Thermostat {
    fn calibrate(&self, raw: f64) -> f64 {
        self.readings.set(self.readings.get() + 1);
        raw + self.offset
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();

    let thermostat = Thermostat {
        offset: -1.5,
        readings: Cell::new(0),
    };

    let mut convert = Delegate::<(f64,), f64>::new();
    println!("empty: {}", convert.is_empty());

    convert.connect(celsius_to_fahrenheit);
    println!("21.0 C = {:.1} F", convert.invoke(21.0));

    convert.connect_method(Thermostat::calibrate, &thermostat);
    println!("raw 21.0 -> calibrated {:.1}", convert.invoke(21.0));
    println!("readings taken: {}", thermostat.readings.get());

    let same = Delegate::from_method(Thermostat::calibrate, &thermostat);
    println!("same binding: {}", convert == same);

    convert.reset();
    match convert.try_call((21.0,)) {
        Ok(value) => println!("unexpected value {}", value),
        Err(e) => println!("after reset: {}", e),
    }
}
