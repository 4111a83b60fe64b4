//! Elpris Core - Hardware-independent logic for the spot-price display
//!
//! This crate contains the control loop, renderer and data model so they can
//! be tested on the host platform without requiring ESP32 hardware.

pub mod color;
pub mod config;
pub mod controller;
pub mod display_math;
pub mod poll;
pub mod price;
pub mod render;
pub mod surface;

#[cfg(any(test, feature = "fakes"))]
pub mod fakes;

pub use controller::{Controller, ControllerError};
pub use price::{FetchError, FetchOutcome, Price};
pub use surface::{Clock, DisplaySurface, NetworkLink, PriceClient};
