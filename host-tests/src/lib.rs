//! Host-based tests for the spot-price display
//! These tests run on the development machine, not on the ESP32
