#![cfg_attr(not(test), no_std)]
//! Component H — the USB-MSC bridge that runs on core 1 (§4.6).
//!
//! Core 0 only ever touches [`picoverse_sunrise::SunriseIde`] through its
//! bus-facing methods; this crate is the other half of that split. It owns
//! nothing of its own beyond the polling loop in [`bridge::poll_once`],
//! which drains the request flags in [`picoverse_sunrise::usb::SharedUsbFlags`]
//! against a concrete [`picoverse_sunrise::usb::UsbMassStorageHost`] and
//! feeds the results back into the shared `SunriseIde` instance. The
//! firmware crate is expected to call `poll_once` in a tight loop spawned
//! on core 1, the same way `picoverse_scc_audio::bridge::fill_buffer` is
//! called in a tight loop for SCC audio.

pub mod bridge;

pub use bridge::poll_once;
