#![cfg_attr(not(test), no_std)]
//! Component I — the SCC/SCC+ sound chip bridge and I²S audio output.
//!
//! Core 0's Konami-SCC mapper loop (`picoverse_mappers::konami`) forwards
//! decoded writes and checks [`synth::is_register_read`] on reads. Core 1
//! runs [`bridge::fill_buffer`] against a [`dac::BufferPool`] in a tight
//! loop, independent of the bus loop on core 0.

pub mod bridge;
pub mod dac;
pub mod synth;

pub use synth::SccSynth;
