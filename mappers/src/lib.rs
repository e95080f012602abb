#![cfg_attr(not(test), no_std)]
//! Components D, E, F, G — the mapper registry, menu selector, and the
//! per-mapper bank-switching/translation logic of §4.3, plus the
//! expanded-slot arbitration of §3.4/§4.8 which wraps the Sunrise IDE
//! mapper from [`picoverse_sunrise`].
//!
//! Every module here exposes pure address/data arithmetic — `translate`,
//! `apply_write` — rather than owning a PIO read/write loop itself. The
//! `firmware` crate wires these into [`picoverse_core::bus::service_read_cycle`]/
//! [`picoverse_core::bus::service_plain_read_cycle`] loops (§4.3 loop
//! templates A and B) against the real PIO FIFOs.

pub mod ascii16;
pub mod ascii8;
pub mod bank;
pub mod expanded_slot;
pub mod konami;
pub mod menu;
pub mod neo;
pub mod plain;
pub mod registry;
pub mod rom_table;
pub mod sunrise_mapper;

pub use registry::MapperKind;
