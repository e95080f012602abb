//! Error types that cross a component boundary.
//!
//! Most bus-cycle-local failures (address outside a mapper's window, ROM
//! offset past the end of the payload) are not modeled as `Result` at all —
//! per the tri-state/0xFF convention they are just another response token
//! (see `ResponseToken::TRISTATE`). The errors here are the ones that are
//! fatal at a coarser grain: a malformed ROM record table, or a mapper ID
//! the firmware doesn't know how to dispatch.

use core::fmt;

#[derive(Clone, Copy, Debug, defmt::Format)]
pub enum CartridgeError {
    /// The ROM record table at the head of the flash blob didn't parse:
    /// a record's declared size/offset runs past the blob, or the
    /// terminator (all-0xFF record) was never found within the maximum
    /// table length.
    MalformedRomTable,
    /// A record named a mapper code outside 1..=11.
    UnsupportedMapper(u8),
}

impl fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRomTable => write!(f, "malformed ROM record table"),
            Self::UnsupportedMapper(id) => write!(f, "unsupported mapper id {id}"),
        }
    }
}
