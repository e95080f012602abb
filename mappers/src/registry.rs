//! Component D — the mapper registry.
//!
//! Eleven mapper behaviors (§4.3), dispatched by a closed enum rather
//! than a trait-object table: the set of mapper IDs is fixed by this
//! firmware's hardware generation and will not grow at runtime, so a
//! `match` gives exhaustiveness checking for free and keeps the hot
//! per-cycle path free of vtable indirection (§9 "Resolved for this
//! implementation", item 6).

use picoverse_core::error::CartridgeError;

#[derive(Clone, Copy, Debug, defmt::Format, PartialEq, Eq)]
pub enum MapperKind {
    Plain16,
    Plain32,
    KonamiScc,
    Linear48,
    Ascii8,
    Ascii16,
    KonamiPlain,
    Neo8,
    Neo16,
    SunriseNextor,
    SunriseExpandedSlot,
}

impl MapperKind {
    pub fn from_code(code: u8) -> Result<Self, CartridgeError> {
        match code {
            1 => Ok(Self::Plain16),
            2 => Ok(Self::Plain32),
            3 => Ok(Self::KonamiScc),
            4 => Ok(Self::Linear48),
            5 => Ok(Self::Ascii8),
            6 => Ok(Self::Ascii16),
            7 => Ok(Self::KonamiPlain),
            8 => Ok(Self::Neo8),
            9 => Ok(Self::Neo16),
            10 => Ok(Self::SunriseNextor),
            11 => Ok(Self::SunriseExpandedSlot),
            other => Err(CartridgeError::UnsupportedMapper(other)),
        }
    }

    /// Whether the ROM cache should be disabled for this mapper (§4.2):
    /// the NEO-* mappers address the full 48 KiB window densely enough
    /// that caching buys little, and the expanded-slot mapper reuses the
    /// cache's SRAM region as mapper RAM instead.
    pub fn disables_rom_cache(self) -> bool {
        matches!(self, Self::Neo8 | Self::Neo16 | Self::SunriseExpandedSlot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_documented_code_resolves() {
        for code in 1..=11u8 {
            assert!(MapperKind::from_code(code).is_ok());
        }
    }

    #[test]
    fn unknown_code_is_unsupported_mapper() {
        let err = MapperKind::from_code(0).unwrap_err();
        assert!(matches!(err, CartridgeError::UnsupportedMapper(0)));
        let err = MapperKind::from_code(12).unwrap_err();
        assert!(matches!(err, CartridgeError::UnsupportedMapper(12)));
    }
}
