//! Component C — the 192 KiB SRAM ROM cache.
//!
//! Mirrors the selected ROM's payload into fast SRAM so mapper loops never
//! wait on flash XIP for a cache hit. Bulk-filling the cache is a DMA
//! operation on real hardware (§4.2); this module only implements the
//! policy (what's cached, what falls back to flash, what's simply out of
//! range) and takes the fill as a plain byte copy so it can be exercised
//! without DMA in tests. The `firmware` crate wraps [`RomCache::fill`] in a
//! DMA transfer with /WAIT held low for the duration.

/// Size of the SRAM region reserved for the ROM cache / expanded-slot
/// mapper RAM (§3.1, §3.4). The same physical region serves both roles;
/// only one is active per loaded ROM.
pub const ROM_CACHE_SIZE: usize = 192 * 1024;

/// Anything that can serve a byte of ROM beyond the cached region: the
/// flash XIP window in firmware, or an in-memory slice in tests.
pub trait RomSource {
    fn read_byte(&self, offset: u32) -> u8;
}

impl RomSource for &[u8] {
    fn read_byte(&self, offset: u32) -> u8 {
        self.get(offset as usize).copied().unwrap_or(0xFF)
    }
}

/// The SRAM-backed cache plus the fallback policy for ROMs bigger than it.
pub struct RomCache<'a> {
    sram: &'a mut [u8; ROM_CACHE_SIZE],
    /// How many bytes of `sram` are valid (== min(rom_size, ROM_CACHE_SIZE)).
    cached_len: usize,
    /// Total size of the ROM payload this cache was filled from.
    rom_size: u32,
}

impl<'a> RomCache<'a> {
    /// Borrow a (board-provided) SRAM region and load it from `rom`.
    ///
    /// If `rom` is larger than [`ROM_CACHE_SIZE`], only the first
    /// `ROM_CACHE_SIZE` bytes are cached; reads past that fall back to
    /// `flash` in [`RomCache::read`].
    pub fn fill(sram: &'a mut [u8; ROM_CACHE_SIZE], rom: &[u8]) -> Self {
        let cached_len = rom.len().min(ROM_CACHE_SIZE);
        sram[..cached_len].copy_from_slice(&rom[..cached_len]);
        Self {
            sram,
            cached_len,
            rom_size: rom.len() as u32,
        }
    }

    /// Wraps an SRAM region a DMA transfer has already filled, skipping
    /// the CPU-side copy [`RomCache::fill`] would otherwise do. `sram`
    /// must already hold the first `min(rom_size, ROM_CACHE_SIZE)` bytes
    /// of the ROM.
    pub fn from_filled_sram(sram: &'a mut [u8; ROM_CACHE_SIZE], rom_size: u32) -> Self {
        let cached_len = (rom_size as usize).min(ROM_CACHE_SIZE);
        Self {
            sram,
            cached_len,
            rom_size,
        }
    }

    pub fn rom_size(&self) -> u32 {
        self.rom_size
    }

    /// Read one byte of ROM at `offset`, using the fast SRAM path when
    /// cached, falling back to `flash` when the offset is beyond the
    /// cached region but still within the ROM, and returning open-bus
    /// 0xFF past the end of the ROM (§4.3 "all mappers" rule).
    pub fn read(&self, offset: u32, flash: &impl RomSource) -> u8 {
        if offset >= self.rom_size {
            return 0xFF;
        }
        if (offset as usize) < self.cached_len {
            self.sram[offset as usize]
        } else {
            flash.read_byte(offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_cached_rom_reads_from_sram_not_flash() {
        let mut sram = Box::new([0u8; ROM_CACHE_SIZE]);
        let rom: Vec<u8> = (0..0x8000u32).map(|i| (i & 0xFF) as u8).collect();
        let cache = RomCache::fill(&mut sram, &rom);
        let poisoned_flash: &[u8] = &[0xAA; 0x8000];
        for addr in [0u32, 1, 0x1234, 0x7FFF] {
            assert_eq!(cache.read(addr, &poisoned_flash), (addr & 0xFF) as u8);
        }
    }

    #[test]
    fn oversized_rom_falls_back_to_flash_past_cache() {
        let mut sram = Box::new([0u8; ROM_CACHE_SIZE]);
        let rom: Vec<u8> = vec![0x11; ROM_CACHE_SIZE + 4096];
        let cache = RomCache::fill(&mut sram, &rom);
        let flash: &[u8] = &rom;
        assert_eq!(cache.read(0, &flash), 0x11);
        assert_eq!(cache.read((ROM_CACHE_SIZE - 1) as u32, &flash), 0x11);
        assert_eq!(cache.read(ROM_CACHE_SIZE as u32, &flash), 0x11);
        assert_eq!(cache.read((ROM_CACHE_SIZE + 4095) as u32, &flash), 0x11);
    }

    #[test]
    fn offset_past_rom_end_is_open_bus() {
        let mut sram = Box::new([0u8; ROM_CACHE_SIZE]);
        let rom = [0x42u8; 0x1000];
        let cache = RomCache::fill(&mut sram, &rom);
        let flash: &[u8] = &[];
        assert_eq!(cache.read(0x1000, &flash), 0xFF);
        assert_eq!(cache.read(0xFFFF, &flash), 0xFF);
    }
}
