//! Component C's board half: the flash XIP window the ROM record table
//! and cartridge payloads live in (§3.1, §6.2), and the DMA copy that
//! fills [`picoverse_core::rom_cache::RomCache`] (§4.2). Reading flash
//! while it's mapped for execute-in-place is just a memory load — no ROM
//! data API call is needed, unlike erase/program (which this firmware
//! never does; the ROM image is written once at manufacturing time).

use rp2040_hal::dma::{single_buffer, Channel, CH0};
use rp2040_hal::pac;

use picoverse_core::rom_cache::{RomCache, RomSource, ROM_CACHE_SIZE};

/// Exact size of the menu ROM region (§6.2 invariant: "the menu ROM,
/// when present, is exactly 32 768 bytes").
pub const MENU_ROM_SIZE: usize = 32 * 1024;

/// Size of the `CART_DATA` flash region reserved in `memory.x`: the
/// record table plus every ROM payload it points into.
pub const CARTRIDGE_BLOB_LEN: usize = 1472 * 1024;

/// Linker-provided start of the menu ROM region and the record-table
/// region that immediately follows it (§6.2's multi-ROM layout), each
/// its own symbol so the two blobs can be handed out with independent
/// lifetimes/lengths. Both defined in `memory.x`.
unsafe extern "C" {
    static __menu_rom_start: u8;
    static __cartridge_flash_start: u8;
}

/// The 32 KiB menu ROM as a byte slice (§4.4, §6.2).
pub fn menu_rom_blob() -> &'static [u8] {
    // SAFETY: `__menu_rom_start` is a linker symbol placed by `memory.x`
    // at the start of a region reserved for exactly `MENU_ROM_SIZE`
    // bytes of menu ROM and never written to at runtime; XIP keeps it
    // mapped for the whole program.
    unsafe {
        let ptr = core::ptr::addr_of!(__menu_rom_start);
        core::slice::from_raw_parts(ptr, MENU_ROM_SIZE)
    }
}

/// The record-table-plus-payloads blob as a byte slice, valid for the
/// lifetime of the firmware image (flash contents never change at
/// runtime, §6.7).
pub fn cartridge_blob(len: usize) -> &'static [u8] {
    // SAFETY: `__cartridge_flash_start` is a linker symbol placed by
    // `memory.x` at the start of a region reserved for the cartridge
    // blob and never written to at runtime; XIP keeps it mapped for the
    // whole program.
    unsafe {
        let ptr = core::ptr::addr_of!(__cartridge_flash_start);
        core::slice::from_raw_parts(ptr, len)
    }
}

/// [`RomSource`] for bytes beyond the cached region (§4.2 flash
/// execute-in-place fallback).
pub struct FlashRom<'a> {
    blob: &'a [u8],
    payload_offset: u32,
}

impl<'a> FlashRom<'a> {
    pub fn new(blob: &'a [u8], payload_offset: u32) -> Self {
        Self { blob, payload_offset }
    }
}

impl RomSource for FlashRom<'_> {
    fn read_byte(&self, offset: u32) -> u8 {
        self.blob
            .get((self.payload_offset as usize) + offset as usize)
            .copied()
            .unwrap_or(0xFF)
    }
}

/// Bulk-copies a ROM payload from flash into the SRAM cache region via
/// DMA (§4.2: the copy happens "while /WAIT is held low", i.e. before
/// the bus loop starts servicing cycles, so no bus activity races it),
/// then hands the now-filled SRAM to [`RomCache`] without a second copy.
pub fn fill_cache_via_dma<'a>(
    dma_ch0: Channel<CH0>,
    sram: &'a mut [u8; ROM_CACHE_SIZE],
    rom: &[u8],
) -> RomCache<'a> {
    let copy_len = rom.len().min(ROM_CACHE_SIZE);
    let transfer = single_buffer::Config::new(dma_ch0, &rom[..copy_len], &mut sram[..copy_len]).start();
    let (dma_ch0, _src, dst) = transfer.wait();
    core::mem::drop(dma_ch0);
    RomCache::from_filled_sram(dst, rom.len() as u32)
}

/// Flash-pending variant used when caching is disabled for this mapper
/// (§4.2: NEO-8, NEO-16, expanded-slot). No DMA copy happens; reads go
/// straight to [`FlashRom`].
pub fn flash_only<'a>(blob: &'a [u8], payload_offset: u32, payload_size: u32) -> (FlashRom<'a>, u32) {
    (FlashRom::new(blob, payload_offset), payload_size)
}

#[allow(unused)]
fn _assert_pac_ch0_exists(_: pac::DMA) {}
