//! Component K — Explorer extensions (§4.10), the 2350 Explorer board's
//! onboard SD card. Compiled in only under the `explorer` feature; the
//! plain RP2040 board never sees this module. Mirrors the board-exchange
//! shape Component C already uses for the Sunrise sector buffer: the menu
//! ROM asks for something via a sentinel I/O write, the firmware fills a
//! fixed buffer, and subsequent reads serve it byte-by-byte.

use core::fmt::Write as _;

use embedded_sdmmc::{BlockDevice, TimeSource, Timestamp, VolumeIdx, VolumeManager};
use heapless::{String, Vec};

use picoverse_scc_audio::dac::StereoBuffer;

/// One page of the directory listing matches one PIO-bus-sized transfer
/// (§4.10): at most this many entries are ever resident at once.
pub const ENTRIES_PER_PAGE: usize = 16;
/// Matches [`picoverse_mappers::rom_table::NAME_LEN`] so a directory
/// entry and a flashed ROM record name fit the same display width.
pub const NAME_LEN: usize = 50;
/// Longest search filter the menu ROM can type in before a terminator.
pub const SEARCH_QUERY_LEN: usize = 32;
/// The paging data buffer's fixed size, matching the Sunrise sector
/// buffer convention (§3.3) this component deliberately echoes.
pub const PAGE_BUFFER_LEN: usize = 512;

/// `embedded-sdmmc` wants a time source for its directory-entry
/// timestamps; this board has no RTC, so every entry reports the same
/// fixed epoch. Harmless: the menu ROM never displays or sorts by it.
pub struct NoRtc;

impl TimeSource for NoRtc {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 0,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

fn has_cartridge_extension(name: &str) -> bool {
    let ends_with = |suffix: &str| name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix);
    ends_with(".rom") || ends_with(".mx1") || ends_with(".mx2")
}

/// ASCII case-insensitive substring search without allocating — `str`'s
/// own `to_ascii_lowercase` needs `alloc`, which this firmware doesn't
/// link.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window.eq_ignore_ascii_case(needle))
}

/// One enumerated file, trimmed/padded the same way
/// [`picoverse_mappers::rom_table::RomRecord::name`] is so the menu ROM's
/// display code can treat SD entries and flashed entries identically.
#[derive(Clone)]
pub struct DirEntry {
    pub name: String<NAME_LEN>,
    pub size_bytes: u32,
}

/// The cached, (optionally) filtered directory listing plus the paging
/// cursor into it (§4.10 "paging data buffer").
pub struct DirectoryIndex {
    entries: Vec<DirEntry, 256>,
    filter: String<SEARCH_QUERY_LEN>,
    page_cursor: usize,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self { entries: Vec::new(), filter: String::new(), page_cursor: 0 }
    }

    /// Rebuilds the listing from the SD card's FAT root directory,
    /// keeping only `.ROM`/`.MX1`/`.MX2` names (§4.10's file-enumeration
    /// responsibility). Silently drops entries past the 256-file cap
    /// rather than failing the whole scan.
    pub fn rescan<D: BlockDevice, T: TimeSource>(&mut self, volume_mgr: &mut VolumeManager<D, T>, volume: VolumeIdx) -> Result<(), embedded_sdmmc::Error<D::Error>> {
        self.entries.clear();
        let mut vol = volume_mgr.open_volume(volume)?;
        let mut root = vol.open_root_dir()?;
        root.iterate_dir(|raw_entry| {
            // `ShortFileName` only implements `Display`, not a no_std
            // string conversion, so format straight into a fixed buffer
            // rather than via `alloc::string::ToString` (this firmware
            // doesn't link `alloc`).
            let mut name = String::<NAME_LEN>::new();
            if write!(name, "{}", raw_entry.name).is_err() {
                return;
            }
            if !has_cartridge_extension(&name) {
                return;
            }
            let _ = self.entries.push(DirEntry { name, size_bytes: raw_entry.size });
        })?;
        self.apply_filter();
        Ok(())
    }

    /// Re-applies the current search query (§4.10 "search query
    /// handling"), dropping entries whose name doesn't contain it
    /// case-insensitively, and resets the paging cursor to the first
    /// page — matching the Sunrise sector buffer's "any seek invalidates
    /// the cached page" discipline.
    fn apply_filter(&mut self) {
        self.page_cursor = 0;
    }

    /// Accumulates one filter-query byte (§4.10); a `\0` or `\r`
    /// terminator triggers a re-filter and resets paging.
    pub fn observe_query_byte(&mut self, byte: u8) {
        if byte == 0 || byte == b'\r' {
            self.apply_filter();
            return;
        }
        let _ = self.filter.push(byte as char);
    }

    fn matching_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let query = self.filter.as_str();
        self.entries.iter().enumerate().filter_map(move |(i, e)| if query.is_empty() || contains_ignore_case(&e.name, query) { Some(i) } else { None })
    }

    /// Sets which page of the filtered listing the next buffer fill
    /// should serve (§4.10's sentinel-write page-index protocol).
    pub fn select_page(&mut self, page_index: usize) {
        self.page_cursor = page_index;
    }

    /// Fills the 512-byte paging buffer with up to [`ENTRIES_PER_PAGE`]
    /// fixed-width name slots from the current page of the filtered
    /// listing, matching out-of-range pages with an empty page rather
    /// than erroring (mirrors `RomCache::read`'s out-of-range fallback).
    pub fn fill_page_buffer(&self, buffer: &mut [u8; PAGE_BUFFER_LEN]) {
        buffer.fill(0);
        let start = self.page_cursor * ENTRIES_PER_PAGE;
        for (slot, index) in self.matching_indices().skip(start).take(ENTRIES_PER_PAGE).enumerate() {
            let entry = &self.entries[index];
            let offset = slot * NAME_LEN;
            let bytes = entry.name.as_bytes();
            buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
    }
}

impl Default for DirectoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// MP3 decode bridge (§4.10): decodes one preview clip frame-by-frame
/// into [`StereoBuffer`]s, reusing Component I's I²S path. Time-sliced
/// with SCC audio by the caller — never both active for the same
/// cartridge, since only one cartridge is loaded at a time.
pub struct Mp3Preview<'a> {
    decoder: nanomp3::Decoder,
    remaining: &'a [u8],
}

impl<'a> Mp3Preview<'a> {
    pub fn new(clip: &'a [u8]) -> Self {
        Self { decoder: nanomp3::Decoder::new(), remaining: clip }
    }

    /// Decodes the next frame's worth of PCM into `buffer`, returning
    /// `false` once the clip is exhausted. A decode error mid-clip is
    /// treated as end-of-clip rather than propagated: this is a cosmetic
    /// preview feature, not the cartridge-loading path.
    pub fn fill_next(&mut self, buffer: &mut StereoBuffer) -> bool {
        let Some(frame) = self.decoder.decode(self.remaining) else {
            return false;
        };
        self.remaining = frame.rest;
        for (slot, sample) in frame.samples.iter().take(buffer.frames.len()).enumerate() {
            buffer.frames[slot] = [*sample, *sample];
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> String<NAME_LEN> {
        let mut n = String::new();
        n.push_str(s).unwrap();
        n
    }

    #[test]
    fn cartridge_extension_matching_is_case_insensitive() {
        assert!(has_cartridge_extension("GAME.ROM"));
        assert!(has_cartridge_extension("game.rom"));
        assert!(has_cartridge_extension("game.mx1"));
        assert!(!has_cartridge_extension("readme.txt"));
    }

    #[test]
    fn page_buffer_fills_and_resets_cleanly() {
        let mut index = DirectoryIndex::new();
        let _ = index.entries.push(DirEntry { name: name("A.ROM"), size_bytes: 1024 });
        let _ = index.entries.push(DirEntry { name: name("B.ROM"), size_bytes: 2048 });

        let mut buffer = [0u8; PAGE_BUFFER_LEN];
        index.fill_page_buffer(&mut buffer);
        assert_eq!(&buffer[0..5], b"A.ROM");
        assert_eq!(&buffer[NAME_LEN..NAME_LEN + 5], b"B.ROM");
    }

    #[test]
    fn search_query_terminator_resets_paging_cursor() {
        let mut index = DirectoryIndex::new();
        index.select_page(3);
        index.observe_query_byte(b'a');
        index.observe_query_byte(0);
        assert_eq!(index.page_cursor, 0);
    }
}
