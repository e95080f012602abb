//! Component J — the loader dispatcher (§4.9). Boots into the menu,
//! resolves the selected ROM record, and hands off to whichever mapper
//! loop (§4.3) that record's mapper code names. None of the loops below
//! ever return; this module's job ends the moment one is entered.

use picoverse_core::bus::{service_read_cycle, BusEngine, ReadCycleSource, ResponseToken, WriteCycleSource};
use picoverse_core::error::CartridgeError;
use picoverse_core::rom_cache::{RomCache, RomSource, ROM_CACHE_SIZE};
use rp2040_hal::dma::{Channel, CH0};
use picoverse_mappers::ascii16::Ascii16;
use picoverse_mappers::ascii8::Ascii8;
use picoverse_mappers::expanded_slot::ExpandedSlot;
use picoverse_mappers::konami::{KonamiPlain, KonamiScc};
use picoverse_mappers::menu::MenuSelector;
use picoverse_mappers::neo::{Neo16, Neo8};
use picoverse_mappers::plain;
use picoverse_mappers::registry::MapperKind;
use picoverse_mappers::rom_table::{self, RomRecord};
use picoverse_mappers::sunrise_mapper::SunriseMapper;
use static_cell::StaticCell;

use crate::i2s::I2sOutput;
use crate::io_bus::{IoReads, IoWrites};
use crate::pio_bus::{BusReads, BusWrites};
use crate::rom_flash;
use crate::scc_host::SilentSynth;

/// Widens a borrow into a `'static` one. Sound here because every call
/// site's backing value (the mapper-loop-local `SunriseMapper`,
/// `ExpandedSlot`, or `SilentSynth`) lives inside a function that never
/// returns (§4.3-§4.8's mapper loops are all `-> !`) — the only way back
/// to [`run_cartridge`] is a Z80 reset, which re-enters through [`run`]'s
/// own outer loop and builds a fresh instance for the next `stash` call,
/// never reusing a live one concurrently with the old.
unsafe fn extend_to_static<T>(value: &mut T) -> &'static mut T {
    unsafe { &mut *(value as *mut T) }
}

/// SRAM backing the ROM cache / expanded-slot mapper RAM (§3.1, §4.2).
/// One process-wide singleton, per §9 "Global state": whichever mapper
/// is active owns it exclusively for the life of the loop.
static mut CACHE_SRAM: [u8; ROM_CACHE_SIZE] = [0; ROM_CACHE_SIZE];

/// Backing storage for the mapper instances Components H/I need a
/// `'static` handle into so core 1's bridge loop can be handed one too
/// (§4.6, §4.7). `StaticCell::init` panics on a second call, which is
/// exactly the "exactly once per boot" contract `run_cartridge` already
/// relies on for these mapper kinds.
static SUNRISE_MAPPER_CELL: StaticCell<SunriseMapper> = StaticCell::new();
static SYNTH_CELL: StaticCell<SilentSynth> = StaticCell::new();

/// Closures a board's `main` hands down so the dispatcher can bring up
/// core 1 without owning the PSM/PPB/SIO peripherals itself (§4.6, §4.7).
/// Exactly one of these ever actually spawns anything for a given ROM —
/// a cartridge is either a Sunrise device or a Konami-SCC one, never both.
/// Each closure is handed the freshly-stashed `'static` reference its
/// bridge entry point (`crate::usb_bridge::entry` /
/// `crate::audio_bridge::entry`) will pick back up on core 1, plus — for
/// audio — the I²S output the board's `main` already owns.
pub struct Core1Bridges<'a> {
    pub spawn_usb_bridge: &'a mut dyn FnMut(&'static mut picoverse_sunrise::SunriseIde),
    pub spawn_audio_bridge: &'a mut dyn FnMut(&'static mut SilentSynth, I2sOutput),
}

/// Runs the menu loop until a ROM has been selected and the Z80 reset
/// that follows has been observed, then dispatches into that ROM's
/// mapper loop. Never returns (§4.9, §5 "Cancellation: none" — on a
/// later reset the Z80 restarts and firmware re-enters this same menu
/// loop, not a full firmware restart, so this function's own loop is the
/// outermost one).
pub fn run(
    mut bus_reads: BusReads,
    mut bus_writes: BusWrites,
    io_reads: IoReads,
    io_writes: IoWrites,
    i2s: I2sOutput,
    dma_ch0: Channel<CH0>,
    menu_rom: &[u8],
    cartridge_blob_len: usize,
    sio: &rp2040_hal::pac::SIO,
    mut bridges: Core1Bridges,
) -> ! {
    let mut io = Some((io_reads, io_writes));
    let mut i2s = Some(i2s);
    let mut dma_ch0 = Some(dma_ch0);
    loop {
        let index = run_menu_selection(&mut bus_reads, &mut bus_writes, menu_rom, sio);
        let blob = rom_flash::cartridge_blob(cartridge_blob_len);
        let records = match rom_table::parse_table(blob, 0) {
            Ok(records) => records,
            Err(_) => halt("malformed ROM record table"),
        };
        let Some(record) = records.get(index as usize).copied() else {
            halt("selected index has no matching record");
        };
        run_cartridge(&mut bus_reads, &mut bus_writes, &mut io, &mut i2s, &mut dma_ch0, blob, &record, &mut bridges);
    }
}

/// Fills the SRAM cache for this cartridge's payload via DMA (§4.2: the
/// copy runs "while /WAIT is held low", before the mapper loop starts
/// servicing cycles). The channel is consumed exactly once per boot —
/// every cache-backed mapper arm below needs it, but at most one of them
/// ever runs for a given ROM selection.
fn fill_cache<'a>(dma_ch0: &mut Option<Channel<CH0>>, sram: &'a mut [u8; ROM_CACHE_SIZE], payload: &[u8]) -> RomCache<'a> {
    let channel = dma_ch0.take().expect("ROM cache DMA channel already consumed this boot");
    rom_flash::fill_cache_via_dma(channel, sram, payload)
}

fn run_menu_selection(
    bus_reads: &mut BusReads,
    bus_writes: &mut BusWrites,
    menu_rom: &[u8],
    sio: &rp2040_hal::pac::SIO,
) -> u8 {
    let mut selector = MenuSelector::new();
    let mut last_addr = 0u16;
    loop {
        bus_writes.drain_writes(|addr, data| selector.observe_write(addr, data));
        let addr = bus_reads.next_address();
        bus_writes.drain_writes(|addr, data| selector.observe_write(addr, data));
        last_addr = addr;
        let token = if plain::PLAIN_WINDOW.contains(&addr) {
            let offset = selector.translate(addr);
            ResponseToken::drive(menu_rom.get(offset as usize).copied().unwrap_or(0xFF))
        } else {
            ResponseToken::TRISTATE
        };
        bus_reads.respond(token);

        if let Some(index) = selector.selected_index() {
            if crate::menu_reset::msx2_reset_seen(last_addr) || crate::menu_reset::msx1_reset_seen(sio) {
                return index;
            }
        }
    }
}

fn run_cartridge(
    bus_reads: &mut BusReads,
    bus_writes: &mut BusWrites,
    io: &mut Option<(IoReads, IoWrites)>,
    i2s: &mut Option<I2sOutput>,
    dma_ch0: &mut Option<Channel<CH0>>,
    blob: &[u8],
    record: &RomRecord,
    bridges: &mut Core1Bridges,
) {
    let mapper = match MapperKind::from_code(record.flags.mapper_code) {
        Ok(mapper) => mapper,
        Err(CartridgeError::UnsupportedMapper(id)) => {
            defmt::error!("unsupported mapper id {}", id);
            halt("unsupported mapper id")
        }
        Err(_) => halt("malformed ROM record table"),
    };

    let payload_range =
        record.payload_offset as usize..(record.payload_offset as usize + record.payload_size as usize);
    let payload = &blob[payload_range];
    let (flash, flash_payload_size) = rom_flash::flash_only(blob, record.payload_offset, record.payload_size);

    // SAFETY: `run_cartridge` only runs for the currently selected ROM;
    // the previous mapper loop (if any) never returns on its own, so the
    // only way back here is a fresh menu selection after a Z80 reset,
    // which happens after the prior loop's `&mut CACHE_SRAM` has gone
    // out of scope along with the whole previous `run_cartridge` call.
    #[allow(static_mut_refs)]
    let sram = unsafe { &mut CACHE_SRAM };

    match mapper {
        MapperKind::Plain16 | MapperKind::Plain32 | MapperKind::Linear48 => {
            let cache = fill_cache(dma_ch0, sram, payload);
            run_plain_loop(bus_reads, mapper, &cache, &flash)
        }
        MapperKind::KonamiScc => {
            let synth = SYNTH_CELL.init(SilentSynth);
            // SAFETY: `synth` is a `&'static mut` already; core 0's mapper
            // loop and core 1's audio-fill loop each hold their own
            // exclusive reborrow of it and discipline which register
            // range each one touches per register address (§4.7 "SCC
            // overlay"), the same single-writer-per-field arrangement
            // Component H uses for the shared `SunriseIde`.
            let synth_for_audio = unsafe { extend_to_static(synth) };
            let i2s = i2s.take().expect("Konami SCC mapper needs the I2S output exactly once");
            (bridges.spawn_audio_bridge)(synth_for_audio, i2s);
            let cache = fill_cache(dma_ch0, sram, payload);
            run_konami_scc_loop(bus_reads, bus_writes, KonamiScc::new(), synth, &cache, &flash, record.flags.scc_plus)
        }
        MapperKind::KonamiPlain => {
            let cache = fill_cache(dma_ch0, sram, payload);
            run_banked_loop(bus_reads, bus_writes, KonamiPlain::new(), &cache, &flash, KonamiPlain::translate, KonamiPlain::apply_write)
        }
        MapperKind::Ascii8 => {
            let cache = fill_cache(dma_ch0, sram, payload);
            run_banked_loop(bus_reads, bus_writes, Ascii8::new(), &cache, &flash, Ascii8::translate, Ascii8::apply_write)
        }
        MapperKind::Ascii16 => {
            let cache = fill_cache(dma_ch0, sram, payload);
            run_banked_loop(bus_reads, bus_writes, Ascii16::new(), &cache, &flash, Ascii16::translate, Ascii16::apply_write)
        }
        MapperKind::Neo8 => run_banked_loop_no_cache(bus_reads, bus_writes, Neo8::new(), &flash, flash_payload_size, Neo8::translate, Neo8::apply_write),
        MapperKind::Neo16 => run_banked_loop_no_cache(bus_reads, bus_writes, Neo16::new(), &flash, flash_payload_size, Neo16::translate, Neo16::apply_write),
        MapperKind::SunriseNextor => {
            let mapper = SUNRISE_MAPPER_CELL.init(SunriseMapper::new());
            // SAFETY: see `extend_to_static`; `mapper.ide` is touched by
            // the bus loop below for task-file register access and by
            // core 1's USB bridge for the request flags / sector buffer,
            // which is the split the single-writer-per-field discipline
            // in §9 "Global state" assumes.
            let ide_for_usb = unsafe { extend_to_static(&mut mapper.ide) };
            (bridges.spawn_usb_bridge)(ide_for_usb);
            let cache = fill_cache(dma_ch0, sram, payload);
            run_sunrise_loop(bus_reads, bus_writes, mapper, &cache, &flash)
        }
        MapperKind::SunriseExpandedSlot => {
            let (io_reads, io_writes) = io.take().expect("expanded-slot mapper needs the I/O PIO block exactly once");
            run_expanded_slot_loop(bus_reads, bus_writes, io_reads, io_writes, sram, &flash, flash_payload_size, bridges)
        }
    }
}

fn run_plain_loop(bus_reads: &mut BusReads, mapper: MapperKind, cache: &RomCache, flash: &impl RomSource) -> ! {
    loop {
        let addr = bus_reads.next_address();
        let window = if mapper == MapperKind::Linear48 { plain::LINEAR_WINDOW } else { plain::PLAIN_WINDOW };
        let token = if window.contains(&addr) {
            let offset = if mapper == MapperKind::Linear48 { plain::translate_linear(addr) } else { plain::translate_plain(addr) };
            ResponseToken::drive(cache.read(offset, flash))
        } else {
            ResponseToken::TRISTATE
        };
        bus_reads.respond(token);
    }
}

/// Shared shape for every 8 KiB/16 KiB banked mapper (§4.3 Template A):
/// drain writes, block for a read, drain writes again, translate,
/// respond. `translate`/`apply_write` are the concrete mapper's own
/// methods, so this one function serves ASCII-8, ASCII-16, NEO-*, and
/// Konami (no-SCC) alike.
fn run_banked_loop<M>(
    bus_reads: &mut BusReads,
    bus_writes: &mut BusWrites,
    mut mapper: M,
    cache: &RomCache,
    flash: &impl RomSource,
    translate: fn(&M, u16) -> u32,
    apply_write: fn(&mut M, u16, u8) -> bool,
) -> ! {
    let mut engine = BusEngine::new(bus_reads, bus_writes);
    loop {
        service_read_cycle(
            &mut engine,
            |addr, data| {
                apply_write(&mut mapper, addr, data);
            },
            |addr| {
                if (0x4000..0xC000).contains(&addr) {
                    ResponseToken::drive(cache.read(translate(&mapper, addr), flash))
                } else {
                    ResponseToken::TRISTATE
                }
            },
        );
    }
}

/// NEO-8/NEO-16's segment registers only cover `0x0000..0xC000` (6
/// 8 KiB slices / 3 16 KiB slices respectively) — unlike
/// [`run_banked_loop`]'s mappers, there's no register for the top
/// quarter. `translate` indexes `mapper.regs` by `addr / bank_size` with
/// no bounds check, so a captured address at or above 0xC000 (which the
/// bus engine does capture; the Z80 can address any slot-selected page)
/// would index past the register array. Gate on the window here, the
/// same as `run_banked_loop` does with `0x4000..0xC000`, so `translate`
/// is only ever called with an in-range address.
fn run_banked_loop_no_cache<M>(
    bus_reads: &mut BusReads,
    bus_writes: &mut BusWrites,
    mut mapper: M,
    flash: &impl RomSource,
    rom_size: u32,
    translate: fn(&M, u16) -> u32,
    apply_write: fn(&mut M, u16, u8) -> bool,
) -> ! {
    let mut engine = BusEngine::new(bus_reads, bus_writes);
    loop {
        service_read_cycle(
            &mut engine,
            |addr, data| {
                apply_write(&mut mapper, addr, data);
            },
            |addr| {
                if !(0x0000..0xC000).contains(&addr) {
                    return ResponseToken::TRISTATE;
                }
                let offset = translate(&mapper, addr);
                if offset < rom_size {
                    ResponseToken::drive(flash.read_byte(offset))
                } else {
                    ResponseToken::drive(0xFF)
                }
            },
        );
    }
}

fn run_konami_scc_loop(
    bus_reads: &mut BusReads,
    bus_writes: &mut BusWrites,
    mut mapper: KonamiScc,
    synth: &mut SilentSynth,
    cache: &RomCache,
    flash: &impl RomSource,
    scc_plus: bool,
) -> ! {
    let mut engine = BusEngine::new(bus_reads, bus_writes);
    loop {
        service_read_cycle(
            &mut engine,
            |addr, data| {
                mapper.apply_write_with_synth(addr, data, synth);
            },
            |addr| {
                if (0x4000..0xC000).contains(&addr) {
                    let rom_byte = cache.read(mapper.translate(addr), flash);
                    ResponseToken::drive(mapper.read_with_synth(addr, rom_byte, synth, scc_plus))
                } else {
                    ResponseToken::TRISTATE
                }
            },
        );
    }
}

/// Mapper 10's loop (§4.5, §9 open question 5). An ATA command sequence
/// can issue 8+ consecutive task-file writes with no intervening read
/// (`IDENTIFY DEVICE`, a full sector-transfer setup), and the write FIFO
/// is only 8 deep — blocking in `next_address` between drains (the
/// `service_read_cycle` Template A shape every other banked mapper uses)
/// lets writes pile up behind that block and overflow the FIFO, silently
/// losing part of the command. Polling `try_next_address` non-blockingly
/// and draining writes on every pass, the same shape
/// `run_expanded_slot_loop` uses, keeps the write side draining even
/// while no read cycle is pending.
fn run_sunrise_loop(
    bus_reads: &mut BusReads,
    bus_writes: &mut BusWrites,
    mapper: &mut SunriseMapper,
    cache: &RomCache,
    flash: &impl RomSource,
) -> ! {
    loop {
        bus_writes.drain_writes(|addr, data| {
            if (0x4000..0x8000).contains(&addr) {
                mapper.write(addr, data);
            }
        });

        if let Some(addr) = bus_reads.try_next_address() {
            bus_writes.drain_writes(|addr, data| {
                if (0x4000..0x8000).contains(&addr) {
                    mapper.write(addr, data);
                }
            });
            let token = if (0x4000..0x8000).contains(&addr) {
                ResponseToken::drive(mapper.read(addr, |offset| cache.read(offset, flash)))
            } else {
                ResponseToken::TRISTATE
            };
            bus_reads.respond(token);
        }
    }
}

/// Mapper 11's loop (§4.8) interleaves two independent PIO blocks: the
/// memory bus (this ROM's normal read/write cycles, routed through
/// [`ExpandedSlot`]) and the I/O bus (page-register ports 0xFC..0xFF,
/// §4.1 "I/O bus extension"). Neither may be serviced by blocking on the
/// other's FIFO — an I/O cycle with /WAIT never asserted (§9 open
/// question 1) must get an answer fast regardless of what the memory
/// side is doing — so this loop polls both non-blockingly instead of
/// using [`service_read_cycle`]'s blocking `next_address`.
fn run_expanded_slot_loop(
    bus_reads: &mut BusReads,
    bus_writes: &mut BusWrites,
    mut io_reads: IoReads,
    mut io_writes: IoWrites,
    sram: &mut [u8; ROM_CACHE_SIZE],
    flash: &impl RomSource,
    rom_size: u32,
    bridges: &mut Core1Bridges,
) -> ! {
    let mut slot = ExpandedSlot::new(sram);
    // SAFETY: see `extend_to_static`; this function never returns, so
    // `slot` (and the `SunriseIde` nested inside its Sunrise subslot)
    // outlives the rest of this boot.
    let ide_for_usb = unsafe { extend_to_static(&mut slot.sunrise.ide) };
    (bridges.spawn_usb_bridge)(ide_for_usb);
    loop {
        bus_writes.drain_writes(|addr, data| slot.write(addr, data));
        io_writes.drain_writes(|port, data| slot.io_write(port as u8, data));

        if let Some(addr) = bus_reads.try_next_address() {
            bus_writes.drain_writes(|addr, data| slot.write(addr, data));
            let token = match slot.read(addr, |offset| if offset < rom_size { flash.read_byte(offset) } else { 0xFF }) {
                Some(byte) => ResponseToken::drive(byte),
                None => ResponseToken::TRISTATE,
            };
            bus_reads.respond(token);
        }

        if let Some(port) = io_reads.try_next_address() {
            io_writes.drain_writes(|port, data| slot.io_write(port as u8, data));
            io_reads.respond(ResponseToken::drive(slot.io_read(port as u8)));
        }
    }
}

fn halt(reason: &str) -> ! {
    defmt::error!("fatal: {}", reason);
    loop {
        cortex_m::asm::udf();
    }
}
