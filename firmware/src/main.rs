//! Firmware entry point. Boots one RP2040 core as the Z80 bus engine
//! (Components A/B/C/D/E/G/J) and, once a cartridge is selected, hands
//! the other core whichever of the USB-MSC bridge (Component H) or SCC
//! audio fill loop (Component I) that mapper needs.

#![no_std]
#![no_main]

use core::cell::RefCell;

use rp2040_hal::clocks::Clock;
use rp2040_hal::dma::DMAExt;
use rp2040_hal::gpio::Pins;
use rp2040_hal::pac;
use rp2040_hal::Watchdog;

use picoverse_sunrise::SunriseIde;

mod audio_bridge;
mod clocks;
mod dispatch;
#[cfg(feature = "explorer")]
mod explorer;
mod i2s;
mod io_bus;
mod menu_reset;
mod multicore;
mod pins;
mod pio_bus;
mod rom_flash;
mod scc_host;
mod usb_bridge;
mod usb_host;

use defmt_rtt as _;
use panic_probe as _;

#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

#[rp2040_hal::entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();

    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let clocks = clocks::init(pac.XOSC, pac.CLOCKS, pac.PLL_SYS, pac.PLL_USB, &mut pac.RESETS, &mut watchdog)
        .expect("clock configuration failed");

    let sio = multicore::sio(pac.SIO);
    let gpio_pins = Pins::new(pac.IO_BANK0, pac.PADS_BANK0, sio.gpio_bank0, &mut pac.RESETS);
    let _cartridge_pins = pins::CartridgePins::claim(gpio_pins);

    let (mut pio0, sm0, sm1, sm2, sm3) = pac.PIO0.split(&mut pac.RESETS);
    let (bus_reads, bus_writes) = pio_bus::install(&mut pio0, sm0, sm1, clocks.system_clock.freq());
    let (io_reads, io_writes) = io_bus::install(&mut pio0, sm2, sm3);

    let (mut pio1, i2s_sm0, _sm1, _sm2, _sm3) = pac.PIO1.split(&mut pac.RESETS);
    let i2s_out = i2s::install(&mut pio1, i2s_sm0);

    let dma = pac.DMA.split(&mut pac.RESETS);

    let menu_rom = rom_flash::menu_rom_blob();
    let cartridge_blob_len = rom_flash::CARTRIDGE_BLOB_LEN;

    // SAFETY: read once, before core 1 is spawned, purely to sample
    // GPIO_IN for the MSX1 reset-detection path (§4.4); no peripheral
    // ownership is required for a read-only register peek, and the
    // pointer stays valid for the program's whole lifetime.
    let sio_dev = unsafe { &*pac::SIO::ptr() };

    // Both closures below need the PSM/PPB/SIO-FIFO handles to actually
    // spawn core 1, but only one of them ever runs for a given cartridge
    // (§4.10 "only one of the two is active"). A `RefCell` lets both
    // closures share one `&` borrow of the resources and take them out
    // at call time instead of each needing its own exclusive `&mut`.
    let core1_resources = RefCell::new(Some((pac.PSM, pac.PPB, sio.fifo)));

    let mut spawn_usb_bridge = |ide: &'static mut SunriseIde| {
        // SAFETY: called at most once per cartridge boot, before
        // `multicore::spawn` starts core 1 running `usb_bridge::entry`.
        unsafe { usb_bridge::stash(ide) };
        let (mut psm, mut ppb, sio_fifo) = core1_resources.borrow_mut().take().expect("core 1 already spawned this boot");
        multicore::spawn(&mut psm, &mut ppb, sio_fifo, usb_bridge::entry);
    };
    let mut spawn_audio_bridge = |synth: &'static mut scc_host::SilentSynth, i2s: i2s::I2sOutput| {
        // SAFETY: called at most once per cartridge boot, before
        // `multicore::spawn` starts core 1 running `audio_bridge::entry`.
        unsafe { audio_bridge::stash(synth, i2s) };
        let (mut psm, mut ppb, sio_fifo) = core1_resources.borrow_mut().take().expect("core 1 already spawned this boot");
        multicore::spawn(&mut psm, &mut ppb, sio_fifo, audio_bridge::entry);
    };
    let bridges = dispatch::Core1Bridges {
        spawn_usb_bridge: &mut spawn_usb_bridge,
        spawn_audio_bridge: &mut spawn_audio_bridge,
    };

    defmt::info!("picoverse firmware booting");

    dispatch::run(
        bus_reads,
        bus_writes,
        io_reads,
        io_writes,
        i2s_out,
        dma.ch0,
        menu_rom,
        cartridge_blob_len,
        sio_dev,
        bridges,
    )
}
