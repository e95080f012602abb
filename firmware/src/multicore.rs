//! Core-1 spawn helper. Core 0 runs the bus loop ([`crate::dispatch`]);
//! core 1 runs whichever of the USB-MSC bridge (§4.6) or SCC audio fill
//! loop (§4.7) the selected mapper needs — never both, since a cartridge
//! loads at most one of Sunrise/Konami-SCC at a time (§4.10 note: "only
//! one of the two is active").

use rp2040_hal::multicore::{Multicore, Stack};
use rp2040_hal::pac;
use rp2040_hal::sio::Sio;

/// 4 KiB is ample for either core-1 loop: neither recurses and both work
/// entirely out of `'static` buffers.
static mut CORE1_STACK: Stack<4096> = Stack::new();

/// Spawns `entry` on core 1 and returns immediately; core 0 goes on to
/// run its own loop. `entry` is expected to never return, matching
/// core 0's bus loop (§5 "Cancellation: none").
pub fn spawn(
    psm: &mut pac::PSM,
    ppb: &mut pac::PPB,
    sio_fifo: rp2040_hal::sio::SioFifo,
    entry: fn() -> !,
) {
    let mut mc = Multicore::new(psm, ppb, sio_fifo);
    let cores = mc.cores();
    let core1 = &mut cores[1];
    // SAFETY: `CORE1_STACK` is only ever handed to this one core-1 spawn
    // call, which happens exactly once during boot before core 1 starts
    // running.
    #[allow(static_mut_refs)]
    core1
        .spawn(unsafe { &mut CORE1_STACK.mem }, entry)
        .expect("core 1 failed to start");
}

pub fn sio(sio_dev: pac::SIO) -> Sio {
    Sio::new(sio_dev)
}
