//! Core-1 entry point for Component H (§4.6). [`crate::dispatch`] stashes
//! the shared [`SunriseIde`] here immediately before spawning core 1 via
//! [`crate::multicore::spawn`]; [`entry`] is the only consumer and takes it
//! back out exactly once, matching the "board hands both cores a
//! `&'static mut` to the one shared instance" rule in §9 "Global state".

use picoverse_sunrise::SunriseIde;

use crate::usb_host::NoUsbHost;

static mut SHARED_IDE: Option<&'static mut SunriseIde> = None;

/// # Safety
/// Must run on core 0, before `spawn(.., entry)` hands core 1 its entry
/// point, and at most once per cartridge boot.
pub unsafe fn stash(ide: &'static mut SunriseIde) {
    unsafe {
        SHARED_IDE = Some(ide);
    }
}

/// Core 1's body while a Sunrise-family mapper (10 or 11) is active.
/// Never returns — core 1 has nothing else to do until the next reset
/// restarts both cores from their own entry points.
pub fn entry() -> ! {
    #[allow(static_mut_refs)]
    let ide = unsafe { SHARED_IDE.take() }.expect("usb bridge entered without a stashed SunriseIde");
    let mut host = NoUsbHost;
    loop {
        picoverse_usb_bridge::poll_once(&mut host, ide);
    }
}
