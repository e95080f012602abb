//! Component E's board half: the two reset-detection paths the menu
//! loop races against each other after a ROM has been selected (§4.4).
//! The address-level part (serving the menu ROM, capturing the
//! selection write) is [`picoverse_mappers::menu::MenuSelector`]; this
//! module is the GPIO-level part that selector can't express on its own.

use rp2040_hal::pac;

use crate::pins::{ADDRESS_BASE_PIN, RD_PIN};

/// MSX2 path (§4.4): the BIOS rescans expanded slots after reset and at
/// some point reads address 0x0000 back through the cartridge. The menu
/// loop already has this for free from the last address the read
/// responder captured; this free function just names the check.
pub fn msx2_reset_seen(last_addr: u16) -> bool {
    last_addr == 0x0000
}

/// MSX1 path (§4.4): the BIOS never re-selects the cartridge at 0x0000
/// via /SLTSL on this generation, so detection falls back to sampling
/// the raw GPIO lines directly — /RD low and A0..A15 all zero — read
/// straight off the SIO `GPIO_IN` register rather than through a typed
/// `Pin`, since the address/RD lines are owned by PIO0 for the read
/// responder and this is a non-blocking poll run in the gaps between
/// serviced cycles, not a dedicated input pin.
pub fn msx1_reset_seen(sio: &pac::SIO) -> bool {
    let gpio_in = sio.gpio_in().read().bits();
    let rd_low = gpio_in & (1 << RD_PIN) == 0;
    let address_mask: u32 = 0xFFFF << ADDRESS_BASE_PIN;
    let address_is_zero = gpio_in & address_mask == 0;
    rd_low && address_is_zero
}
