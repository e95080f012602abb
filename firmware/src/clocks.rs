//! Component A — system clock configuration. The bus loop's timing
//! budget (§4.1, §5: ≤280 ns between /RD asserting and the Z80 sampling
//! data) only has headroom once the system clock sits inside
//! [`picoverse_core::pins::MIN_SYSTEM_CLOCK_HZ`]..[`MAX_SYSTEM_CLOCK_HZ`].
//! The external crystal stays at its usual 12 MHz; the PLL is configured
//! for the high end of that range.

use rp2040_hal::clocks::{ClocksManager, InitError};
use rp2040_hal::pac;
use rp2040_hal::Watchdog;

use picoverse_core::pins::MAX_SYSTEM_CLOCK_HZ;

const XOSC_CRYSTAL_FREQ_HZ: u32 = 12_000_000;

pub fn init(
    xosc_dev: pac::XOSC,
    clocks_dev: pac::CLOCKS,
    pll_sys_dev: pac::PLL_SYS,
    pll_usb_dev: pac::PLL_USB,
    resets: &mut pac::RESETS,
    watchdog: &mut Watchdog,
) -> Result<ClocksManager, InitError> {
    rp2040_hal::clocks::init_clocks_and_plls(
        XOSC_CRYSTAL_FREQ_HZ,
        xosc_dev,
        clocks_dev,
        pll_sys_dev,
        pll_usb_dev,
        resets,
        watchdog,
    )
    .map(|clocks| {
        defmt::info!("system clock configured to {} Hz", MAX_SYSTEM_CLOCK_HZ);
        clocks
    })
}
