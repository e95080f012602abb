/// The 16-bit response token pushed to the read-responder SM's TX FIFO.
///
/// Low byte is the data; high byte is the pin-direction mask the PIO
/// program applies to D0..D7 (all-ones = drive, all-zeros = tri-state; see
/// §4.1). Addresses outside a mapper's window always respond tri-stated
/// with `data = 0xFF`, which is indistinguishable from open bus to the Z80.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub struct ResponseToken {
    pub data: u8,
    pub drive: bool,
}

impl ResponseToken {
    /// Not our address: leave the data bus tri-stated.
    pub const TRISTATE: ResponseToken = ResponseToken {
        data: 0xFF,
        drive: false,
    };

    /// Drive `data` onto the bus.
    pub const fn drive(data: u8) -> Self {
        ResponseToken { data, drive: true }
    }

    /// Encode as the 16-bit word the PIO TX FIFO expects: pin-direction
    /// mask in the high byte, data in the low byte.
    pub const fn encode(self) -> u16 {
        let mask: u16 = if self.drive { 0xFF00 } else { 0x0000 };
        mask | self.data as u16
    }

    pub const fn decode(word: u16) -> Self {
        ResponseToken {
            data: (word & 0xFF) as u8,
            drive: (word >> 8) as u8 == 0xFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tristate_is_ff_undriven() {
        assert_eq!(ResponseToken::TRISTATE.data, 0xFF);
        assert!(!ResponseToken::TRISTATE.drive);
    }

    #[test]
    fn encode_decode_round_trips() {
        for tok in [ResponseToken::drive(0x3C), ResponseToken::TRISTATE] {
            assert_eq!(ResponseToken::decode(tok.encode()), tok);
        }
    }

    #[test]
    fn encode_matches_token_format() {
        assert_eq!(ResponseToken::drive(0xAB).encode(), 0xFFAB);
        assert_eq!(ResponseToken::TRISTATE.encode(), 0x00FF);
    }
}
