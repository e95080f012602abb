//! IDENTIFY DEVICE buffer construction (§4.5.5). Word-addressed fields are
//! little-endian; ASCII string fields use the ATA convention of swapping
//! each character pair within a word.

use crate::usb::UsbDeviceInfo;

const SERIAL_NUMBER: &str = "PICOVERSE0000001";

fn write_word(buf: &mut [u8; 512], word: usize, value: u16) {
    buf[word * 2] = (value & 0xFF) as u8;
    buf[word * 2 + 1] = (value >> 8) as u8;
}

/// Writes `text`, space-padded/truncated to `len` bytes (even), starting
/// at word `first_word`, swapping each character pair per the ATA string
/// convention.
fn write_ata_string(buf: &mut [u8; 512], first_word: usize, len: usize, text: &str) {
    let bytes = text.as_bytes();
    for i in (0..len).step_by(2) {
        let c0 = bytes.get(i).copied().unwrap_or(b' ');
        let c1 = bytes.get(i + 1).copied().unwrap_or(b' ');
        let offset = first_word * 2 + i;
        buf[offset] = c1;
        buf[offset + 1] = c0;
    }
}

/// Builds the 512-byte IDENTIFY DEVICE response for a mounted device
/// (§4.5.5 field table). `buf` is expected zeroed by the caller; only the
/// fields the table names are populated.
pub fn build(buf: &mut [u8; 512], info: &UsbDeviceInfo) {
    buf.fill(0);

    write_word(buf, 0, 0x0040);

    let heads: u32 = 16;
    let sectors_per_track: u32 = 63;
    let cylinders = (info.block_count / (heads * sectors_per_track)).min(16383);

    write_word(buf, 1, cylinders as u16);
    write_word(buf, 3, heads as u16);
    write_word(buf, 6, sectors_per_track as u16);

    write_ata_string(buf, 10, 20, SERIAL_NUMBER);
    write_ata_string(buf, 23, 8, &info.revision);

    let mut model: heapless::String<40> = heapless::String::new();
    let _ = model.push_str(info.vendor.trim_end());
    let _ = model.push(' ');
    let _ = model.push_str(info.product.trim_end());
    write_ata_string(buf, 27, 40, &model);

    write_word(buf, 47, 0x0001);
    write_word(buf, 49, 0x0200);
    write_word(buf, 53, 0x0001);

    write_word(buf, 54, cylinders as u16);
    write_word(buf, 55, heads as u16);
    write_word(buf, 56, sectors_per_track as u16);

    let current_capacity = cylinders * heads * sectors_per_track;
    write_word(buf, 57, (current_capacity & 0xFFFF) as u16);
    write_word(buf, 58, (current_capacity >> 16) as u16);

    write_word(buf, 60, (info.block_count & 0xFFFF) as u16);
    write_word(buf, 61, (info.block_count >> 16) as u16);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> UsbDeviceInfo {
        UsbDeviceInfo {
            mounted: true,
            block_count: 0x1000,
            block_size: 512,
            vendor: heapless::String::try_from("ACME").unwrap(),
            product: heapless::String::try_from("DISK").unwrap(),
            revision: heapless::String::try_from("1.0").unwrap(),
        }
    }

    #[test]
    fn lba_supported_bit_is_set() {
        let mut buf = [0u8; 512];
        build(&mut buf, &sample_info());
        assert_eq!(&buf[98..100], &[0x00, 0x02]);
    }

    #[test]
    fn total_lba_sectors_word_matches_block_count() {
        let mut buf = [0u8; 512];
        build(&mut buf, &sample_info());
        assert_eq!(&buf[120..124], &[0x00, 0x10, 0x00, 0x00]);
    }

    #[test]
    fn model_string_contains_vendor_and_product() {
        let mut buf = [0u8; 512];
        build(&mut buf, &sample_info());
        let model_bytes = &buf[54..94];
        // ATA strings are byte-swapped pairwise; un-swap to check content.
        let mut unswapped = heapless::Vec::<u8, 40>::new();
        for pair in model_bytes.chunks(2) {
            unswapped.push(pair[1]).unwrap();
            unswapped.push(pair[0]).unwrap();
        }
        let text = core::str::from_utf8(&unswapped).unwrap();
        assert!(text.contains("ACME"));
        assert!(text.contains("DISK"));
    }
}
