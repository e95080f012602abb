//! ROM record table parsing (§3.1, §6.2). The flash blob is consumed
//! as-is: no magic number, no checksum, just a sequence of fixed-width
//! records terminated by an all-0xFF sentinel.

pub const RECORD_SIZE: usize = 59;
pub const MAX_RECORDS: usize = 128;
pub const NAME_LEN: usize = 50;

#[derive(Clone, Copy, Debug, defmt::Format)]
pub enum RomTableError {
    TruncatedRecord,
    NameNotAscii,
    PayloadOverrunsBlob,
}

/// The SCC-audio flags packed into the high bits of a record's mapper
/// byte (§3.1).
#[derive(Clone, Copy, Debug, defmt::Format, PartialEq, Eq)]
pub struct MapperFlags {
    pub mapper_code: u8,
    pub scc_audio: bool,
    pub scc_plus: bool,
}

impl MapperFlags {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            mapper_code: byte & 0x3F,
            scc_audio: byte & 0x80 != 0,
            scc_plus: byte & 0x40 != 0,
        }
    }
}

/// One 59-byte ROM record (§3.1).
#[derive(Clone, Copy, defmt::Format)]
pub struct RomRecord {
    pub name: [u8; NAME_LEN],
    pub flags: MapperFlags,
    pub payload_size: u32,
    pub payload_offset: u32,
}

impl RomRecord {
    pub fn name_str(&self) -> &str {
        let end = self.name.iter().position(|&b| b == b' ').unwrap_or(NAME_LEN);
        core::str::from_utf8(&self.name[..end]).unwrap_or("")
    }

    fn is_terminator(bytes: &[u8; RECORD_SIZE]) -> bool {
        bytes.iter().all(|&b| b == 0xFF)
    }

    fn parse(bytes: &[u8; RECORD_SIZE]) -> Result<Self, RomTableError> {
        let mut name = [0u8; NAME_LEN];
        name.copy_from_slice(&bytes[0..NAME_LEN]);
        if !name.iter().all(|&b| b.is_ascii()) {
            return Err(RomTableError::NameNotAscii);
        }
        let flags = MapperFlags::from_byte(bytes[50]);
        let payload_size = u32::from_le_bytes(bytes[51..55].try_into().unwrap());
        let payload_offset = u32::from_le_bytes(bytes[55..59].try_into().unwrap());
        Ok(Self {
            name,
            flags,
            payload_size,
            payload_offset,
        })
    }
}

/// Reads the record table out of `blob` starting at `table_offset`,
/// stopping at the first terminator record or after [`MAX_RECORDS`]
/// entries. Validates that every record's payload fits within `blob`.
pub fn parse_table(
    blob: &[u8],
    table_offset: usize,
) -> Result<heapless::Vec<RomRecord, MAX_RECORDS>, RomTableError> {
    let mut records = heapless::Vec::new();
    let mut cursor = table_offset;
    for _ in 0..MAX_RECORDS {
        let end = cursor + RECORD_SIZE;
        if end > blob.len() {
            return Err(RomTableError::TruncatedRecord);
        }
        let raw: [u8; RECORD_SIZE] = blob[cursor..end].try_into().unwrap();
        if RomRecord::is_terminator(&raw) {
            return Ok(records);
        }
        let record = RomRecord::parse(&raw)?;
        let payload_end = (record.payload_offset as u64) + (record.payload_size as u64);
        if payload_end > blob.len() as u64 {
            return Err(RomTableError::PayloadOverrunsBlob);
        }
        // heapless::Vec::push only fails past capacity, which the loop
        // bound above already prevents.
        let _ = records.push(record);
        cursor = end;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(name: &str, mapper_byte: u8, size: u32, offset: u32) -> [u8; RECORD_SIZE] {
        let mut bytes = [b' '; RECORD_SIZE];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        bytes[50] = mapper_byte;
        bytes[51..55].copy_from_slice(&size.to_le_bytes());
        bytes[55..59].copy_from_slice(&offset.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_until_terminator() {
        let mut blob = Vec::new();
        blob.extend_from_slice(&record_bytes("GAME A", 2, 0x8000, 0));
        blob.extend_from_slice(&record_bytes("GAME B", 5, 0x10000, 0x8000));
        blob.extend_from_slice(&[0xFFu8; RECORD_SIZE]);
        blob.resize(0x18000, 0);
        let records = parse_table(&blob, 0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name_str(), "GAME A");
        assert_eq!(records[0].flags.mapper_code, 2);
        assert_eq!(records[1].payload_offset, 0x8000);
    }

    #[test]
    fn scc_audio_flags_decode_from_high_bits() {
        let flags = MapperFlags::from_byte(0xC3);
        assert_eq!(flags.mapper_code, 3);
        assert!(flags.scc_audio);
        assert!(flags.scc_plus);
    }

    #[test]
    fn payload_past_blob_end_is_rejected() {
        let mut blob = Vec::new();
        blob.extend_from_slice(&record_bytes("TOO BIG", 2, 0x10000, 0));
        blob.extend_from_slice(&[0xFFu8; RECORD_SIZE]);
        let err = parse_table(&blob, 0).unwrap_err();
        assert!(matches!(err, RomTableError::PayloadOverrunsBlob));
    }

    #[test]
    fn truncated_table_without_terminator_is_rejected() {
        let blob = record_bytes("SHORT", 2, 0, 0).to_vec();
        let mut too_short = blob.clone();
        too_short.truncate(RECORD_SIZE - 1);
        let err = parse_table(&too_short, 0).unwrap_err();
        assert!(matches!(err, RomTableError::TruncatedRecord));
    }
}
