use crate::ole::OleError;
use zerocopy::{FromBytes, LE, U16, U32};

/// Read a little-endian u16 from a byte slice at the given offset.
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16, OleError> {
    if offset + 2 > data.len() {
        return Err(OleError::InvalidData("Not enough data for u16".to_string()));
    }
    U16::<LE>::read_from_bytes(&data[offset..offset + 2])
        .map(|v| v.get())
        .map_err(|_| OleError::InvalidData("Failed to read u16".to_string()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, OleError> {
    if offset + 4 > data.len() {
        return Err(OleError::InvalidData("Not enough data for u32".to_string()));
    }
    U32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| OleError::InvalidData("Failed to read u32".to_string()))
}

/// Parse a whole sector as a table of little-endian u32 sector ids.
pub fn read_u32_table(data: &[u8]) -> Vec<u32> {
    data.chunks_exact(4)
        .map(|chunk| {
            U32::<LE>::read_from_bytes(chunk)
                .map(|v| v.get())
                .unwrap_or(0)
        })
        .collect()
}
