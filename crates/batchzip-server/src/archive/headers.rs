//! In-place edits of encoded zip headers.
//!
//! The encoder only flags names that are not pure ASCII as UTF-8. Every entry
//! of an archive is flagged here instead, on the bytes on their way to the
//! sink: the local header right after it is encoded, and the central
//! directory once the trailer is written.

const LOCAL_HEADER: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
const CENTRAL_HEADER: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];
const END_OF_CENTRAL_DIRECTORY: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];
const ZIP64_LOCATOR: [u8; 4] = [0x50, 0x4b, 0x06, 0x07];
const ZIP64_END_OF_CENTRAL_DIRECTORY: [u8; 4] = [0x50, 0x4b, 0x06, 0x06];

const LOCAL_HEADER_LEN: usize = 30;
const CENTRAL_HEADER_LEN: usize = 46;
const END_OF_CENTRAL_DIRECTORY_LEN: usize = 22;
const ZIP64_LOCATOR_LEN: usize = 20;

/// Bit 11 of the general purpose flags, in the high byte.
const UTF8_FLAG_HIGH_BYTE: u8 = 0x08;

fn u16_at(bytes: &[u8], at: usize) -> Option<usize> {
    let field = bytes.get(at..at + 2)?;
    Some(usize::from(u16::from_le_bytes([field[0], field[1]])))
}

fn u32_at(bytes: &[u8], at: usize) -> Option<u64> {
    let field: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
    Some(u64::from(u32::from_le_bytes(field)))
}

fn u64_at(bytes: &[u8], at: usize) -> Option<u64> {
    let field: [u8; 8] = bytes.get(at..at + 8)?.try_into().ok()?;
    Some(u64::from_le_bytes(field))
}

fn has_signature(bytes: &[u8], at: usize, signature: [u8; 4]) -> bool {
    bytes.get(at..at + 4) == Some(signature.as_slice())
}

/// Flags the local header for `name` that ends `chunk`.
///
/// `chunk` is the encoder output of starting an entry, so the header is its
/// suffix, possibly preceded by the tail of the previous entry. Returns
/// whether the header was found.
pub(super) fn flag_local_header(chunk: &mut [u8], name: &[u8]) -> bool {
    let Some(last) = chunk.len().checked_sub(LOCAL_HEADER_LEN + name.len()) else {
        return false;
    };

    for at in (0..=last).rev() {
        if !has_signature(chunk, at, LOCAL_HEADER) {
            continue;
        }

        let (Some(name_len), Some(extra_len)) = (u16_at(chunk, at + 26), u16_at(chunk, at + 28))
        else {
            continue;
        };

        let name_start = at + LOCAL_HEADER_LEN;
        if name_len == name.len()
            && name_start + name_len + extra_len == chunk.len()
            && &chunk[name_start..name_start + name_len] == name
        {
            chunk[at + 7] |= UTF8_FLAG_HIGH_BYTE;
            return true;
        }
    }

    false
}

/// Flags every central directory header in the archive trailer.
///
/// `trailer_offset` is the archive offset of the first byte of `trailer`.
/// Returns the number of headers flagged, or `None` when the directory
/// could not be located.
pub(super) fn flag_central_directory(trailer: &mut [u8], trailer_offset: u64) -> Option<usize> {
    let end = find_end_of_central_directory(trailer)?;
    let (size, offset) = central_directory_bounds(trailer, end)?;

    let start = usize::try_from(offset.checked_sub(trailer_offset)?).ok()?;
    let stop = start.checked_add(usize::try_from(size).ok()?)?;
    if stop > trailer.len() {
        return None;
    }

    let mut at = start;
    let mut flagged = 0;
    while at + CENTRAL_HEADER_LEN <= stop && has_signature(trailer, at, CENTRAL_HEADER) {
        trailer[at + 9] |= UTF8_FLAG_HIGH_BYTE;
        flagged += 1;

        let variable = u16_at(trailer, at + 28)? + u16_at(trailer, at + 30)? + u16_at(trailer, at + 32)?;
        at += CENTRAL_HEADER_LEN + variable;
    }

    Some(flagged)
}

fn find_end_of_central_directory(trailer: &[u8]) -> Option<usize> {
    let last = trailer.len().checked_sub(END_OF_CENTRAL_DIRECTORY_LEN)?;
    (0..=last).rev().find(|&at| {
        has_signature(trailer, at, END_OF_CENTRAL_DIRECTORY)
            && u16_at(trailer, at + 20)
                .is_some_and(|comment| at + END_OF_CENTRAL_DIRECTORY_LEN + comment == trailer.len())
    })
}

/// Size and archive offset of the central directory, read from the zip64
/// record when the classic fields are saturated.
fn central_directory_bounds(trailer: &[u8], end: usize) -> Option<(u64, u64)> {
    let size = u32_at(trailer, end + 12)?;
    let offset = u32_at(trailer, end + 16)?;
    if size != u64::from(u32::MAX) && offset != u64::from(u32::MAX) {
        return Some((size, offset));
    }

    let locator = end.checked_sub(ZIP64_LOCATOR_LEN)?;
    if !has_signature(trailer, locator, ZIP64_LOCATOR) {
        return None;
    }

    // The zip64 record sits between the central directory and its locator.
    let record_offset = u64_at(trailer, locator + 8)?;
    let record = (0..locator)
        .rev()
        .find(|&at| has_signature(trailer, at, ZIP64_END_OF_CENTRAL_DIRECTORY))?;
    let size = u64_at(trailer, record + 40)?;
    let offset = u64_at(trailer, record + 48)?;

    (offset + size == record_offset).then_some((size, offset))
}
