//! Best-effort decoding of text embedded in reserved byte regions.
//!
//! The regions have no published layout. Empirically they hold a run of
//! null-terminated UTF-16 strings separated by zero padding.

/// Decode the null-terminated UTF-16LE strings in `buffer`, in order.
///
/// Zero units seen before a string starts are padding and produce nothing.
/// A zero unit after at least one non-zero unit ends the current string.
/// Text still open when the buffer runs out has no terminator and is
/// dropped, as is an odd trailing byte.
pub fn extract_embedded_strings(buffer: &[u8]) -> Vec<String> {
    let mut strings = Vec::new();
    let mut current: Vec<u16> = Vec::new();
    for unit in buffer
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    {
        match unit {
            0 if current.is_empty() => continue,
            0 => {
                strings.push(String::from_utf16_lossy(&current));
                current.clear();
            }
            _ => current.push(unit),
        }
    }
    strings
}
