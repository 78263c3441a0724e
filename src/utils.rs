/// Generate a compact session ID (8 hex characters) from the first 4 bytes of a UUID v4.
pub fn generate_session_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    hex::encode(&uuid.as_bytes()[..4])
}

/// Render raw channel bytes for diagnostics: printable ASCII as-is,
/// everything else as `\xNN` (with `\r`, `\n`, `\t` spelled out).
pub fn escape_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for &b in data {
        match b {
            b'\r' => out.push_str("\\r"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out
}
