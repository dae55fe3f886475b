//! Text compression for transport.
//!
//! LZ-string's base64 variant, the same encoding the web client writes under
//! manifest `v: 5`, so payloads pushed from either side read on the other.

/// Compress `text` into a base64 string.
pub fn compress(text: &str) -> String {
    lz_str::compress_to_base64(text)
}

/// Reverse [`compress`].
///
/// Returns `None` for empty, corrupt or non-UTF-16 input. Callers treat `None`
/// as "no usable data", which is different from an empty text.
pub fn decompress(transport: &str) -> Option<String> {
    let transport = transport.trim();
    if transport.is_empty() {
        return None;
    }

    let units = lz_str::decompress_from_base64(transport)?;
    match String::from_utf16(&units) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::debug!("Decompressed payload is not valid text: {}", e);
            None
        }
    }
}
