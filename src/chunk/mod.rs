//! Splitting a payload into bounded fragments and joining it back.

use std::num::NonZeroUsize;

/// Default fragment length. The bucket rejects values over 64KB, so this
/// leaves room for request overhead.
pub const DEFAULT_CHUNK_SIZE: usize = 55_000;

/// Split `s` into fragments of at most `max_chunk_size` characters.
///
/// Every fragment but the last is exactly `max_chunk_size` long. An empty
/// input yields no fragments.
pub fn split(s: &str, max_chunk_size: NonZeroUsize) -> Vec<String> {
    let max = max_chunk_size.get();
    let mut chunks = Vec::with_capacity(s.len() / max + 1);
    let mut current = String::new();
    let mut count = 0;

    for ch in s.chars() {
        current.push(ch);
        count += 1;
        if count == max {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Concatenate fragments in order.
pub fn join<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks.iter().map(AsRef::as_ref).collect()
}
