//! Fixed-width base62 code generator.
//!
//! Maps a 64-bit id to a 7 character code, most significant digit first and
//! left-padded with `'0'`. Ids at or above [`KEYSPACE`] keep only their low
//! seven base62 digits; allocators are expected to stay below it.

/// The 62-symbol alphabet, in digit order.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Width of every generated code.
pub const CODE_LEN: usize = 7;

/// Number of distinct codes, `62^7`.
pub const KEYSPACE: u64 = 62u64.pow(CODE_LEN as u32);

const BASE: u64 = ALPHABET.len() as u64;

/// Encodes `id` as a fixed-width base62 code.
pub fn encode(id: u64) -> String {
    let mut digits = [ALPHABET[0]; CODE_LEN];
    let mut rest = id % KEYSPACE;
    for slot in digits.iter_mut().rev() {
        *slot = ALPHABET[(rest % BASE) as usize];
        rest /= BASE;
    }
    // every byte comes from ALPHABET, which is ASCII
    digits.iter().map(|&b| b as char).collect()
}

/// Returns `true` if `c` belongs to [`ALPHABET`].
pub fn is_symbol(c: char) -> bool {
    c.is_ascii_alphanumeric()
}
