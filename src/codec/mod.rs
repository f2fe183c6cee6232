//! Numeric ↔ alphanumeric video identifier codec.
//!
//! Bilibili exposes every video under two interchangeable names: the legacy
//! numeric `aid` and the 12-character `BV` string. The mapping is a fixed
//! XOR + base-58 transform followed by two character swaps, so both
//! directions are pure and allocation-light.

use thiserror::Error;

/// Symbol table; a character's value is its index.
const ALPHABET: &[u8; 58] = b"FcwAPNKTMug3GV5Lj7EJnHpWsx4tb8haYeviqBz6rkCy12mUSDQX9RdoZf";
const BASE: u64 = 58;
const XOR_CODE: u64 = 23_442_827_791_579;
const MASK_CODE: u64 = (1 << 51) - 1;
const TOP_BIT: u64 = 1 << 51;

/// Template for encoded ids. Slots 0..=2 never change.
const TEMPLATE: &[u8; 12] = b"BV1000000000";
const FIRST_WRITABLE: usize = 3;

/// Fixed prefix shared by every encoded identifier.
pub const BV_PREFIX: &str = "BV";
/// Length of every encoded identifier.
pub const BV_LEN: usize = 12;
/// Exclusive upper bound of encodable numeric identifiers.
pub const MAX_AID: u64 = TOP_BIT;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("numeric id {0} is outside [0, 2^51)")]
    OutOfRange(u64),
    #[error("identifier must be 12 characters, got {0}")]
    InvalidLength(usize),
    #[error("identifier must start with 'BV'")]
    InvalidPrefix,
    #[error("identifier contains unknown symbol {0:?}")]
    InvalidSymbol(char),
}

/// Encode a numeric id into its `BV…` form.
///
/// Ids at or above `2^51` are rejected with [`CodecError::OutOfRange`]; bit 51
/// is the marker bit and never part of an id.
pub fn encode(aid: u64) -> CodecResult<String> {
    if aid >= MAX_AID {
        return Err(CodecError::OutOfRange(aid));
    }

    let mut bytes = *TEMPLATE;
    let mut tmp = (TOP_BIT | aid) ^ XOR_CODE;
    let mut index = BV_LEN - 1;
    while tmp > 0 && index >= FIRST_WRITABLE {
        bytes[index] = ALPHABET[(tmp % BASE) as usize];
        tmp /= BASE;
        index -= 1;
    }
    scramble(&mut bytes);

    // Every byte comes from ASCII tables above.
    Ok(bytes.iter().map(|&b| b as char).collect())
}

/// Decode a `BV…` identifier back to its numeric id.
pub fn decode(bvid: &str) -> CodecResult<u64> {
    let raw = bvid.as_bytes();
    if raw.len() != BV_LEN {
        return Err(CodecError::InvalidLength(bvid.chars().count()));
    }
    if !bvid.starts_with(BV_PREFIX) {
        return Err(CodecError::InvalidPrefix);
    }

    let mut bytes = [0u8; BV_LEN];
    bytes.copy_from_slice(raw);
    scramble(&mut bytes);

    let mut tmp: u64 = 0;
    for &symbol in &bytes[FIRST_WRITABLE..] {
        let value = symbol_value(symbol)?;
        tmp = tmp.wrapping_mul(BASE).wrapping_add(value);
    }

    Ok((tmp & MASK_CODE) ^ XOR_CODE)
}

/// Strip query/fragment noise and return the bare identifier if it decodes.
pub fn normalize(input: &str) -> Option<&str> {
    let bare = input.split(['?', '#', '/']).next().unwrap_or(input);
    decode(bare).ok().map(|_| bare)
}

// The swap pairs are disjoint, so the same call both applies and undoes it.
fn scramble(bytes: &mut [u8; BV_LEN]) {
    bytes.swap(3, 9);
    bytes.swap(4, 7);
}

fn symbol_value(symbol: u8) -> CodecResult<u64> {
    ALPHABET
        .iter()
        .position(|&candidate| candidate == symbol)
        .map(|position| position as u64)
        .ok_or(CodecError::InvalidSymbol(symbol as char))
}
