//! Room code generation strategies.

use rand::Rng;
use rand::prelude::IndexedRandom;

use crate::config::room::{LEGACY_ROOM_CODE, ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH};
use super::types::RoomCode;

/// Produces candidate room codes. Uniqueness is checked by the store, not here.
pub trait RoomCodeGenerator: Send {
    fn next(&mut self) -> RoomCode;
}

/// Random codes drawn from a fixed alphabet.
pub struct RandomCodeGenerator {
    alphabet: Vec<char>,
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(alphabet: &str, length: usize) -> Self {
        let alphabet: Vec<char> = alphabet.chars().collect();
        Self { alphabet, length }
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH)
    }
}

impl RoomCodeGenerator for RandomCodeGenerator {
    fn next(&mut self) -> RoomCode {
        let mut rng = rand::rng();
        if self.alphabet.is_empty() {
            // Degenerate config: fall back to digits.
            return (0..self.length)
                .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
                .collect();
        }
        (0..self.length)
            .filter_map(|_| self.alphabet.choose(&mut rng).copied())
            .collect()
    }
}

/// Always the same code, as legacy clients expect. Only one room can exist at a time.
pub struct FixedCodeGenerator {
    code: RoomCode,
}

impl FixedCodeGenerator {
    pub fn new(code: impl Into<RoomCode>) -> Self {
        Self { code: code.into() }
    }
}

impl Default for FixedCodeGenerator {
    fn default() -> Self {
        Self::new(LEGACY_ROOM_CODE)
    }
}

impl RoomCodeGenerator for FixedCodeGenerator {
    fn next(&mut self) -> RoomCode {
        self.code.clone()
    }
}
