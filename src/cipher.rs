use base64::{engine::general_purpose::STANDARD, Engine};
use rand::seq::SliceRandom;

use crate::{Error, Result};

pub type Table = [u8; 256];

/// Byte substitution cipher.
///
/// The encode table is a permutation of `0..=255` taken from the password,
/// the decode table is its inverse. This is obfuscation only, there is no
/// key schedule and no nonce.
#[derive(Clone)]
pub struct Cipher {
    encode: Table,
    decode: Table,
}

impl Cipher {
    /// Build from a base64 password that decodes to 256 distinct bytes.
    pub fn new(password: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(password.trim())
            .map_err(|e| Error::InvalidPassword(format!("bad base64: {e}")))?;
        let table: Table = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidPassword(format!("{} bytes, need 256", bytes.len())))?;
        Self::from_table(table)
    }

    pub fn from_table(encode: Table) -> Result<Self> {
        let mut decode = [0u8; 256];
        let mut seen = [false; 256];

        for (plain, &cipher) in encode.iter().enumerate() {
            if seen[cipher as usize] {
                return Err(Error::InvalidPassword(format!(
                    "byte {cipher:#04x} appears more than once"
                )));
            }
            seen[cipher as usize] = true;
            decode[cipher as usize] = plain as u8;
        }

        Ok(Self { encode, decode })
    }

    pub fn encrypt(&self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.encode[*b as usize];
        }
    }

    pub fn decrypt(&self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.decode[*b as usize];
        }
    }
}

/// A freshly shuffled table, base64 encoded, usable as a password.
pub fn random_password() -> String {
    let mut table: Vec<u8> = (0..=255).collect();
    table.shuffle(&mut rand::thread_rng());
    STANDARD.encode(table)
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cipher { .. }")
    }
}
