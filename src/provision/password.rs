//! Random initial passwords for provisioned accounts.

use rand::Rng;
use rand::rngs::OsRng;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

#[derive(Debug, Clone, Copy)]
pub struct PasswordGenerator {
    length: usize,
}

impl PasswordGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn generate(&self) -> String {
        (0..self.length)
            .map(|_| CHARSET[OsRng.gen_range(0..CHARSET.len())] as char)
            .collect()
    }
}

impl Default for PasswordGenerator {
    fn default() -> Self {
        Self::new(12)
    }
}
