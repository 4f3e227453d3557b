//! Command content codes.

use sha2::{Digest, Sha256};

/// The fields a content code is derived from.
#[derive(Debug, Clone, Copy)]
pub struct CodeInput<'a> {
    pub pccode: Option<&'a str>,
    pub prog: &'a str,
    pub rwd: &'a str,
    pub line: &'a str,
}

/// Derives the content code that identifies a command across builds.
pub trait ContentCoder: Send + Sync {
    fn code(&self, input: &CodeInput<'_>) -> String;
}

/// SHA-256 over the parent code, program, working directory and command
/// line, as lowercase hex.
#[derive(Debug, Default, Clone, Copy)]
pub struct DigestCoder;

impl ContentCoder for DigestCoder {
    fn code(&self, input: &CodeInput<'_>) -> String {
        let mut hasher = Sha256::new();
        for field in [input.pccode.unwrap_or(""), input.prog, input.rwd, input.line] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}
