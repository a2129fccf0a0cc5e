// Cache key derivation
// Author: kelexine (https://github.com/kelexine)

use sha2::{Digest, Sha256};

/// Namespace prefix shared by every response cache key.
pub const CACHE_KEY_PREFIX: &str = "gemini:response:";

/// Derive the store key for a prompt.
///
/// The digest covers the raw UTF-8 bytes of the prompt: no case folding and no
/// whitespace normalization, so `"Hi"` and `"hi "` are cached separately.
/// Any instance computing the key for the same prompt gets the same key.
pub fn compute_key(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    format!("{}{:x}", CACHE_KEY_PREFIX, digest)
}
