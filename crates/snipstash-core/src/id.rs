//! Snippet ID generation
//!
//! IDs are 128 random bits (UUID v4) rendered in base58, which has no
//! characters that need escaping in URLs or JSON.

use uuid::Uuid;

/// Generate a new random snippet ID
pub fn generate_id() -> String {
    bs58::encode(Uuid::new_v4().as_bytes()).into_string()
}
