//! Constraint-file digests (versioned).
//!
//! Relaxation indices are only meaningful against the exact constraint text
//! they were generated from, so tooling reports a digest of that text next to
//! its output.
//!
//! - algorithm: **FNV-1a 64-bit**
//! - input: the UTF-8 bytes of the constraint file as-read
//! - output: `"fnv1a64:<16 lowercase hex digits>"`
//!
//! This is not a security primitive.

/// Prefix used in serialized digests.
pub const DC_DIGEST_V1_PREFIX: &str = "fnv1a64:";

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001b3;

pub fn dc_digest_v1(text: &str) -> String {
    let hash = text.bytes().fold(FNV_OFFSET_BASIS, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    });
    format!("{DC_DIGEST_V1_PREFIX}{hash:016x}")
}
