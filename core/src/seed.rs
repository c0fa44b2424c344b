use sha2::{Digest, Sha256};

use crate::WaveNumber;

/// Stream label for the allocator's spend loop.
pub const RNG_STREAM_ALLOCATION: &str = "allocation";
/// Stream label for the allocator's pacing pass.
pub const RNG_STREAM_PACING: &str = "pacing";
/// Stream label for the special event scheduler.
pub const RNG_STREAM_EVENTS: &str = "events";

/// Derives an independent RNG seed for one wave and one labeled stream.
///
/// Every random decision of a wave is drawn from a stream derived here, so a
/// wave's outcome depends only on the global seed, the wave number and the
/// label, never on how many values earlier waves consumed.
#[must_use]
pub fn derive_wave_seed(global_seed: u64, wave: WaveNumber, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(wave.get().to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(bytes)
}
