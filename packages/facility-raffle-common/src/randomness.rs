use sha2::{Digest, Sha256};

/// Source of uniform integers for the draw engine.
///
/// Implementations must return a value in `[0, bound)`. `bound` is always
/// non-zero when called by the engine.
pub trait RandomSource {
    fn next_below(&mut self, bound: u128) -> u128;
}

/// Deterministic random source seeded with 32 bytes.
///
/// Value `n` is `u128_be(sha256(seed || n_be)[0..16]) % bound`, so a revealed
/// seed reproduces the exact selection sequence.
#[derive(Clone, Debug)]
pub struct HashChainRandomness {
    seed: [u8; 32],
    counter: u64,
}

impl HashChainRandomness {
    pub fn new(seed: [u8; 32]) -> Self {
        Self { seed, counter: 0 }
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> u64 {
        self.counter
    }
}

impl RandomSource for HashChainRandomness {
    fn next_below(&mut self, bound: u128) -> u128 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(self.counter.to_be_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        self.counter += 1;

        let mut raw = [0u8; 16];
        raw.copy_from_slice(&digest[0..16]);
        u128::from_be_bytes(raw) % bound.max(1)
    }
}

/// `sha256(secret)`, hex-encoded. This is the value an operator commits to.
pub fn commit_hash(secret: &[u8]) -> String {
    let digest: [u8; 32] = Sha256::digest(secret).into();
    hex::encode(digest)
}

/// XOR two 32-byte values.
pub fn mix_randomness(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
        *o = x ^ y;
    }
    out
}

/// Final randomness for a draw:
/// `sha256(secret) XOR sha256(draw_id_be || committed_at_nanos_be)`.
pub fn draw_randomness(secret: &[u8], draw_id: u64, committed_at_nanos: u64) -> [u8; 32] {
    let secret_hash: [u8; 32] = Sha256::digest(secret).into();

    let mut hasher = Sha256::new();
    hasher.update(draw_id.to_be_bytes());
    hasher.update(committed_at_nanos.to_be_bytes());
    let context: [u8; 32] = hasher.finalize().into();

    mix_randomness(&secret_hash, &context)
}
