//! `DeepSeekHashV1` digest.
//!
//! SHA3-256 sponge construction where the permutation is Keccak-p[1600, 23]
//! instead of the full 24-round Keccak-f[1600].

/// SHA3-256 rate in bytes.
const RATE: usize = 136;

/// Rounds used by the DeepSeek verifier.
const DEEPSEEK_ROUNDS: usize = 23;

/// Rounds of standard Keccak-f[1600].
#[cfg(test)]
const KECCAK_F_ROUNDS: usize = 24;

/// Compute the `DeepSeekHashV1` digest of `input`.
pub fn deepseek_hash_v1(input: &[u8]) -> [u8; 32] {
    sponge_256(input, DEEPSEEK_ROUNDS)
}

/// SHA3-256 padding and squeeze with a configurable round count.
///
/// `keccak::p1600` runs the *last* `rounds` rounds of Keccak-f, so 23 rounds
/// skips round 0.
fn sponge_256(input: &[u8], rounds: usize) -> [u8; 32] {
    let mut state = [0u64; 25];

    let mut blocks = input.chunks_exact(RATE);
    for block in &mut blocks {
        absorb(&mut state, block);
        keccak::p1600(&mut state, rounds);
    }

    let rest = blocks.remainder();
    let mut last = [0u8; RATE];
    last[..rest.len()].copy_from_slice(rest);
    last[rest.len()] ^= 0x06;
    last[RATE - 1] ^= 0x80;
    absorb(&mut state, &last);
    keccak::p1600(&mut state, rounds);

    let mut out = [0u8; 32];
    for (chunk, lane) in out.chunks_exact_mut(8).zip(state.iter()) {
        chunk.copy_from_slice(&lane.to_le_bytes());
    }
    out
}

fn absorb(state: &mut [u64; 25], block: &[u8]) {
    for (lane, bytes) in state.iter_mut().zip(block.chunks_exact(8)) {
        let mut word = [0u8; 8];
        word.copy_from_slice(bytes);
        *lane ^= u64::from_le_bytes(word);
    }
}
