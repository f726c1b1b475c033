//! Proof-of-work primitives for the DeepSeek challenge endpoint.

mod hash;
mod pow;

pub use hash::deepseek_hash_v1;
pub use pow::{verify, PowSolver, ALGORITHM, DEFAULT_MAX_DIFFICULTY};
