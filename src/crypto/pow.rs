//! Proof of Work solver for DeepSeek challenges.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::hash::deepseek_hash_v1;
use crate::error::{DskError, Result};
use crate::models::{AnswerPayload, Challenge, ChallengeAnswer};

/// The only algorithm the verifier currently issues.
pub const ALGORITHM: &str = "DeepSeekHashV1";

/// Refuse challenges whose search space is larger than this.
///
/// Real challenges sit around 144000 candidates.
pub const DEFAULT_MAX_DIFFICULTY: u64 = 10_000_000;

/// Brute-force solver for [`Challenge`]s.
#[derive(Debug, Clone, Copy)]
pub struct PowSolver {
    max_difficulty: u64,
}

impl Default for PowSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PowSolver {
    pub fn new() -> Self {
        Self {
            max_difficulty: DEFAULT_MAX_DIFFICULTY,
        }
    }

    /// Create a solver with a custom upper bound on `difficulty`.
    pub fn with_max_difficulty(max_difficulty: u64) -> Self {
        Self { max_difficulty }
    }

    /// Solve a challenge and encode the answer for the `x-ds-pow-response` header.
    ///
    /// Searches nonces `0..difficulty` for one where
    /// `DeepSeekHashV1("{salt}_{expire_at}_{nonce}")` equals the challenge digest.
    /// This blocks for the duration of the search.
    pub fn solve(&self, challenge: &Challenge) -> Result<ChallengeAnswer> {
        let target = self.check(challenge)?;
        let nonce = find_nonce(challenge, &target)?;
        encode_answer(challenge, nonce)
    }

    /// Validate the descriptor before spending any time on it.
    fn check(&self, challenge: &Challenge) -> Result<[u8; 32]> {
        if challenge.algorithm != ALGORITHM {
            return Err(DskError::UnsupportedAlgorithm(challenge.algorithm.clone()));
        }
        if challenge.difficulty > self.max_difficulty {
            return Err(DskError::MalformedChallenge(format!(
                "difficulty {} exceeds limit {}",
                challenge.difficulty, self.max_difficulty
            )));
        }
        decode_target(&challenge.challenge)
    }
}

fn decode_target(hex_digest: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(hex_digest)
        .map_err(|e| DskError::MalformedChallenge(format!("challenge is not hex: {}", e)))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        DskError::MalformedChallenge(format!(
            "challenge digest has {} bytes, expected 32",
            bytes.len()
        ))
    })
}

fn candidate_prefix(challenge: &Challenge) -> String {
    format!("{}_{}_", challenge.salt, challenge.expire_at)
}

fn find_nonce(challenge: &Challenge, target: &[u8; 32]) -> Result<u64> {
    let prefix = candidate_prefix(challenge);
    let mut input = Vec::with_capacity(prefix.len() + 20);

    for nonce in 0..challenge.difficulty {
        input.clear();
        input.extend_from_slice(prefix.as_bytes());
        input.extend_from_slice(nonce.to_string().as_bytes());

        if deepseek_hash_v1(&input) == *target {
            tracing::debug!(nonce, difficulty = challenge.difficulty, "Solved PoW challenge");
            return Ok(nonce);
        }
    }

    Err(DskError::PowExhausted {
        iterations: challenge.difficulty,
    })
}

fn encode_answer(challenge: &Challenge, nonce: u64) -> Result<ChallengeAnswer> {
    let payload = AnswerPayload {
        algorithm: challenge.algorithm.clone(),
        challenge: challenge.challenge.clone(),
        salt: challenge.salt.clone(),
        answer: nonce,
        signature: challenge.signature.clone(),
        target_path: challenge.target_path.clone(),
    };
    let json = serde_json::to_vec(&payload)
        .map_err(|e| DskError::MalformedChallenge(format!("cannot encode answer: {}", e)))?;
    Ok(ChallengeAnswer(STANDARD.encode(json)))
}

/// Check an answer token against the challenge it claims to solve.
pub fn verify(challenge: &Challenge, answer: &ChallengeAnswer) -> bool {
    let Ok(json) = STANDARD.decode(answer.as_str()) else {
        return false;
    };
    let Ok(payload) = serde_json::from_slice::<AnswerPayload>(&json) else {
        return false;
    };
    let Ok(target) = decode_target(&challenge.challenge) else {
        return false;
    };

    let echoes_challenge = payload.algorithm == challenge.algorithm
        && payload.challenge == challenge.challenge
        && payload.salt == challenge.salt
        && payload.signature == challenge.signature
        && payload.target_path == challenge.target_path;
    if !echoes_challenge || payload.answer >= challenge.difficulty {
        return false;
    }

    let candidate = format!("{}{}", candidate_prefix(challenge), payload.answer);
    deepseek_hash_v1(candidate.as_bytes()) == target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge_for(nonce: u64, difficulty: u64) -> Challenge {
        let salt = "0f3c2a9d1e8b7c65";
        let expire_at = 1_738_000_000_000_i64;
        let digest = deepseek_hash_v1(format!("{}_{}_{}", salt, expire_at, nonce).as_bytes());
        Challenge {
            algorithm: ALGORITHM.to_string(),
            challenge: hex::encode(digest),
            salt: salt.to_string(),
            signature: "c0ffee".to_string(),
            difficulty,
            expire_at,
            expire_after: Some(300_000),
            target_path: "/api/v0/chat/completion".to_string(),
        }
    }

    #[test]
    fn test_solve_finds_nonce() {
        let challenge = challenge_for(1234, 5000);
        let answer = PowSolver::new().solve(&challenge).unwrap();

        assert!(verify(&challenge, &answer));

        let json = STANDARD.decode(answer.as_str()).unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(payload["answer"], 1234);
        assert_eq!(payload["algorithm"], ALGORITHM);
        assert_eq!(payload["signature"], "c0ffee");
        assert_eq!(payload["target_path"], "/api/v0/chat/completion");
    }

    #[test]
    fn test_solve_is_deterministic() {
        let challenge = challenge_for(0, 10);
        let solver = PowSolver::new();
        assert_eq!(
            solver.solve(&challenge).unwrap(),
            solver.solve(&challenge).unwrap()
        );
    }

    #[test]
    fn test_exhausted_search() {
        // The winning nonce lies outside 0..difficulty
        let challenge = challenge_for(500, 100);
        assert!(matches!(
            PowSolver::new().solve(&challenge),
            Err(DskError::PowExhausted { iterations: 100 })
        ));
    }

    #[test]
    fn test_rejects_bad_descriptors() {
        let mut challenge = challenge_for(1, 10);
        challenge.algorithm = "SHA256".into();
        assert!(matches!(
            PowSolver::new().solve(&challenge),
            Err(DskError::UnsupportedAlgorithm(a)) if a == "SHA256"
        ));

        let challenge = challenge_for(1, 10);
        assert!(matches!(
            PowSolver::with_max_difficulty(5).solve(&challenge),
            Err(DskError::MalformedChallenge(_))
        ));

        let mut challenge = challenge_for(1, 10);
        challenge.challenge = "zz".into();
        assert!(matches!(
            PowSolver::new().solve(&challenge),
            Err(DskError::MalformedChallenge(_))
        ));

        challenge.challenge = "abcd".into();
        assert!(matches!(
            PowSolver::new().solve(&challenge),
            Err(DskError::MalformedChallenge(_))
        ));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let challenge = challenge_for(42, 100);
        let answer = PowSolver::new().solve(&challenge).unwrap();

        let mut other = challenge.clone();
        other.signature = "deadbeef".into();
        assert!(!verify(&other, &answer));

        let forged = encode_answer(&challenge, 43).unwrap();
        assert!(!verify(&challenge, &forged));

        assert!(!verify(&challenge, &ChallengeAnswer("not base64!".into())));
    }
}
