//! Proof-of-work puzzle
//!
//! A candidate proof `p'` is valid against the previous proof `p` when the
//! double SHA-256 of the decimal string `"{p}{p'}"` ends in four zero hex
//! digits. The check is on the trailing digits, not the leading ones.

use crate::crypto::double_sha256;

/// Hex suffix a valid proof's digest must end with.
pub const PROOF_SUFFIX: &str = "0000";

/// Check a candidate proof against the previous block's proof.
pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", last_proof, proof);
    let digest = hex::encode(double_sha256(guess.as_bytes()));
    digest.ends_with(PROOF_SUFFIX)
}

/// Find the smallest proof that satisfies [`valid_proof`] for `last_proof`.
///
/// The search is unbounded and has no cancellation point. Callers must not
/// hold the ledger lock while it runs.
pub fn proof_of_work(last_proof: u64) -> u64 {
    let mut proof = 0;
    while !valid_proof(last_proof, proof) {
        proof += 1;
    }
    proof
}
