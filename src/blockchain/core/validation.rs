use super::chain::Block;
use crate::error::ChainError;
use crate::miner::valid_proof;

/// Audit a chain's linkage and proofs.
///
/// Reports the first block whose index does not follow its predecessor's,
/// whose parent hash is not the canonical hash of its predecessor, or whose
/// proof does not solve the puzzle for its predecessor's proof. The genesis
/// block is accepted as is.
pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainError> {
    let genesis = blocks
        .first()
        .ok_or_else(|| ChainError::InvalidBlock("chain has no genesis block".to_string()))?;
    if genesis.index != 1 {
        return Err(ChainError::InvalidBlock(format!(
            "genesis block has index {}, expected 1",
            genesis.index
        )));
    }

    for pair in blocks.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);

        if block.index != previous.index + 1 {
            return Err(ChainError::InvalidBlock(format!(
                "block {} follows block {}",
                block.index, previous.index
            )));
        }

        let expected = previous.hash()?;
        if block.parent_hash != expected {
            return Err(ChainError::InvalidBlock(format!(
                "block {} has parent hash {}, expected {}",
                block.index, block.parent_hash, expected
            )));
        }

        if !valid_proof(previous.proof, block.proof) {
            return Err(ChainError::InvalidBlock(format!(
                "block {} has proof {} which does not solve the puzzle for {}",
                block.index, block.proof, previous.proof
            )));
        }
    }

    Ok(())
}
