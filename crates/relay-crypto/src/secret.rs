use rand::RngCore;
use relay_core::types::{Secret, SecretAlgo};

use crate::hash::hash_preimage;

/// Generates a fresh random preimage and its committed hash under `algo`.
/// Per I5, the preimage is returned to the caller but must not be persisted
/// until it has actually been observed on-chain.
pub fn generate_secret(algo: SecretAlgo) -> (Secret, [u8; 32]) {
    let mut preimage = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut preimage);
    let hash = hash_preimage(algo, &preimage);
    (
        Secret {
            hash,
            preimage: None,
            algo,
        },
        preimage,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_preimage_hashes_to_its_own_hash() {
        let (secret, preimage) = generate_secret(SecretAlgo::Sha256);
        assert!(crate::hash::verify_preimage(secret.algo, &preimage, &secret.hash));
        assert!(secret.preimage.is_none());
    }
}
