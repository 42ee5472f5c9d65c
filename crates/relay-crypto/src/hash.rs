use relay_core::types::SecretAlgo;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// Hashes `preimage` under `algo` and returns the 32-byte digest.
pub fn hash_preimage(algo: SecretAlgo, preimage: &[u8; 32]) -> [u8; 32] {
    match algo {
        SecretAlgo::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(preimage);
            hasher.finalize().into()
        }
        SecretAlgo::Keccak256 => {
            let mut hasher = Keccak256::new();
            hasher.update(preimage);
            hasher.finalize().into()
        }
    }
}

/// I1/I5: a preimage is valid for a hash iff `algo(preimage) == hash`.
pub fn verify_preimage(algo: SecretAlgo, preimage: &[u8; 32], hash: &[u8; 32]) -> bool {
    &hash_preimage(algo, preimage) == hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_preimage_round_trip() {
        let preimage = [0x11u8; 32];
        let hash = hash_preimage(SecretAlgo::Sha256, &preimage);
        assert!(verify_preimage(SecretAlgo::Sha256, &preimage, &hash));
    }

    #[test]
    fn keccak256_preimage_round_trip() {
        let preimage = [0x22u8; 32];
        let hash = hash_preimage(SecretAlgo::Keccak256, &preimage);
        assert!(verify_preimage(SecretAlgo::Keccak256, &preimage, &hash));
    }

    #[test]
    fn wrong_preimage_rejected() {
        let preimage = [0x11u8; 32];
        let other = [0x99u8; 32];
        let hash = hash_preimage(SecretAlgo::Sha256, &preimage);
        assert!(!verify_preimage(SecretAlgo::Sha256, &other, &hash));
    }

    #[test]
    fn sha256_and_keccak256_diverge_on_same_input() {
        let preimage = [0x33u8; 32];
        let a = hash_preimage(SecretAlgo::Sha256, &preimage);
        let b = hash_preimage(SecretAlgo::Keccak256, &preimage);
        assert_ne!(a, b);
    }
}
