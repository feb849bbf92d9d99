use crate::domain::ports::CredentialHasher;

/// bcrypt with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    #[must_use]
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match bcrypt::verify(plaintext, digest) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!(error = %e, "Stored digest could not be verified");
                false
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn digest_verifies_only_the_original_password() {
        let hasher = BcryptHasher::new(4);
        let digest = hasher.hash("correct horse").unwrap();

        assert_ne!(digest, "correct horse");
        assert!(hasher.verify("correct horse", &digest));
        assert!(!hasher.verify("battery staple", &digest));
    }

    #[test]
    fn malformed_digest_is_a_mismatch() {
        let hasher = BcryptHasher::new(4);
        assert!(!hasher.verify("anything", "not-a-bcrypt-digest"));
    }

    #[test]
    fn invalid_cost_is_an_error() {
        assert!(BcryptHasher::new(2).hash("pw").is_err());
    }
}
