use sha3::{Digest, Sha3_256};

/// A state handed out to clients that must come back unmodified.
pub trait ProtectedState {
    fn compute_seal_info(&self) -> String;

    fn verify_seal(&self, seal: &str) -> bool {
        verify(self.compute_seal_info(), seal)
    }
}

pub fn seal(s: String) -> String {
    let payload = format!("a modified state no longer witnesses (un)satisfiability|{s}");
    let mut hasher = Sha3_256::new();
    hasher.update(payload);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect()
}

pub fn verify(s: String, hash: &str) -> bool {
    seal(s) == hash
}
