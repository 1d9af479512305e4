/// Sequential uid generator for render nodes within one editing session.
///
/// Uids are unique for the session lifetime, never reused, and never
/// persisted. The generator is owned by the document and threaded
/// explicitly; there is no process-wide counter.
#[derive(Debug, Clone)]
pub struct UidGenerator {
    seed: String, // Session identifier
    count: u32,   // Sequential counter
}

impl UidGenerator {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential uid
    pub fn new_uid(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    /// Get session seed
    pub fn seed(&self) -> &str {
        &self.seed
    }
}
