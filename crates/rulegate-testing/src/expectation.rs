/// Define how many times a double should be invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Times {
    Once,
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
    #[default]
    Any,
}

impl Times {
    /// Whether `count` invocations satisfy the expectation.
    pub fn matches(self, count: usize) -> bool {
        match self {
            Times::Once => count == 1,
            Times::Exactly(n) => count == n,
            Times::AtLeast(n) => count >= n,
            Times::AtMost(n) => count <= n,
            Times::Any => true,
        }
    }

    /// Panic with a readable message unless `count` satisfies the expectation.
    pub fn verify(self, what: &str, count: usize) {
        assert!(
            self.matches(count),
            "{what} expected {self}, got {count} call(s)"
        );
    }
}

impl std::fmt::Display for Times {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Times::Once => write!(f, "1 call"),
            Times::Exactly(n) => write!(f, "{n} call(s)"),
            Times::AtLeast(n) => write!(f, "at least {n} call(s)"),
            Times::AtMost(n) => write!(f, "at most {n} call(s)"),
            Times::Any => write!(f, "any number of calls"),
        }
    }
}
