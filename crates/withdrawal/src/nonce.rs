/// L1 nonces handed out within one run.
///
/// Starts at the signer's pending nonce and moves forward only once a
/// transaction has actually been broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceCounter {
    next: u64,
}

impl NonceCounter {
    pub const fn new(start: u64) -> Self {
        Self { next: start }
    }

    /// Nonce for the next transaction.
    pub const fn current(&self) -> u64 {
        self.next
    }

    /// Mark the current nonce as used.
    pub const fn advance(&mut self) {
        self.next += 1;
    }
}
