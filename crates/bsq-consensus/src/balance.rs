/// Running token balance of the transaction under validation.
///
/// Scratch state only: created from the input sum, drained by output
/// assignment, discarded after the pass. The sign is what matters, so
/// `subtract` never asserts a non-negative result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BsqInputBalance {
    value: i64,
}

impl BsqInputBalance {
    pub fn new(value: i64) -> Self {
        Self { value }
    }

    pub fn add(&mut self, amount: i64) {
        self.value += amount;
    }

    pub fn subtract(&mut self, amount: i64) {
        self.value -= amount;
    }

    pub fn is_positive(&self) -> bool {
        self.value > 0
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}
