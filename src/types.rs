//! Shared identifiers and domain values used across the bar.

/// Unique number assigned to a customer by the admission loop.
pub type CustomerId = u64;
/// Index of a seat token in the pool.
pub type SeatId = usize;
/// Numeric value a kitchen tool yields for one preparation step.
///
/// Partial results combine by summation: buns + salad form the veggie
/// stack, veggie stack + patty form the burger.
pub type PrepUnits = i64;

/// A customer admitted (or waiting to be admitted) to the bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Customer {
    /// Monotonically increasing number for logging and validation.
    pub number: CustomerId,
}

impl Customer {
    /// Construct a customer with the provided number.
    pub fn new(number: CustomerId) -> Self {
        Self { number }
    }
}
