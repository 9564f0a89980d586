/// Pure phase transition function.
pub mod clock;
/// Per-frame driver over the sentence sequence.
pub mod driver;
