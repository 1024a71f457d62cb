//! Tree-based pricing engines.

pub mod binomial;
pub mod trinomial;

pub use binomial::{BinomialTreeEngine, binomial_price};
pub use trinomial::{
    TrinomialProbabilities, TrinomialTreeEngine, trinomial_price, trinomial_probabilities,
};
