//! Closed-form analytic pricing engines.

pub mod barone_adesi_whaley;
pub mod black_scholes;

pub use barone_adesi_whaley::{
    BaroneAdesiWhaleyEngine, ExerciseBoundary, baw_american_call, baw_american_put, baw_price,
    critical_exercise_price,
};
pub use black_scholes::{BlackScholesEngine, black_scholes, bs_greeks, bs_price};
