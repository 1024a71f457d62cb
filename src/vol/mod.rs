//! Volatility tools: single-point implied-volatility inversion.

pub mod implied;

pub use implied::{
    IV_FLOOR, ImpliedVolConfig, ImpliedVolResult, ImpliedVolSolver, SolverPhase,
    implied_volatility,
};
