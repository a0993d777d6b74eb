pub mod anneal;
pub mod bound;
pub mod config;
pub mod error;
pub mod greedy;
pub mod grid;
pub mod input;
pub mod output;
pub mod recorder;
pub mod render;
pub mod search;
pub mod solver;
pub mod types;

pub use config::{Algorithm, AnnealConfig, SearchLimits, SolverConfig};
pub use error::{InputError, PackError};
pub use solver::Solver;
pub use types::{Demand, Placement, Rect, Solution, Status};
