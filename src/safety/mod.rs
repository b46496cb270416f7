//! Location and route safety scoring

pub mod calculator;
pub mod route;

pub use calculator::{SafetyScorer, compute_score};
pub use route::RouteAnalyzer;
