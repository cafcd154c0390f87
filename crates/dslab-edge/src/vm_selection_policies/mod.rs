//! Implementations of VM selection policies.

pub mod ant_colony;
pub mod best_fit;
pub mod first_fit;
pub mod max_min;
pub mod next_fit;
pub mod random_fit;
pub mod round_robin;
pub mod worst_fit;
