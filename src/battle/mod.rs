pub mod ai;
pub mod calculators;
pub mod conditions;
pub mod effectiveness;
pub mod engine;
pub mod runner;
pub mod state;
pub mod stats;
pub mod turn_order;
pub mod worker;

#[cfg(test)]
mod tests;
