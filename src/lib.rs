pub mod balance;
pub mod capabilities;
pub mod clock;
pub mod config;
pub mod constants;
pub mod engine;
pub mod ghost;
pub mod maze;
pub mod player;
pub mod rng;
pub mod types;

#[cfg(test)]
mod test_support;
