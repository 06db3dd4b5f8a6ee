pub mod actor;
pub mod catalog;
pub mod constants;
pub mod engine;
pub mod error;
pub mod level;
pub mod logging;
pub mod protocol;
pub mod rng;
pub mod ticker;
pub mod types;
