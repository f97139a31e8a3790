#![forbid(unsafe_code)]

pub mod errors;
pub mod invocation;
pub mod keys;
pub mod state;
pub mod traits;
pub mod types;
