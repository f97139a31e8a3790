#![forbid(unsafe_code)]

pub mod gates;
pub mod runtime;
pub mod state;
