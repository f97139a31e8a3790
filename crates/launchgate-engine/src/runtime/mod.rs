pub mod authenticator;
pub mod host;
pub mod looper;
pub mod navigator;
