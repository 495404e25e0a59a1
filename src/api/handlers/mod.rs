//! Route handlers.

pub mod flush;
pub mod health;
pub mod session;
