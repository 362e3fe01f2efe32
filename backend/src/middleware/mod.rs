//! Request-context middleware

mod actor;

pub use actor::Actor;
