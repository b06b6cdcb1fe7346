//! Identifiers, token secrets, session records, and sign-in handshakes.

pub mod id;
pub mod pending;
pub mod token;

pub use id::*;
pub use pending::*;
pub use token::{record::*, secret::*};
