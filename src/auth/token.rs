//! Session token models.

pub mod record;
pub mod secret;
