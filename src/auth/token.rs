//! Bearer credentials and the records that track their lifetime.

pub mod family;
pub mod record;
pub mod secret;
