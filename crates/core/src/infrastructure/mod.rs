//! Outbound collaborators: the e-signature provider and the health information exchange.

pub mod hie;
pub mod signature;

use std::time::Duration;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
