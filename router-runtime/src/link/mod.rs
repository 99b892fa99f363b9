//! Links the router can run on without touching real hardware.

mod channel;
pub use self::channel::*;
