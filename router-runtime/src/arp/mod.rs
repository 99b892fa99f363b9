//! Next-hop resolution: the IP to MAC cache, the packets parked until their next hop answers,
//! and the resolver that moves packets between the two.

mod cache;
pub use self::cache::*;

mod queue;
pub use self::queue::*;

mod resolver;
pub use self::resolver::*;
