//! # What are they for?
//!
//! Classifiers sort frames into groups without modifying them. They take each frame by
//! reference and return a class, usually an enum, that the dispatcher branches on.
mod ether_type;
pub use self::ether_type::*;

mod destination;
pub use self::destination::*;

/// Determines the kind of packet we have. The dispatcher consumes `Classifier::Class` to pick the
/// path the packet takes.
pub trait Classifier {
    type Packet;
    type Class: Sized;

    fn classify(&self, packet: &Self::Packet) -> Self::Class;
}
