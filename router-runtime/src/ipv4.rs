use router_packets::Ipv4Packet;

///
/// Recomputes the header checksum with the checksum field zeroed and compares it with the stored
/// value. The header is left exactly as it was, whatever the outcome.
///
pub fn verify_checksum(packet: &mut Ipv4Packet) -> bool {
    let stored = packet.checksum();
    packet.set_checksum(0);
    let computed = packet.header_checksum();
    packet.set_checksum(stored);
    computed == stored
}

/// Decrements the TTL and refreshes the checksum. A TTL of 1 or less means the packet must not
/// be forwarded: nothing is modified and `false` comes back.
pub fn decrement_ttl(packet: &mut Ipv4Packet) -> bool {
    match packet.ttl() {
        0 | 1 => false,
        ttl => {
            packet.set_ttl(ttl - 1);
            packet.fill_checksum();
            true
        }
    }
}
