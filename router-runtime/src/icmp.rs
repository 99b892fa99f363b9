use crate::error::RouterError;
use crate::route::{RouteId, RouteTable};
use netif::InterfaceInfo;
use router_packets::{
    EthernetFrame, IcmpMessage, IcmpType, Ipv4Packet, ICMP_HEADER_LEN, IPV4_HEADER_LEN,
};

/// TTL of every packet the router originates.
pub const DEFAULT_TTL: u8 = 64;

/// How much of the offending datagram an error quotes: its header and 64 bits of payload.
pub const ERROR_QUOTE_LEN: usize = IPV4_HEADER_LEN + 8;

/// Size of a generated error frame: Ethernet, IPv4, ICMP and the quote.
pub const ERROR_FRAME_LEN: usize = 14 + IPV4_HEADER_LEN + ICMP_HEADER_LEN + ERROR_QUOTE_LEN;

/// Builds the ICMP messages the router originates. Nothing is sent from here; every frame comes
/// back with the route it should leave on, and the link addresses are left for the ARP resolver
/// to fill in.
pub struct IcmpGenerator {
    ttl: u8,
}

impl Default for IcmpGenerator {
    fn default() -> Self {
        IcmpGenerator::new()
    }
}

impl IcmpGenerator {
    pub fn new() -> IcmpGenerator {
        IcmpGenerator { ttl: DEFAULT_TTL }
    }

    /// Create an ICMP echo reply mirroring an echo request addressed to the router.
    ///
    /// # Arguments
    ///
    /// * `request` - The IPv4 packet carrying the request
    /// * `echo` - The ICMP echo request inside `request`
    /// * `routes` - Used to find the way back to the requester. Having no route back to a host
    /// that just reached us is fatal.
    pub fn echo_reply(
        &self,
        request: &Ipv4Packet,
        echo: &IcmpMessage,
        routes: &RouteTable,
    ) -> Result<(EthernetFrame, RouteId), RouterError> {
        let mut reply = IcmpMessage::empty();
        reply.set_msg_type(IcmpType::EchoReply);
        reply.set_code(0);
        reply.set_echo_identifier(echo.echo_identifier());
        reply.set_echo_sequence(echo.echo_sequence());
        reply.set_payload(echo.payload());
        reply.fill_checksum();

        let mut packet = Ipv4Packet::encap_icmp(reply);
        packet.set_identification(request.identification());
        packet.set_fragment_field(request.fragment_field());
        packet.set_ttl(self.ttl);
        packet.set_src_addr(request.dest_addr());
        packet.set_dest_addr(request.src_addr());
        packet.fill_checksum();

        let (route, _) = routes
            .lookup(packet.dest_addr())
            .ok_or_else(|| RouterError::NoReturnRoute(packet.dest_addr()))?;
        Ok((EthernetFrame::encap_ipv4(packet), route))
    }

    /// Create an ICMP error about `offending`, addressed back to its source.
    ///
    /// # Arguments
    ///
    /// * `offending` - The packet being refused. Its header and the first 8 bytes of its payload
    /// are quoted, zero padded if the datagram is shorter than that
    /// * `kind` - Time exceeded or destination unreachable; the code is always 0
    /// * `routes` - Picks the route back, whose interface address becomes the source
    /// * `interfaces` - The router's interfaces, indexed by interface id
    pub fn error(
        &self,
        offending: &Ipv4Packet,
        kind: IcmpType,
        routes: &RouteTable,
        interfaces: &[InterfaceInfo],
    ) -> Result<(EthernetFrame, RouteId), RouterError> {
        let dest = offending.src_addr();
        let (route, entry) = routes
            .lookup(dest)
            .ok_or_else(|| RouterError::NoReturnRoute(dest))?;
        let source = interfaces
            .get(entry.interface)
            .ok_or_else(|| RouterError::UnknownInterface(entry.interface))?
            .ipv4;

        let mut quote: Vec<u8> = offending
            .header()
            .iter()
            .chain(offending.payload())
            .take(ERROR_QUOTE_LEN)
            .cloned()
            .collect();
        quote.resize(ERROR_QUOTE_LEN, 0);

        let mut message = IcmpMessage::empty();
        message.set_msg_type(kind);
        message.set_code(0);
        message.set_payload(&quote);
        message.fill_checksum();

        let mut packet = Ipv4Packet::encap_icmp(message);
        packet.set_identification(1);
        packet.set_ttl(self.ttl);
        packet.set_src_addr(source);
        packet.set_dest_addr(dest);
        packet.fill_checksum();

        Ok((EthernetFrame::encap_ipv4(packet), route))
    }

    pub fn time_exceeded(
        &self,
        offending: &Ipv4Packet,
        routes: &RouteTable,
        interfaces: &[InterfaceInfo],
    ) -> Result<(EthernetFrame, RouteId), RouterError> {
        self.error(offending, IcmpType::TimeExceeded, routes, interfaces)
    }

    pub fn destination_unreachable(
        &self,
        offending: &Ipv4Packet,
        routes: &RouteTable,
        interfaces: &[InterfaceInfo],
    ) -> Result<(EthernetFrame, RouteId), RouterError> {
        self.error(offending, IcmpType::DestinationUnreachable, routes, interfaces)
    }
}
