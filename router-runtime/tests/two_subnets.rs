//! Drives a router over the in-memory link from another thread: two hosts on two subnets ping
//! each other through it.

use netif::InterfaceInfo;
use router_packets::*;
use router_runtime::link::ChannelNetIf;
use router_runtime::route::RouteTable;
use router_runtime::{Router, RouterError};
use std::convert::TryFrom;
use std::io::Write;
use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

const R0_MAC: MacAddr = MacAddr::new([0xde, 0xad, 0xbe, 0xef, 0, 0]);
const R1_MAC: MacAddr = MacAddr::new([0xde, 0xad, 0xbe, 0xef, 0, 1]);
const H0_MAC: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x10]);
const H1_MAC: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x11]);
const R0_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 1);
const R1_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);
const H0_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 2);
const H1_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 2);

const RTABLE: &str = "\
192.168.0.0 192.168.0.2 255.255.255.0 0
192.168.1.0 192.168.1.2 255.255.255.0 1
";

fn ping(src_mac: MacAddr, dst_mac: MacAddr, src: Ipv4Addr, dst: Ipv4Addr, seq: u16) -> Vec<u8> {
    let mut message = IcmpMessage::empty();
    message.set_msg_type(IcmpType::EchoRequest);
    message.set_echo_identifier(0x4242);
    message.set_echo_sequence(seq);
    message.set_payload(b"route me");
    message.fill_checksum();

    let mut packet = Ipv4Packet::encap_icmp(message);
    packet.set_ttl(64);
    packet.set_src_addr(src);
    packet.set_dest_addr(dst);
    packet.fill_checksum();

    let mut frame = EthernetFrame::encap_ipv4(packet);
    frame.set_link_addrs(dst_mac, src_mac);
    frame.data
}

fn arp_reply(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_mac: MacAddr, target_ip: Ipv4Addr) -> Vec<u8> {
    ArpFrame::ipv4(ArpOp::Reply, sender_mac, sender_ip, target_mac, target_ip)
        .frame()
        .data
}

#[test]
fn ping_across_the_router() {
    let mut rtable = tempfile::NamedTempFile::new().unwrap();
    rtable.write_all(RTABLE.as_bytes()).unwrap();
    let routes = RouteTable::load(rtable.path()).unwrap();

    let (netif, wire) = ChannelNetIf::new(vec![
        InterfaceInfo {
            name: "r-0".to_string(),
            mac: R0_MAC,
            ipv4: R0_IP,
        },
        InterfaceInfo {
            name: "r-1".to_string(),
            mac: R1_MAC,
            ipv4: R1_IP,
        },
    ]);
    let mut router = Router::new(netif, routes).unwrap();
    let handle = thread::spawn(move || {
        let result = router.run();
        (router.pending(), result)
    });

    let timeout = Duration::from_secs(5);

    // H0 pings H1 through the router: the router asks who H1 is first.
    wire.ingress
        .send((0, ping(H0_MAC, R0_MAC, H0_IP, H1_IP, 1)))
        .unwrap();
    let (iface, data) = wire.egress.recv_timeout(timeout).unwrap();
    assert_eq!(iface, 1);
    let request = ArpFrame::try_from(EthernetFrame::from_buffer(data).unwrap()).unwrap();
    assert!(request.is_op(ArpOp::Request));
    assert_eq!(request.target_ipv4_addr(), Ok(H1_IP));

    // H1 answers and the parked ping goes out.
    wire.ingress
        .send((1, arp_reply(H1_MAC, H1_IP, R1_MAC, R1_IP)))
        .unwrap();
    let (iface, data) = wire.egress.recv_timeout(timeout).unwrap();
    assert_eq!(iface, 1);
    let frame = EthernetFrame::from_buffer(data).unwrap();
    assert_eq!(frame.dest_mac(), H1_MAC);
    assert_eq!(frame.src_mac(), R1_MAC);
    let packet = Ipv4Packet::try_from(frame).unwrap();
    assert_eq!(packet.ttl(), 63);
    assert_eq!(packet.dest_addr(), H1_IP);
    let echo = IcmpMessage::try_from(packet).unwrap();
    assert_eq!(echo.echo_sequence(), 1);
    assert_eq!(echo.payload(), b"route me");

    // H1 pings the router itself, whose reply waits on H1's MAC no longer.
    wire.ingress
        .send((1, ping(H1_MAC, R1_MAC, H1_IP, R1_IP, 2)))
        .unwrap();
    let (iface, data) = wire.egress.recv_timeout(timeout).unwrap();
    assert_eq!(iface, 1);
    let packet = Ipv4Packet::try_from(EthernetFrame::from_buffer(data).unwrap()).unwrap();
    assert_eq!(packet.src_addr(), R1_IP);
    assert_eq!(packet.dest_addr(), H1_IP);
    let reply = IcmpMessage::try_from(packet).unwrap();
    assert!(reply.is_type(IcmpType::EchoReply));
    assert_eq!(reply.echo_sequence(), 2);
    assert_eq!(reply.payload(), b"route me");

    // Ping a host nobody routes to: unreachable, back to H1.
    wire.ingress
        .send((1, ping(H1_MAC, R1_MAC, H1_IP, Ipv4Addr::new(172, 16, 0, 1), 3)))
        .unwrap();
    let (iface, data) = wire.egress.recv_timeout(timeout).unwrap();
    assert_eq!(iface, 1);
    let packet = Ipv4Packet::try_from(EthernetFrame::from_buffer(data).unwrap()).unwrap();
    assert_eq!(packet.dest_addr(), H1_IP);
    let error = IcmpMessage::try_from(packet).unwrap();
    assert!(error.is_type(IcmpType::DestinationUnreachable));

    drop(wire.ingress);
    let (pending, result) = handle.join().unwrap();
    assert_eq!(pending, 0);
    match result {
        Err(RouterError::Link(_)) => (),
        other => panic!("expected the router to stop on a link error, got {:?}", other),
    }
    assert!(wire.egress.try_recv().is_err());
}
