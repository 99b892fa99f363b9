#![cfg(target_os = "linux")]

use afpacket;
use rand::{self, Rng};
use router_packets as packets;
use std::{ffi::CString, net, sync::mpsc, thread, time::Duration};

#[test]
#[ignore]
fn layer2_loopback() {
    // If this takes more than a second to occur, something's definitely wrong.
    let timeout = Duration::from_secs(1);

    let mut rng = rand::thread_rng();

    let iface_name = CString::new("lo").unwrap();

    let side_a = afpacket::Socket::new().unwrap();
    let mut side_a = side_a.bind(&iface_name).unwrap();

    let side_b = afpacket::Socket::new().unwrap();

    let (tx, rx) = mpsc::channel();

    let thread_b = thread::spawn(move || {
        let mut side_b = side_b.bind(&iface_name).unwrap();
        side_b.set_promiscuous(true).unwrap();

        let mut in_buffer = vec![0; 1600];
        let (len, _) = side_b.recv(&mut in_buffer).unwrap();
        in_buffer.resize(len, 0);

        side_b.set_promiscuous(false).unwrap();

        tx.send(in_buffer).unwrap();
    });

    // an echo request from a made-up host, broadcast so nothing filters it out
    let body = {
        let mut body = vec![0; 56];
        rng.fill(&mut body[..]);
        body
    };
    let mut echo = packets::IcmpMessage::empty();
    echo.set_msg_type(packets::IcmpType::EchoRequest);
    echo.set_echo_identifier(rng.gen());
    echo.set_echo_sequence(1);
    echo.set_payload(&body);
    echo.fill_checksum();
    let mut ipv4_pkt = packets::Ipv4Packet::encap_icmp(echo);
    ipv4_pkt.set_src_addr(net::Ipv4Addr::new(10, 0, 0, 1));
    ipv4_pkt.set_dest_addr(net::Ipv4Addr::new(10, 0, 0, 2));
    ipv4_pkt.set_ttl(2);
    ipv4_pkt.fill_checksum();
    let mut eth_pkt = packets::EthernetFrame::encap_ipv4(ipv4_pkt);
    eth_pkt.set_link_addrs(packets::MacAddr::BROADCAST, packets::MacAddr::BROADCAST);

    side_a.send(&eth_pkt.data).unwrap();

    let in_buffer = rx.recv_timeout(timeout).unwrap();
    assert_eq!(in_buffer, eth_pkt.data);

    thread_b.join().unwrap();
}

#[test]
#[ignore]
fn loopback_addresses() {
    let iface_name = CString::new("lo").unwrap();
    let socket = afpacket::Socket::new().unwrap().bind(&iface_name).unwrap();

    assert!(socket.ifindex() > 0);
    assert_eq!(socket.iface(), iface_name.as_c_str());
    assert_eq!(socket.hardware_addr().unwrap(), [0; 6]);
    assert_eq!(socket.ipv4_addr().unwrap(), net::Ipv4Addr::new(127, 0, 0, 1));
}
