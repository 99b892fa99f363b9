use clap::{App, Arg, ArgMatches};
use failure::Error;
use netif::NetIf;
use router_afpacket::AfPacketNetIf;
use router_runtime::{route::RouteTable, Router};
use std::process;
use tracing::{error, info, Level};

fn main() {
    let matches = App::new("Static Router")
        .version("0.1")
        .author("Route-rs Contributors")
        .about("Forward IPv4 between Linux interfaces using a static route table")
        .arg(
            Arg::with_name("rtable")
                .value_name("RTABLE")
                .help("Route table file: `prefix next_hop mask interface` per line")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("iface")
                .value_name("IFACE")
                .help("Interfaces to route between; the first is interface 0")
                .required(true)
                .multiple(true)
                .index(2),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Log more: -v info, -vv debug, -vvv trace"),
        )
        .arg(
            Arg::with_name("promiscuous")
                .long("promiscuous")
                .help("Put every interface in promiscuous mode"),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        for cause in e.iter_causes() {
            error!("caused by: {}", cause);
        }
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let rtable = matches.value_of("rtable").unwrap_or_default();
    let ifaces: Vec<String> = matches
        .values_of("iface")
        .map(|values| values.map(String::from).collect())
        .unwrap_or_default();

    let routes = RouteTable::load(rtable)?;
    info!(rtable, routes = routes.len(), "route table loaded");

    let netif = AfPacketNetIf::open(&ifaces, matches.is_present("promiscuous"))?;
    info!(interfaces = netif.interfaces().len(), "routing");

    let mut router = Router::new(netif, routes)?;
    router.run()?;
    Ok(())
}
