use crate::error::RouterError;
use crate::trie::{prefix_len, LpmTrie};
use cidr::{Cidr, Ipv4Cidr};
use netif::InterfaceId;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// One static route. `prefix` is always aligned to `mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteEntry {
    pub prefix: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub next_hop: Ipv4Addr,
    pub interface: InterfaceId,
}

impl RouteEntry {
    ///
    /// Builds an entry, checking that `mask` is contiguous ones followed by zeros. Host bits set
    /// in `prefix` are cleared with a warning, the trie only ever sees aligned prefixes.
    ///
    pub fn new(
        prefix: Ipv4Addr,
        mask: Ipv4Addr,
        next_hop: Ipv4Addr,
        interface: InterfaceId,
    ) -> Result<RouteEntry, &'static str> {
        let len = prefix_len(mask);
        if u32::from(mask) != u32::max_value().checked_shl(32 - len).unwrap_or(0) {
            return Err("mask is not contiguous");
        }

        let network = match Ipv4Cidr::new(prefix, len as u8) {
            Ok(network) => network,
            Err(_) => {
                let aligned = Ipv4Addr::from(u32::from(prefix) & u32::from(mask));
                warn!(%prefix, %mask, %aligned, "prefix has host bits set, masking");
                Ipv4Cidr::new(aligned, len as u8).map_err(|_| "prefix does not fit mask")?
            }
        };

        Ok(RouteEntry {
            prefix: network.first_address(),
            mask,
            next_hop,
            interface,
        })
    }

    pub fn prefix_len(&self) -> u32 {
        prefix_len(self.mask)
    }

    /// True when `(addr & mask) == prefix`.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & u32::from(self.mask) == u32::from(self.prefix)
    }
}

impl FromStr for RouteEntry {
    type Err = &'static str;

    /// `prefix next_hop mask interface`, whitespace separated.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace();
        let mut address = |missing: &'static str| -> Result<Ipv4Addr, &'static str> {
            fields
                .next()
                .ok_or(missing)?
                .parse()
                .map_err(|_| "not a dotted-quad IPv4 address")
        };
        let prefix = address("missing prefix")?;
        let next_hop = address("missing next hop")?;
        let mask = address("missing mask")?;

        let interface = fields
            .next()
            .ok_or("missing interface")?
            .parse::<InterfaceId>()
            .map_err(|_| "interface is not a number")?;

        if fields.next().is_some() {
            return Err("trailing fields after interface");
        }

        RouteEntry::new(prefix, mask, next_hop, interface)
    }
}

/// Index of an entry in its `RouteTable`. Only the table hands these out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteId(usize);

///
/// The static routing table: entries in file order, indexed by an LPM trie. Built once at
/// startup and never mutated after.
///
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    trie: LpmTrie<RouteId>,
}

impl RouteTable {
    /// Indexes `entries` in order. When two entries share a prefix and mask the later one wins.
    pub fn new(entries: Vec<RouteEntry>) -> RouteTable {
        let mut trie = LpmTrie::new();
        for (index, entry) in entries.iter().enumerate() {
            let handle = trie.insert(entry.prefix, entry.mask);
            if let Some(RouteId(shadowed)) = trie.attach(handle, RouteId(index)) {
                debug!(
                    prefix = %entry.prefix,
                    mask = %entry.mask,
                    shadowed,
                    index,
                    "duplicate route, keeping the later entry"
                );
            }
        }
        RouteTable { entries, trie }
    }

    /// Reads a route file: one entry per line, blank lines and `#` comments skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RouteTable, RouterError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|error| RouterError::RouteTableIo {
            path: path.display().to_string(),
            error,
        })?;
        let table = RouteTable::parse(&contents)?;
        info!(path = %path.display(), routes = table.len(), "loaded route table");
        Ok(table)
    }

    pub fn parse(contents: &str) -> Result<RouteTable, RouterError> {
        let mut entries = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let entry = trimmed
                .parse::<RouteEntry>()
                .map_err(|reason| RouterError::RouteTable {
                    line: index + 1,
                    text: line.to_string(),
                    reason,
                })?;
            entries.push(entry);
        }
        Ok(RouteTable::new(entries))
    }

    /// Longest-prefix match for `dest`.
    pub fn lookup(&self, dest: Ipv4Addr) -> Option<(RouteId, &RouteEntry)> {
        self.trie.retrieve(dest).map(|id| (id, self.get(id)))
    }

    pub fn get(&self, id: RouteId) -> &RouteEntry {
        &self.entries[id.0]
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;
    use std::io::Write;

    const RTABLE: &str = "\
# prefix        next hop      mask             iface
192.168.0.0     192.168.0.2   255.255.255.0    0
192.168.1.0     192.168.1.2   255.255.255.0    1

10.0.0.0        10.0.0.1      255.0.0.0        2
0.0.0.0         192.168.0.2   0.0.0.0          0
";

    fn route(prefix: [u8; 4], next_hop: [u8; 4], mask: [u8; 4], interface: usize) -> RouteEntry {
        RouteEntry::new(prefix.into(), mask.into(), next_hop.into(), interface).unwrap()
    }

    #[test]
    fn parse_entry() {
        let entry: RouteEntry = "192.168.1.0 192.168.1.2 255.255.255.0 1".parse().unwrap();
        assert_eq!(entry, route([192, 168, 1, 0], [192, 168, 1, 2], [255, 255, 255, 0], 1));
        assert!(entry.contains(Ipv4Addr::new(192, 168, 1, 200)));
        assert!(!entry.contains(Ipv4Addr::new(192, 168, 2, 1)));
        assert_eq!(entry.prefix_len(), 24);
    }

    #[test]
    fn reject_bad_entries() {
        assert_eq!(
            "10.0.0.0 10.0.0.1 255.0.255.0 0".parse::<RouteEntry>(),
            Err("mask is not contiguous")
        );
        assert_eq!(
            "10.0.0.0 10.0.0.1 255.0.0.0".parse::<RouteEntry>(),
            Err("missing interface")
        );
        assert_eq!(
            "10.0.0.0 10.0.0.1 255.0.0.0 eth0".parse::<RouteEntry>(),
            Err("interface is not a number")
        );
        assert_eq!(
            "10.0.0.300 10.0.0.1 255.0.0.0 0".parse::<RouteEntry>(),
            Err("not a dotted-quad IPv4 address")
        );
        assert_eq!(
            "10.0.0.0 10.0.0.1 255.0.0.0 0 9".parse::<RouteEntry>(),
            Err("trailing fields after interface")
        );
    }

    #[test]
    fn unaligned_prefix_is_masked() {
        let entry: RouteEntry = "10.1.2.3 10.0.0.1 255.255.0.0 0".parse().unwrap();
        assert_eq!(entry.prefix, Ipv4Addr::new(10, 1, 0, 0));
    }

    #[test]
    fn lookup_picks_longest_prefix() {
        let table = RouteTable::parse(RTABLE).unwrap();
        assert_eq!(table.len(), 4);

        let expected = hashmap! {
            Ipv4Addr::new(192, 168, 1, 9) => Ipv4Addr::new(192, 168, 1, 2),
            Ipv4Addr::new(192, 168, 0, 9) => Ipv4Addr::new(192, 168, 0, 2),
            Ipv4Addr::new(10, 200, 0, 1) => Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(8, 8, 8, 8) => Ipv4Addr::new(192, 168, 0, 2),
        };
        for (dest, next_hop) in expected {
            let (_, entry) = table.lookup(dest).unwrap();
            assert_eq!(entry.next_hop, next_hop, "route for {}", dest);
        }
    }

    #[test]
    fn no_default_no_match() {
        let table = RouteTable::new(vec![route([10, 0, 0, 0], [10, 0, 0, 1], [255, 255, 255, 0], 0)]);
        assert!(table.lookup(Ipv4Addr::new(10, 0, 0, 5)).is_some());
        assert!(table.lookup(Ipv4Addr::new(11, 0, 0, 5)).is_none());
    }

    #[test]
    fn later_duplicate_wins() {
        let table = RouteTable::new(vec![
            route([10, 0, 0, 0], [10, 0, 0, 1], [255, 0, 0, 0], 0),
            route([10, 0, 0, 0], [10, 0, 0, 2], [255, 0, 0, 0], 1),
        ]);
        let (id, entry) = table.lookup(Ipv4Addr::new(10, 9, 9, 9)).unwrap();
        assert_eq!(entry.next_hop, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(table.get(id).interface, 1);
    }

    #[test]
    fn parse_error_names_line() {
        match RouteTable::parse("10.0.0.0 10.0.0.1 255.0.0.0 0\n\nbogus\n") {
            Err(RouterError::RouteTable { line, text, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(text, "bogus");
            }
            other => panic!("expected a route table error, got {:?}", other),
        }
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RTABLE.as_bytes()).unwrap();

        let table = RouteTable::load(file.path()).unwrap();
        assert_eq!(table.entries()[2], route([10, 0, 0, 0], [10, 0, 0, 1], [255, 0, 0, 0], 2));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        match RouteTable::load(dir.path().join("rtable.txt")) {
            Err(RouterError::RouteTableIo { .. }) => (),
            other => panic!("expected an io error, got {:?}", other),
        }
    }
}
