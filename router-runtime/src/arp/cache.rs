use router_packets::MacAddr;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// Learned IPv4 to MAC mappings. Entries never expire; a newer record for the same address
/// replaces the older one.
#[derive(Debug, Default, Clone)]
pub struct ArpCache {
    ipv4_mac_translations: HashMap<Ipv4Addr, MacAddr>,
}

impl ArpCache {
    pub fn new() -> Self {
        ArpCache {
            ipv4_mac_translations: HashMap::new(),
        }
    }

    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.ipv4_mac_translations.get(&ip).copied()
    }

    /// Returns the mapping this record replaced, if any.
    pub fn record(&mut self, ip: Ipv4Addr, mac: MacAddr) -> Option<MacAddr> {
        self.ipv4_mac_translations.insert(ip, mac)
    }

    pub fn len(&self) -> usize {
        self.ipv4_mac_translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4_mac_translations.is_empty()
    }
}
