use std::net::Ipv4Addr;

const ROOT: usize = 0;

/// Handle to a trie node, returned by `LpmTrie::insert` so the caller can attach a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(usize);

#[derive(Debug, Clone)]
struct Node<T> {
    /// Child for a 0 bit, then for a 1 bit.
    children: [Option<usize>; 2],
    /// Present only on terminal nodes.
    value: Option<T>,
}

impl<T> Node<T> {
    fn new() -> Self {
        Node {
            children: [None, None],
            value: None,
        }
    }
}

///
/// Binary trie over IPv4 prefix bits, most significant bit first. Nodes live in one arena and
/// refer to each other by index; the trie never owns route data, it only hands back the small
/// `Copy` value attached to the matching node.
///
#[derive(Debug, Clone)]
pub struct LpmTrie<T> {
    nodes: Vec<Node<T>>,
}

impl<T: Copy> LpmTrie<T> {
    pub fn new() -> Self {
        LpmTrie {
            nodes: vec![Node::new()],
        }
    }

    /// Walks (creating on demand) the first `prefix_len(mask)` bits of `prefix` and returns the
    /// node where that walk ends. `prefix` must already be masked and `mask` contiguous.
    pub fn insert(&mut self, prefix: Ipv4Addr, mask: Ipv4Addr) -> NodeHandle {
        let prefix = u32::from(prefix);
        let mut current = ROOT;

        for depth in 0..prefix_len(mask) {
            let bit = bit_at(prefix, depth);
            current = match self.nodes[current].children[bit] {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::new());
                    self.nodes[current].children[bit] = Some(child);
                    child
                }
            };
        }

        NodeHandle(current)
    }

    /// Marks the node terminal, replacing whatever was attached before.
    pub fn attach(&mut self, handle: NodeHandle, value: T) -> Option<T> {
        self.nodes[handle.0].value.replace(value)
    }

    /// Longest-prefix match for `target`.
    pub fn retrieve(&self, target: Ipv4Addr) -> Option<T> {
        let target = u32::from(target);
        let mut current = ROOT;
        let mut best = self.nodes[ROOT].value;

        for depth in 0..32 {
            match self.nodes[current].children[bit_at(target, depth)] {
                Some(child) => current = child,
                None => break,
            }
            if let Some(value) = self.nodes[current].value {
                best = Some(value);
            }
        }

        best
    }

    /// Number of allocated nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<T: Copy> Default for LpmTrie<T> {
    fn default() -> Self {
        LpmTrie::new()
    }
}

/// Count of leading one bits in `mask`.
pub fn prefix_len(mask: Ipv4Addr) -> u32 {
    u32::from(mask).leading_ones()
}

fn bit_at(addr: u32, depth: u32) -> usize {
    ((addr >> (31 - depth)) & 1) as usize
}
