use std::net::Ipv4Addr;

use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::IpNetwork;

/// A local network adapter and the IPv4 addresses bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapter {
    pub name: String,
    /// Enumeration order, without duplicates.
    pub ipv4_addresses: Vec<Ipv4Addr>,
}

impl Adapter {
    pub fn new(name: impl Into<String>, addrs: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        let mut ipv4_addresses: Vec<Ipv4Addr> = Vec::new();
        for addr in addrs {
            if !ipv4_addresses.contains(&addr) {
                ipv4_addresses.push(addr);
            }
        }
        Self {
            name: name.into(),
            ipv4_addresses,
        }
    }
}

impl From<&NetworkInterface> for Adapter {
    fn from(interface: &NetworkInterface) -> Self {
        Adapter::new(interface.name.clone(), interface.get_ipv4_addrs())
    }
}

/// Capability to enumerate this machine's network adapters.
///
/// A failure is not fatal to a scan: the scanner treats it as "no local
/// adapters" and carries on with supplementary and fallback subnets.
pub trait AdapterInspector: Send + Sync {
    fn adapters(&self) -> anyhow::Result<Vec<Adapter>>;
}

pub trait NetworkInterfaceExtension {
    fn get_ipv4_addrs(&self) -> Vec<Ipv4Addr>;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn get_ipv4_addrs(&self) -> Vec<Ipv4Addr> {
        self.ips
            .iter()
            .filter_map(|ip| match ip {
                IpNetwork::V4(ipv4) => Some(ipv4.ip()),
                IpNetwork::V6(_) => None,
            })
            .collect()
    }
}

/// Keeps interfaces that are up, not loopback and carry at least one IPv4
/// address. Wired-style names (`e*`, as in `eth0` or `enp9s0`) sort first.
pub fn prioritize_interfaces(interfaces: Vec<NetworkInterface>) -> Vec<NetworkInterface> {
    let mut interfaces: Vec<NetworkInterface> = interfaces
        .into_iter()
        .filter(|i| i.is_up() && !i.is_loopback() && !i.get_ipv4_addrs().is_empty())
        .collect();

    interfaces.sort_by_key(|i| if i.name.starts_with('e') { 0 } else { 1 });
    interfaces
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
