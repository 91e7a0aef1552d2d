use lanprobe_common::network::interface::{Adapter, AdapterInspector, prioritize_interfaces};
use pnet::datalink::{self, NetworkInterface};
use tracing::trace;

/// Enumerates this machine's adapters through `pnet::datalink`.
///
/// Down, loopback and IPv4-less interfaces are left out; wired-style names
/// come first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PnetAdapterInspector;

impl AdapterInspector for PnetAdapterInspector {
    fn adapters(&self) -> anyhow::Result<Vec<Adapter>> {
        let interfaces: Vec<NetworkInterface> = prioritize_interfaces(datalink::interfaces());
        let adapters: Vec<Adapter> = interfaces.iter().map(Adapter::from).collect();
        for adapter in &adapters {
            trace!("Adapter {}: {:?}", adapter.name, adapter.ipv4_addresses);
        }
        Ok(adapters)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_adapters_carry_ipv4_and_no_loopback() {
        let adapters = PnetAdapterInspector.adapters().unwrap();
        for adapter in adapters {
            assert!(!adapter.ipv4_addresses.is_empty(), "{}", adapter.name);
            assert!(adapter.ipv4_addresses.iter().all(|ip| !ip.is_loopback()));
        }
    }
}
