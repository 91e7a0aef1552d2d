use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use lanprobe_common::config::ScanConfig;
use lanprobe_common::error::ConfigError;
use lanprobe_common::network::interface::Adapter;
use lanprobe_common::network::segment::SubnetPrefix;
use lanprobe_common::scanning::{ScanReport, ScanState};
use lanprobe_core::ScanCoordinator;

use super::support::{FakeIdentity, FakeInspector, FakeProber, base_config, fast_ten_classifier};

struct Harness {
    coordinator: ScanCoordinator,
    inspector: Arc<FakeInspector>,
    prober: Arc<FakeProber>,
    identity: Arc<FakeIdentity>,
}

fn harness(config: ScanConfig, inspector: FakeInspector, prober: FakeProber) -> Harness {
    let inspector = Arc::new(inspector);
    let prober = Arc::new(prober);
    let identity = Arc::new(FakeIdentity::accepting());

    let coordinator = ScanCoordinator::new(config)
        .with_classifier(fast_ten_classifier())
        .with_inspector(inspector.clone())
        .with_prober(prober.clone())
        .with_identity_check(identity.clone());

    let _ = prober.cancel.set(coordinator.cancel_handle());

    Harness {
        coordinator,
        inspector,
        prober,
        identity,
    }
}

fn subnets(count: u8) -> Vec<SubnetPrefix> {
    (1..=count).map(|c| SubnetPrefix::new(10, 0, c)).collect()
}

fn server_ips(report: &ScanReport) -> Vec<Ipv4Addr> {
    let mut ips: Vec<Ipv4Addr> = report.servers.iter().map(|s| s.ip()).collect();
    ips.sort();
    ips
}

#[tokio::test]
async fn unreachable_hosts_finish_within_timeout_bounds() {
    let config = ScanConfig {
        supplementary_subnets: subnets(1),
        ..base_config()
    };
    let bound = config.probe_bound();
    let mut h = harness(config, FakeInspector::with(Vec::new()), FakeProber::new());

    let report = h.coordinator.scan().await.unwrap();

    assert_eq!(report.state, ScanState::Done);
    assert!(report.servers.is_empty());
    assert_eq!(report.progress.scanned, 10);
    assert!(report.elapsed >= Duration::from_millis(500), "{:?}", report.elapsed);
    assert!(report.elapsed <= bound * 10, "{:?}", report.elapsed);
}

#[tokio::test]
async fn host_with_only_primary_port_is_excluded() {
    let config = ScanConfig {
        supplementary_subnets: subnets(1),
        max_threads: 10,
        ..base_config()
    };
    let half_open = Ipv4Addr::new(10, 0, 1, 4);
    let full = Ipv4Addr::new(10, 0, 1, 5);
    let prober = FakeProber::new()
        .port(half_open, config.ports.primary)
        .server(full, &config);
    let mut h = harness(config, FakeInspector::with(Vec::new()), prober);

    let report = h.coordinator.scan().await.unwrap();

    assert_eq!(server_ips(&report), vec![full]);
    assert_eq!(h.identity.calls(), 1);
}

#[tokio::test]
async fn cancellation_keeps_only_servers_from_processed_segments() {
    let config = ScanConfig {
        supplementary_subnets: subnets(5),
        timeout: Duration::from_millis(10),
        ..base_config()
    };
    let mut prober = FakeProber::new();
    for c in 1..=5 {
        prober = prober.server(Ipv4Addr::new(10, 0, c, 2), &config);
    }
    let prober = prober.cancel_at(Ipv4Addr::new(10, 0, 3, 6));
    let mut h = harness(config, FakeInspector::with(Vec::new()), prober);

    let report = h.coordinator.scan().await.unwrap();

    assert_eq!(report.state, ScanState::Cancelled);
    assert_eq!(h.coordinator.state(), ScanState::Cancelled);
    assert_eq!(
        server_ips(&report),
        vec![
            Ipv4Addr::new(10, 0, 1, 2),
            Ipv4Addr::new(10, 0, 2, 2),
            Ipv4Addr::new(10, 0, 3, 2),
        ]
    );
    assert_eq!(report.progress.segments_done, 2);
    assert!(h.prober.probed().iter().all(|ip| ip.octets()[2] <= 3));
}

#[tokio::test]
async fn zero_threads_fails_before_adapter_enumeration() {
    let config = ScanConfig {
        max_threads: 0,
        ..base_config()
    };
    let mut h = harness(config, FakeInspector::with(Vec::new()), FakeProber::new());

    let result = h.coordinator.scan().await;

    assert!(matches!(result, Err(ConfigError::NoThreads)));
    assert_eq!(h.inspector.calls(), 0);
    assert!(h.prober.probed().is_empty());
}

#[tokio::test]
async fn fast_mode_stops_after_threshold_is_reached() {
    let config = ScanConfig {
        supplementary_subnets: subnets(4),
        fast_mode: true,
        max_threads: 10,
        ..base_config()
    };
    let mut prober = FakeProber::new();
    for c in 1..=4 {
        prober = prober.server(Ipv4Addr::new(10, 0, c, 3), &config);
    }
    let mut h = harness(config, FakeInspector::with(Vec::new()), prober);

    let report = h.coordinator.scan().await.unwrap();

    assert_eq!(report.state, ScanState::Done);
    assert_eq!(report.servers.len(), 2);
    assert_eq!(report.progress.segments_done, 2);
    assert!(h.prober.probed().iter().all(|ip| ip.octets()[2] <= 2));
}

#[tokio::test]
async fn fast_mode_threshold_is_configurable() {
    let config = ScanConfig {
        supplementary_subnets: subnets(3),
        fast_mode: true,
        fast_mode_threshold: 3,
        max_threads: 10,
        ..base_config()
    };
    let mut prober = FakeProber::new();
    for c in 1..=3 {
        prober = prober.server(Ipv4Addr::new(10, 0, c, 3), &config);
    }
    let mut h = harness(config, FakeInspector::with(Vec::new()), prober);

    let report = h.coordinator.scan().await.unwrap();
    assert_eq!(report.servers.len(), 3);
    assert_eq!(report.progress.segments_done, 3);
}

#[tokio::test]
async fn adapter_failure_falls_back_to_supplementary_subnets() {
    let config = ScanConfig {
        supplementary_subnets: subnets(1),
        max_threads: 10,
        ..base_config()
    };
    let server = Ipv4Addr::new(10, 0, 1, 9);
    let prober = FakeProber::new().server(server, &config);
    let mut h = harness(config, FakeInspector::failing(), prober);

    let report = h.coordinator.scan().await.unwrap();

    assert_eq!(h.inspector.calls(), 1);
    assert_eq!(report.state, ScanState::Done);
    assert_eq!(server_ips(&report), vec![server]);
}

#[tokio::test]
async fn local_address_is_verified_before_the_rest_of_its_segment() {
    let local = Ipv4Addr::new(10, 0, 1, 200);
    let config = ScanConfig {
        max_threads: 4,
        ..base_config()
    };
    let prober = FakeProber::new().server(local, &config);
    let inspector = FakeInspector::with(vec![Adapter::new("eth0", [local])]);
    let mut h = harness(config, inspector, prober);

    let report = h.coordinator.scan().await.unwrap();

    let probed = h.prober.probed();
    assert_eq!(&probed[..2], &[local, local]);
    assert_eq!(report.progress.total, 11);
    assert_eq!(server_ips(&report), vec![local]);
}

#[tokio::test]
async fn rerunning_a_scan_starts_from_a_fresh_result_set() {
    let config = ScanConfig {
        supplementary_subnets: subnets(1),
        max_threads: 10,
        ..base_config()
    };
    let prober = FakeProber::new().server(Ipv4Addr::new(10, 0, 1, 1), &config);
    let mut h = harness(config, FakeInspector::with(Vec::new()), prober);

    let first = h.coordinator.scan().await.unwrap();
    let second = h.coordinator.scan().await.unwrap();

    assert_eq!(first.servers.len(), 1);
    assert_eq!(second.servers.len(), 1);
    assert_eq!(second.progress.scanned, 10);
}

#[tokio::test]
async fn cancelled_scan_can_be_run_again() {
    let config = ScanConfig {
        supplementary_subnets: subnets(2),
        max_threads: 4,
        ..base_config()
    };
    let prober = FakeProber::new()
        .server(Ipv4Addr::new(10, 0, 1, 2), &config)
        .server(Ipv4Addr::new(10, 0, 2, 2), &config)
        .cancel_at(Ipv4Addr::new(10, 0, 1, 5));
    let mut h = harness(config, FakeInspector::with(Vec::new()), prober);

    let first = h.coordinator.scan().await.unwrap();
    assert_eq!(first.state, ScanState::Cancelled);

    // the prober still fires the first run's token; it no longer reaches this run
    let second = h.coordinator.scan().await.unwrap();
    assert_eq!(second.state, ScanState::Done);
    assert_eq!(second.progress.scanned, 20);
    assert_eq!(second.progress.segments_done, 2);
    assert_eq!(
        server_ips(&second),
        vec![Ipv4Addr::new(10, 0, 1, 2), Ipv4Addr::new(10, 0, 2, 2)]
    );
}

#[tokio::test]
async fn deadline_ends_the_scan_done_with_partial_results() {
    let config = ScanConfig {
        supplementary_subnets: subnets(3),
        deadline: Some(Duration::from_millis(200)),
        ..base_config()
    };
    let early = Ipv4Addr::new(10, 0, 1, 1);
    let prober = FakeProber::new().server(early, &config);
    let mut h = harness(config, FakeInspector::with(Vec::new()), prober);

    let report = h.coordinator.scan().await.unwrap();

    assert_eq!(report.state, ScanState::Done);
    assert_eq!(report.progress.total, 30);
    assert!(report.progress.scanned < report.progress.total, "{:?}", report.progress);
    assert_eq!(report.progress.segments_done, 0);
    assert_eq!(server_ips(&report), vec![early]);
    assert!(h.prober.probed().iter().all(|ip| ip.octets()[2] == 1));
    assert!(report.elapsed < Duration::from_secs(2), "{:?}", report.elapsed);
}
