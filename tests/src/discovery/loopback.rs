use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lanprobe_common::config::{ScanConfig, ServicePorts};
use lanprobe_common::network::segment::{PriorityTier, ScanMode, SegmentClassifier, SubnetPrefix};
use lanprobe_common::scanning::ScanState;
use lanprobe_core::ScanCoordinator;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::support::{FakeInspector, rule};

const LISTING: &str = r#"{"named_endpoints":{"/change_choices":{"parameters":[]}},"unnamed_endpoints":{}}"#;

/// Accepts connections forever. Connections that send a request get `body`
/// back as JSON; bare connects (port probes) are dropped.
async fn serve(body: Option<&'static str>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let read = stream.read(&mut buf).await.unwrap_or(0);
                if read == 0 {
                    return;
                }
                let Some(body) = body else {
                    return;
                };
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    port
}

/// Reads the request and then holds the connection without answering.
async fn serve_silent() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(stream);
            });
        }
    });

    port
}

/// Scans only 127.0.0.1 with the real TCP prober and HTTP identity check.
fn loopback_coordinator(primary: u16, secondary: u16) -> ScanCoordinator {
    let config = ScanConfig {
        timeout: Duration::from_secs(1),
        max_threads: 4,
        fast_host_limit: 1,
        ports: ServicePorts { primary, secondary },
        fallback_subnets: Vec::new(),
        supplementary_subnets: vec![SubnetPrefix::new(127, 0, 0)],
        ..ScanConfig::default()
    };
    let classifier = SegmentClassifier::new(vec![rule("127", PriorityTier::High, ScanMode::Fast)]);

    ScanCoordinator::new(config)
        .with_classifier(classifier)
        .with_inspector(Arc::new(FakeInspector::with(Vec::new())))
}

#[tokio::test]
async fn loopback_server_is_discovered() {
    let primary = serve(Some(LISTING)).await;
    let secondary = serve(None).await;
    let mut coordinator = loopback_coordinator(primary, secondary);

    let report = coordinator.scan().await.unwrap();

    assert_eq!(report.state, ScanState::Done);
    assert_eq!(report.servers.len(), 1);
    let server = &report.servers[0];
    assert_eq!(server.ip(), Ipv4Addr::LOCALHOST);
    assert_eq!(server.primary_port(), primary);
    assert_eq!(server.secondary_port(), secondary);
    assert_eq!(server.web_url(), format!("http://127.0.0.1:{primary}/"));
}

#[tokio::test]
async fn loopback_service_with_wrong_listing_is_rejected() {
    let primary = serve(Some(r#"{"named_endpoints":{"/predict":{}}}"#)).await;
    let secondary = serve(None).await;
    let mut coordinator = loopback_coordinator(primary, secondary);

    let report = coordinator.scan().await.unwrap();

    assert_eq!(report.state, ScanState::Done);
    assert!(report.servers.is_empty());
    assert_eq!(report.progress.scanned, 1);
}

#[tokio::test]
async fn loopback_with_secondary_port_closed_is_rejected() {
    let primary = serve(Some(LISTING)).await;
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut coordinator = loopback_coordinator(primary, closed);

    let report = coordinator.scan().await.unwrap();
    assert!(report.servers.is_empty());
}

#[tokio::test]
async fn loopback_service_that_never_answers_is_rejected_in_time() {
    let primary = serve_silent().await;
    let secondary = serve(None).await;
    let mut coordinator = loopback_coordinator(primary, secondary);
    let bound = coordinator.config().probe_bound();

    let started = Instant::now();
    let report = coordinator.scan().await.unwrap();

    assert!(report.servers.is_empty());
    assert_eq!(report.progress.scanned, 1);
    assert!(started.elapsed() < bound * 2, "{:?}", started.elapsed());
}

#[tokio::test]
async fn single_loopback_host_is_verified() {
    let primary = serve(Some(LISTING)).await;
    let secondary = serve(None).await;
    let coordinator = loopback_coordinator(primary, secondary);

    let server = coordinator.verify_host(Ipv4Addr::LOCALHOST).await.unwrap().unwrap();
    assert_eq!(server.primary_port(), primary);
    assert_eq!(server.secondary_port(), secondary);
}
