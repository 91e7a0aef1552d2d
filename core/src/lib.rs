//! Discovery engine for `lanprobe`: port probes, host verification, the
//! scan coordinator and the duration estimate.

pub mod estimate;
pub mod network;
pub mod scanner;
pub mod system;
pub mod verifier;

pub use estimate::{estimate_duration, estimate_for};
pub use network::identity::{HttpIdentityCheck, IdentityCheck, IdentityError};
pub use network::tcp::{Prober, TcpConnectProber};
pub use scanner::{ScanCoordinator, ScanPlan, scan};
pub use system::PnetAdapterInspector;
pub use tokio_util::sync::CancellationToken;
pub use verifier::HostVerifier;
