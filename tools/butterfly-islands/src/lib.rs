//! Routing island and lonely way detection for OpenStreetMap extracts.
//!
//! A [`Network`] snapshot is loaded from PBF (or built in memory with
//! [`NetworkBuilder`]) and handed to a [`RoutingIslandDetector`], which
//! reports:
//!
//! - **lonely ways**: routable ways sharing no vertex with any other way
//! - **routing islands**: groups of ways a transport mode cannot reach from,
//!   or cannot leave to, the boundary of the loaded area
//! - **stub ends**: very short dangling ends on highways
//!
//! ```no_run
//! use butterfly_islands::{load_pbf, AccessModel, Bounds, DetectorConfig, RoutingIslandDetector};
//!
//! # fn main() -> Result<(), butterfly_islands::IslandsError> {
//! let bounds: Bounds = "50.80,4.30,50.90,4.45".parse()?;
//! let network = load_pbf("brussels.osm.pbf", &[bounds])?;
//! let model = AccessModel::standard();
//! let config = DetectorConfig::default();
//! for finding in RoutingIslandDetector::new(&model, &config).run(&network) {
//!     println!("{}", finding.to_record(&network));
//! }
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod cli;
pub mod components;
pub mod config;
pub mod detector;
pub mod error;
pub mod finding;
pub mod fixpoint;
pub mod ingest;
pub mod network;
pub mod oneway;
pub mod reachability;
pub mod restrictions;
pub mod stub_ends;

pub use access::{default_access, AccessModel, AccessState, AccessTable};
pub use config::DetectorConfig;
pub use detector::{Directionality, Island, Report, RoutingIslandDetector};
pub use error::{AnalysisError, IslandsError};
pub use finding::{ErrorCode, Finding, FindingRecord, Severity, SeverityTable};
pub use ingest::load_pbf;
pub use network::{Bounds, EdgeId, Network, NetworkBuilder, Tags, VertexId};
pub use oneway::{entry_vertex, exit_vertex, oneway_direction, Oneway};
pub use restrictions::RestrictionIndex;
pub use stub_ends::StubEndDetector;
