//! Service constants
//!
//! Endpoint paths, defaults and rate-limit figures shared across the crate.

use std::time::Duration;

/// Default service base URL (all paths below are relative to it)
pub const DEFAULT_BASE_URL: &str = "https://rxn.res.ibm.com/rxn/api/api/v1";

/// Default retrosynthesis model identifier
pub const DEFAULT_MODEL_ID: &str = "2019-09-12";

/// Minimum spacing between two polls of the same resource
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Max requests allowed by the service per rate-limit window
pub const MAX_REQUESTS_PER_WINDOW: usize = 5;

/// Rate-limit window duration
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Project collection
pub const PROJECTS_PATH: &str = "/projects";

/// Retrosynthesis prediction collection
pub const PREDICTIONS_PATH: &str = "/retrosynthesis/predictions";

/// Synthesis collection
pub const SYNTHESES_PATH: &str = "/syntheses";

/// Synthesis execution collection
pub const EXECUTIONS_PATH: &str = "/executions";
