use std::path::PathBuf;

/// Process-wide configuration, loaded once at startup from the environment.
///
/// Proxy credentials live in the profiles file, not here; see
/// [`crate::inputs::Profile`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the local browser-automation service that issues session
    /// cookies per profile.
    pub browser_api_url: String,
    /// Base URL of the target site. Overridable so tests can point the
    /// crawler at a mock server.
    pub site_base_url: String,
    pub log_level: String,
    pub profiles_path: PathBuf,
    /// Directory the snapshot artifacts are written into.
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    /// Attempts per page request before the run is aborted. At least 1.
    pub retry_attempts: u32,
    /// Pause between successive page requests of one unit. Zero disables
    /// pacing.
    pub inter_request_delay_ms: u64,
}
