use std::time::Duration;

/// Default caching delay reported to the media pipeline.
pub const DEFAULT_CACHING: Duration = Duration::from_millis(1000);
/// No data for this long ends the stream.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2);
/// Upper bound on a single wait for datagrams.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);
/// How long to wait for the SETUP response before giving up.
pub const DEFAULT_SETUP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct Options {
    /// Ask the server for a multicast stream instead of unicast.
    pub multicast: bool,
    /// Replaces the `sat.ip` placeholder host in stream URLs.
    pub host: Option<String>,
    /// Caching delay passed through to the consumer.
    pub caching: Duration,
    /// Receive datagrams in batches instead of one at a time.
    pub batch: bool,
    pub idle_timeout: Duration,
    pub poll_timeout: Duration,
    pub setup_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            multicast: false,
            host: None,
            caching: DEFAULT_CACHING,
            batch: true,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            setup_timeout: DEFAULT_SETUP_TIMEOUT,
        }
    }
}
