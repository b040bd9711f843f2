// Global configuration constants - single source of truth

pub struct Config;

impl Config {
    // Fetch queue
    pub const MAX_CONCURRENT_FETCHES: usize = 3;
    pub const MIN_REQUEST_SPACING_MS: u64 = 1000;
    pub const MAX_RETRIES: u32 = 5;
    pub const IN_FLIGHT_POLL_MS: u64 = 100;

    // Rate-limit (HTTP 429) backoff regime
    pub const RATE_LIMIT_BASE_DELAY_MS: u64 = 2000;
    pub const RATE_LIMIT_MAX_DELAY_MS: u64 = 30_000;

    // HTTP/Network config
    pub const FETCH_TIMEOUT_SECS: u64 = 10;
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const MAX_CONTENT_SIZE: usize = 10 * 1024 * 1024; // 10MB
    pub const USER_AGENT: &'static str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    // Resolver policy
    pub const SCAN_DEADLINE_SECS: u64 = 30;
    pub const MAX_LEAF_URLS: usize = 100;
    pub const CHILD_SITEMAP_PAUSE_MS: u64 = 1000;
    pub const CLASSIFY_BATCH_SIZE: usize = 5;
    pub const BATCH_PAUSE_MS: u64 = 500;
}
