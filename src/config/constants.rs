// * Configuration Constants
// * Central location for scoring thresholds, timeouts and defaults

// * Page fetch timeout in seconds
pub const FETCH_TIMEOUT_SECS: u64 = 15;

// * Descriptive user agent sent with every fetch
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; SEOSentinel/0.1; +https://wishesvideo.com/seo-bot)";

// * Title length window (characters)
pub const TITLE_MIN_CHARS: usize = 30;
pub const TITLE_MAX_CHARS: usize = 60;

// * Meta description length window (characters)
pub const DESCRIPTION_MIN_CHARS: usize = 120;
pub const DESCRIPTION_MAX_CHARS: usize = 160;

// * Score ceiling
pub const MAX_SCORE: u32 = 100;

// * Batch fan-out: at most this many concurrent fetches per batch
pub const BATCH_SIZE: usize = 5;

// * Pause between batches in milliseconds
pub const BATCH_PAUSE_MS: u64 = 1_000;

// * Steady-state request rate used by the politeness limiter
pub const REQUESTS_PER_SECOND: u32 = 5;

// * Upper bound for discovered URLs per domain
pub const MAX_DISCOVERED_URLS: usize = 50;

// * Bounded in-memory history
pub const HISTORY_CAPACITY: usize = 500;
pub const ALERT_CAPACITY: usize = 200;

// * Retention windows in days
pub const RETENTION_REPORTS_DAYS: u64 = 90;
pub const RETENTION_RAW_DAYS: u64 = 30;
pub const RETENTION_ALERTS_DAYS: u64 = 7;

// * Alert thresholds
pub const LOW_SCORE_THRESHOLD: u8 = 60;
pub const SCORE_DROP_THRESHOLD: u8 = 10;
pub const ERROR_RATE_THRESHOLD: f64 = 0.10;
