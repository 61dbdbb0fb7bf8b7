//! Common constants used throughout the bunnyddns application

//==============================================================================
// bunny.net API Constants
//==============================================================================

/// bunny.net API base URL
pub const BUNNY_API_BASE: &str = "https://api.bunny.net";

/// User agent string for outgoing HTTP requests
pub const USER_AGENT: &str = "bunnyddns/1.0";

/// Header carrying the bunny.net account access key
pub const ACCESS_KEY_HEADER: &str = "AccessKey";

/// bunny.net numeric record type for A records
pub const DNS_RECORD_TYPE_A: u8 = 0;

/// bunny.net numeric record type for AAAA records
pub const DNS_RECORD_TYPE_AAAA: u8 = 1;

/// Page size requested when listing DNS zones
pub const ZONE_PAGE_SIZE: u32 = 1000;

/// Upper bound on zone list pages fetched in a single discovery
pub const MAX_ZONE_PAGES: u32 = 100;

//==============================================================================
// Timeout Constants
//==============================================================================

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Minimum HTTP request timeout in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Maximum HTTP request timeout in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;

//==============================================================================
// State File Constants
//==============================================================================

/// Default state file name, resolved next to the executable
pub const DEFAULT_STATE_FILE_NAME: &str = "DDNS_BUNNY_CONFIG.json";

/// Suffix appended to the state file path for the run lock
pub const LOCK_FILE_SUFFIX: &str = ".lock";

/// Age after which a leftover lock file is considered stale
pub const STALE_LOCK_SECS: u64 = 600;

//==============================================================================
// Validation Constants
//==============================================================================

/// Maximum DNS hostname length in characters
pub const MAX_HOSTNAME_LENGTH: usize = 253;

/// Maximum DNS label length in characters
pub const MAX_LABEL_LENGTH: usize = 63;

//==============================================================================
// Environment Variable Names
//==============================================================================

/// Environment variable name for the bunny.net access key
pub const ENV_ACCESS_KEY: &str = "BUNNY_ACCESS_KEY";

/// Environment variable name for the hostname to keep updated
pub const ENV_HOSTNAME: &str = "NAS_URL";

/// Environment variable name for a pre-known DNS zone id
pub const ENV_ZONE_ID: &str = "BUNNY_DNS_ZONE_ID";

/// Environment variable name for a pre-known DNS record id
pub const ENV_RECORD_ID: &str = "BUNNY_DNS_RECORD_ID";

/// Environment variable name for the state file path
pub const ENV_STATE_FILE: &str = "BUNNYDDNS_STATE_FILE";

/// Environment variable name for the HTTP timeout in seconds
pub const ENV_TIMEOUT: &str = "BUNNYDDNS_TIMEOUT";

/// Environment variable name for the bunny.net API base URL
pub const ENV_API_BASE: &str = "BUNNYDDNS_API_BASE";

/// Environment variable name to enable verbose logging
pub const ENV_VERBOSE: &str = "BUNNYDDNS_VERBOSE";
