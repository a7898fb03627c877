/// Application constants

pub const API_VERSION: &str = "v1";

// Chain-native currency fixed-point convention (BNB/WBNB)
pub const NATIVE_DECIMALS: u32 = 18;

// Per-field treasury read timeout; a timed-out read defaults to zero
pub const TREASURY_FIELD_TIMEOUT_SECS: u64 = 5;

// Leaderboard page size
pub const LEADERBOARD_LIMIT: i64 = 10;
