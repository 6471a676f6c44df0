// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "5000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";
pub const LOCAL_DB_FILE: &str = "rieno.db";

// Session configuration
pub const SESSION_COOKIE_NAME: &str = "auth_token";
pub const SESSION_EXPIRY_DAYS: i64 = 7;
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;

// Demo account
pub const DEMO_USER_EMAIL: &str = "demo@rieno.app";
pub const DEFAULT_DEMO_PASSWORD: &str = "rieno-demo";

// Listing limits and defaults
pub const DEFAULT_ENTRIES_LIMIT: u32 = 500;
pub const MAX_LIMIT: u32 = 1000;
pub const MAX_OFFSET: u32 = 1_000_000;

// Validation limits
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;
pub const MAX_PRODUCT_NAME_LENGTH: usize = 255;
pub const MAX_NOTES_LENGTH: usize = 1000;
pub const MAX_DEBT_NAME_LENGTH: usize = 255;
pub const MAX_DEBT_REASON_LENGTH: usize = 500;
pub const MAX_SEARCH_TERM_LENGTH: usize = 100;

// Reports
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";
pub const UNCATEGORIZED_COLOR: &str = "#6B7280";
pub const DEFAULT_CATEGORY_COLOR: &str = "#10B981";
pub const TOP_CATEGORIES_LIMIT: usize = 8;
pub const RECENT_ENTRIES_LIMIT: usize = 3;

// Error messages
pub const ERR_INTERNAL: &str = "Internal server error";
pub const ERR_TOKEN_REQUIRED: &str = "Access token required";
pub const ERR_INVALID_TOKEN: &str = "Invalid or expired token";
pub const ERR_INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const ERR_ALREADY_REGISTERED: &str = "User already registered";
