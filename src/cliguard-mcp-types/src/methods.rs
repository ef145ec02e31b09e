//! MCP method name constants.

// Lifecycle
/// Initialize method.
pub const INITIALIZE: &str = "initialize";
/// Initialized notification.
pub const INITIALIZED: &str = "notifications/initialized";
/// Cancelled notification.
pub const CANCELLED: &str = "notifications/cancelled";

// Tools
/// List tools method.
pub const TOOLS_LIST: &str = "tools/list";
/// Call tool method.
pub const TOOLS_CALL: &str = "tools/call";

// Ping
/// Ping method.
pub const PING: &str = "ping";
