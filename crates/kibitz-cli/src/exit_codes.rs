//! Exit codes shared by all subcommands.

pub const SUCCESS: i32 = 0;
pub const COMMAND_FAILED: i32 = 1; // Evaluation failed, or engines unhealthy
pub const INTERNAL_ERROR: i32 = 2; // Setup failed (bad engine binary, unreadable input)
