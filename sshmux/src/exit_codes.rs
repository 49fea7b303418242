//! Stable exit codes for sshmux commands.

/// Command succeeded, or the user cancelled at a menu.
pub const OK: i32 = 0;
/// An external program or the multiplexer failed.
pub const FAILURE: i32 = 1;
/// The requested layout does not exist.
pub const NOT_FOUND: i32 = 2;
/// Required programs are missing and could not be installed.
pub const MISSING_DEPENDENCY: i32 = 3;
/// Layout names, layout records, or configuration values were unusable.
pub const INVALID_INPUT: i32 = 4;
