//! Exit codes of `ota-codesign`.
//! Codes 2..=5 match `CodeSigningError::exit_code()` and are part of the public contract.

pub const SUCCESS: i32 = 0;
pub const INVALID_SIGNATURE: i32 = 1; // Signature checked and does not match
pub const CONFIG_ERROR: i32 = 2; // Bad settings, unreadable input, unknown algorithm
pub const UNCHECKED: i32 = 3; // Signature missing or malformed
pub const UNTRUSTED: i32 = 4; // Key id, certificate or chain rejected
pub const BACKEND_ERROR: i32 = 5; // Crypto backend failure
