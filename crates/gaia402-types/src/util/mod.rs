//! Helper types shared across the workspace.

mod b64;

pub use b64::Base64Bytes;
