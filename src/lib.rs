//! Secure file shredding: multi-pass overwrite, verification and unlink,
//! plus the filter pipeline that selects which files to shred.

pub mod config;
pub mod core;
pub mod utils;
