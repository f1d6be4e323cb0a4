pub mod file_detection;
pub mod format;
pub mod test_helpers;

pub use format::human_readable_size;
