/// Converts a size in bytes to a short human-readable string such as "2.5 MB".
pub fn human_readable_size(size_in_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match size_in_bytes {
        s if s < KB => format!("{} bytes", s),
        s if s < MB => format!("{:.1} KB", s as f64 / KB as f64),
        s if s < GB => format!("{:.1} MB", s as f64 / MB as f64),
        s => format!("{:.2} GB", s as f64 / GB as f64),
    }
}
