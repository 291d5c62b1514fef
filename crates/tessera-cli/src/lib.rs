use tessera_api_client::UploadProgress;

/// Human-readable byte count using binary units, e.g. `1.5 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// One-line progress summary for a finished chunk.
pub fn describe_progress(progress: &UploadProgress) -> String {
    format!(
        "{} chunk {}/{} ({} of {}, {:.0}%)",
        progress.file_name,
        progress.chunk_index + 1,
        progress.total_chunks,
        format_bytes(progress.bytes_sent),
        format_bytes(progress.total_bytes),
        progress.percent()
    )
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
