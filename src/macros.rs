/// Like `tracing::info!`, but when given a starting time it also records how many
/// seconds passed between that time and now.
/// ```ignore
/// info_time!("pages: {}", 3);
/// let start = Local::now();
/// info_time!(start, "wrote {} contracts", 42);
/// ```
#[macro_export]
macro_rules! info_time {
    ($strfm:literal $(,)? $($arg:expr),*) => {{
        ::tracing::info!($strfm $(, $arg)*);
    }};
    ($time:expr, $strfm:literal $(,)? $($arg:expr),*) => {{
        let run_time = (::chrono::Local::now() - $time)
            .num_microseconds()
            .map(|n| n as f64 / 1_000_000.0)
            .unwrap_or(0.0);
        ::tracing::info!(runtime_secs = run_time, $strfm $(, $arg)*);
    }};
}
