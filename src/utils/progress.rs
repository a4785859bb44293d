//! Progress bar helpers that become no-ops when the `progress` feature is disabled

#[cfg(feature = "progress")]
pub use indicatif::ProgressBar;
#[cfg(feature = "progress")]
use indicatif::ProgressStyle;

/// Bar tracking bytes consumed from an input of `len` bytes
#[cfg(feature = "progress")]
pub fn byte_bar(len: u64, enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
    {
        bar.set_style(style.progress_chars("█▓▒░  "));
    }
    Some(bar)
}

/// Spinner for a step of unknown length
#[cfg(feature = "progress")]
pub fn spinner(message: &'static str, enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(std::time::Duration::from_millis(80));
    Some(bar)
}

#[cfg(not(feature = "progress"))]
pub fn byte_bar(_len: u64, _enabled: bool) -> Option<ProgressBar> {
    None
}

#[cfg(not(feature = "progress"))]
pub fn spinner(_message: &'static str, _enabled: bool) -> Option<ProgressBar> {
    None
}

/// Stand-in for the indicatif bar; never constructed
#[cfg(not(feature = "progress"))]
pub struct ProgressBar;

#[cfg(not(feature = "progress"))]
impl ProgressBar {
    pub fn inc(&self, _delta: u64) {}
    pub fn finish_with_message(&self, _msg: String) {}
}
