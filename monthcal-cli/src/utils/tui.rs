use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner shown while waiting on the server.
pub fn create_spinner(message: String) -> ProgressBar {
    let style = ProgressStyle::with_template("{msg} {spinner}")
        .map(|style| style.tick_strings(&["-", "\\", "|", "/", "-"]))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let spinner = ProgressBar::new_spinner().with_style(style);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
