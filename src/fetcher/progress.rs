//! Phase progress bars.

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a bar for `total` items, or a hidden one when `visible` is false.
pub(crate) fn phase_bar(visible: bool, total: usize, label: &'static str) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg:>9} [{bar:30}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message(label);
    bar
}
