//! Terminal output: color decisions, the verification spinner, and
//! rendering of redemption outcomes as text or JSON.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde_json::json;

use tunnely_core::VoucherSubmission;

use crate::cli::ColorMode;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Spinner shown on stderr while a voucher is being verified.
///
/// Hidden when stderr is not a terminal or output is suppressed.
pub fn verifying_spinner(quiet: bool) -> ProgressBar {
    if quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.magenta} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Verifying voucher...");
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Human-readable success line.
pub fn render_success(voucher: &str, submission: &VoucherSubmission, color: bool) -> String {
    let mark = "✓";
    if color {
        format!(
            "{} Voucher {} redeemed\n  {}",
            mark.green().bold(),
            voucher.cyan(),
            submission.description
        )
    } else {
        format!("{mark} Voucher {voucher} redeemed\n  {}", submission.description)
    }
}

/// JSON success document.
pub fn render_success_json(voucher: &str, submission: &VoucherSubmission) -> String {
    json!({
        "voucher": voucher,
        "redeemed": true,
        "time_added": submission.time_added,
        "description": submission.description,
    })
    .to_string()
}

/// JSON failure document; the exit code still reports the failure.
pub fn render_failure_json(voucher: &str, message: &str) -> String {
    json!({
        "voucher": voucher,
        "redeemed": false,
        "error": message,
    })
    .to_string()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
