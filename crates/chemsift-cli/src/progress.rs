//! Terminal progress bars. Drawn to stderr and hidden when it is not a terminal.

use std::path::Path;
use std::time::Duration;

use chemsift_ingestion::filter::FilterObserver;
use chemsift_ingestion::models::{FileOutcome, FilterSummary};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

pub fn make_progress_bar(len: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr_with_hz(12));
    pb.set_style(
        ProgressStyle::with_template(&format!(
            "{{spinner:.cyan}} [{{elapsed_precise}}] {{bar:30}} {{pos}}/{{len}} {unit} ({{eta}}) {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Shows per-document progress for one filter run.
#[derive(Default)]
pub struct FilterProgress {
    bar: Option<ProgressBar>,
    retained: usize,
}

impl FilterObserver for FilterProgress {
    fn on_start(&mut self, total: usize) {
        self.bar = Some(make_progress_bar(total as u64, "docs"));
    }

    fn on_file(&mut self, _path: &Path, outcome: &FileOutcome) {
        if matches!(outcome, FileOutcome::Retained(_)) {
            self.retained += 1;
        }
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{} kept", self.retained));
            bar.inc(1);
        }
    }

    fn on_finish(&mut self, summary: &FilterSummary) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(format!(
                "{} kept, {} discarded, {} errors",
                summary.retained, summary.discarded, summary.errors
            ));
        }
    }
}
