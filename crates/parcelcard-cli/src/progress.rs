use indicatif::{ProgressBar, ProgressStyle};
use parcelcard_core::ProgressReporter;

/// Terminal progress bar behind the core's reporter trait.
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .expect("valid progress bar template")
                .progress_chars("=> "),
        );
        BarReporter { bar }
    }
}

impl ProgressReporter for BarReporter {
    fn begin(&self, total: u64) {
        self.bar.reset();
        self.bar.set_length(total);
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }

    fn item_done(&self, completed: u64, _total: u64) {
        self.bar.set_position(completed);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
