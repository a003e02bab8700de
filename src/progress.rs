//! Progress reporting for redaction runs
//!
//! Two layers: [`ProgressCallback`] is what library code calls while it
//! works (occlusion cells, batch items), and [`ProgressTracker`] is the
//! human-facing per-file display used by the CLI.

use std::fmt;
use std::io::{self, Write};
use std::time::Instant;

// ============================================================
// Progress Callback
// ============================================================

/// Hooks invoked by long-running library operations
///
/// Every method has an empty default so implementors only override what they
/// display. Implementations must be `Sync` because occlusion cells may be
/// scored on a worker pool.
pub trait ProgressCallback: Sync {
    /// A named step started
    fn on_step_start(&self, _step: &str) {}

    /// `current` of `total` units of the running step are done
    fn on_step_progress(&self, _current: usize, _total: usize) {}

    /// A named step finished with a short summary message
    fn on_step_complete(&self, _step: &str, _message: &str) {}

    /// Diagnostic detail
    fn on_debug(&self, _message: &str) {}
}

/// Callback that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {}

// ============================================================
// Stages
// ============================================================

/// Redaction stages shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedactionStage {
    #[default]
    Initializing,
    /// Reading the input image or text
    Loading,
    /// Running detectors (OCR, NER, classifier)
    Detecting,
    /// Occlusion saliency search
    Scoring,
    /// Thresholding and region extraction
    Masking,
    /// Blurring regions or substituting spans
    Redacting,
    /// Writing output
    Writing,
    Completed,
}

impl RedactionStage {
    pub fn name(&self) -> &'static str {
        match self {
            RedactionStage::Initializing => "Initializing",
            RedactionStage::Loading => "Loading",
            RedactionStage::Detecting => "Detecting",
            RedactionStage::Scoring => "Scoring",
            RedactionStage::Masking => "Masking",
            RedactionStage::Redacting => "Redacting",
            RedactionStage::Writing => "Writing",
            RedactionStage::Completed => "Completed",
        }
    }

    /// Short description of what happens during the stage
    pub fn description(&self) -> &'static str {
        match self {
            RedactionStage::Initializing => "preparing",
            RedactionStage::Loading => "reading input",
            RedactionStage::Detecting => "finding PII",
            RedactionStage::Scoring => "occlusion search",
            RedactionStage::Masking => "building mask",
            RedactionStage::Redacting => "applying redaction",
            RedactionStage::Writing => "saving output",
            RedactionStage::Completed => "done",
        }
    }
}

impl fmt::Display for RedactionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.description())
    }
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No output
    Quiet,
    /// Stage display only
    #[default]
    Normal,
    /// Per-unit progress
    Verbose,
    /// Everything, including item names
    VeryVerbose,
}

impl OutputMode {
    /// Create OutputMode from a `-v` count
    pub fn from_verbosity(level: u8) -> Self {
        match level {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// Check if output requiring `required` should be shown
    pub fn should_show(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        match (self, required) {
            (Quiet, _) => false,
            (Normal, Quiet | Normal) => true,
            (Verbose, Quiet | Normal | Verbose) => true,
            (VeryVerbose, _) => true,
            _ => false,
        }
    }
}

/// Progress bar width in characters
const PROGRESS_BAR_WIDTH: usize = 40;

/// Build a progress bar string
pub fn build_progress_bar(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = (percent as usize * PROGRESS_BAR_WIDTH) / 100;
    let empty = PROGRESS_BAR_WIDTH - filled;
    format!("[{}{}]", "=".repeat(filled), "-".repeat(empty))
}

// ============================================================
// Tracker
// ============================================================

/// Per-file progress display for batch redaction
#[derive(Debug)]
pub struct ProgressTracker {
    /// Current file number (1-based)
    pub current_file: usize,
    pub total_files: usize,
    pub current_filename: String,
    pub current_stage: RedactionStage,
    /// Units done in the current stage
    pub current_unit: usize,
    /// Units expected in the current stage, 0 when unknown
    pub total_units: usize,
    start_time: Instant,
    output_mode: OutputMode,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(1, OutputMode::Normal)
    }
}

impl ProgressTracker {
    pub fn new(total_files: usize, output_mode: OutputMode) -> Self {
        Self {
            current_file: 0,
            total_files,
            current_filename: String::new(),
            current_stage: RedactionStage::Initializing,
            current_unit: 0,
            total_units: 0,
            start_time: Instant::now(),
            output_mode,
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Start processing a new file
    pub fn start_file(&mut self, file_number: usize, filename: &str) {
        self.current_file = file_number;
        self.current_filename = filename.to_string();
        self.current_stage = RedactionStage::Initializing;
        self.current_unit = 0;
        self.total_units = 0;
        self.start_time = Instant::now();

        if self.output_mode.should_show(OutputMode::Normal) {
            println!(
                "[{}/{}] {}",
                self.current_file, self.total_files, self.current_filename
            );
        }
    }

    /// Enter a stage; `total_units` of 0 keeps the previous total
    pub fn set_stage(&mut self, stage: RedactionStage, total_units: usize) {
        self.current_stage = stage;
        if total_units > 0 {
            self.total_units = total_units;
        }
        self.current_unit = 0;

        if self.output_mode.should_show(OutputMode::Verbose) {
            println!("  Stage: {}", self.current_stage);
        }
    }

    /// Update unit progress within the current stage
    pub fn update(&mut self, unit: usize) {
        self.current_unit = unit;

        if self.output_mode.should_show(OutputMode::Verbose) && self.total_units > 0 {
            let percent = ((unit as f64 / self.total_units as f64) * 100.0) as u8;
            print!(
                "\r    {} {:3}% ({}/{})",
                build_progress_bar(percent),
                percent,
                unit,
                self.total_units
            );
            let _ = io::stdout().flush();
        }
    }

    /// Mark the current file as complete with a one-line summary
    pub fn complete_file(&mut self, summary: &str) {
        self.current_stage = RedactionStage::Completed;

        if self.output_mode.should_show(OutputMode::Normal) {
            println!("  {} in {:.2}s", summary, self.elapsed_secs());
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Print final batch summary
    pub fn print_summary(total_files: usize, ok_count: usize, error_count: usize) {
        println!();
        println!("{}", "=".repeat(60));
        println!("Redaction Summary");
        println!("{}", "=".repeat(60));
        println!("  Total files:  {}", total_files);
        println!("  Succeeded:    {}", ok_count);
        println!("  Errors:       {}", error_count);
        println!("{}", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_tracker_new() {
        let tracker = ProgressTracker::new(5, OutputMode::Normal);
        assert_eq!(tracker.total_files, 5);
        assert_eq!(tracker.current_file, 0);
        assert_eq!(tracker.current_stage, RedactionStage::Initializing);
    }

    #[test]
    fn test_start_file_resets_units() {
        let mut tracker = ProgressTracker::new(3, OutputMode::Quiet);
        tracker.total_units = 40;
        tracker.current_unit = 12;
        tracker.start_file(2, "scan.png");
        assert_eq!(tracker.current_file, 2);
        assert_eq!(tracker.current_filename, "scan.png");
        assert_eq!(tracker.total_units, 0);
        assert_eq!(tracker.current_unit, 0);
    }

    #[test]
    fn test_set_stage_keeps_total_when_zero() {
        let mut tracker = ProgressTracker::new(1, OutputMode::Quiet);
        tracker.set_stage(RedactionStage::Scoring, 64);
        assert_eq!(tracker.total_units, 64);
        tracker.set_stage(RedactionStage::Masking, 0);
        assert_eq!(tracker.total_units, 64);
        assert_eq!(tracker.current_stage, RedactionStage::Masking);
    }

    #[test]
    fn test_complete_file() {
        let mut tracker = ProgressTracker::new(1, OutputMode::Quiet);
        tracker.start_file(1, "a.png");
        tracker.update(3);
        tracker.complete_file("3 regions");
        assert_eq!(tracker.current_stage, RedactionStage::Completed);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(
            RedactionStage::Scoring.to_string(),
            "Scoring (occlusion search)"
        );
        assert_eq!(RedactionStage::default(), RedactionStage::Initializing);
    }

    #[test]
    fn test_build_progress_bar() {
        assert_eq!(
            build_progress_bar(0),
            "[----------------------------------------]"
        );
        assert_eq!(
            build_progress_bar(50),
            "[====================--------------------]"
        );
        // Over 100 is clamped
        assert_eq!(
            build_progress_bar(150),
            "[========================================]"
        );
    }

    #[test]
    fn test_output_mode_levels() {
        assert_eq!(OutputMode::from_verbosity(0), OutputMode::Normal);
        assert_eq!(OutputMode::from_verbosity(1), OutputMode::Verbose);
        assert_eq!(OutputMode::from_verbosity(9), OutputMode::VeryVerbose);

        assert!(!OutputMode::Quiet.should_show(OutputMode::Quiet));
        assert!(OutputMode::Normal.should_show(OutputMode::Normal));
        assert!(!OutputMode::Normal.should_show(OutputMode::Verbose));
        assert!(OutputMode::VeryVerbose.should_show(OutputMode::VeryVerbose));
    }

    #[test]
    fn test_callback_defaults_are_noops() {
        struct Counting(AtomicUsize);
        impl ProgressCallback for Counting {
            fn on_step_progress(&self, _current: usize, _total: usize) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let counting = Counting(AtomicUsize::new(0));
        counting.on_step_start("x");
        counting.on_step_progress(1, 2);
        counting.on_step_complete("x", "ok");
        assert_eq!(counting.0.load(Ordering::Relaxed), 1);

        SilentProgress.on_step_progress(1, 1);
    }
}
