use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "evperiod",
    version,
    about = "Per-pixel period estimation for event-camera recordings",
    long_about = "Reconstruct brightness from ON/OFF events with a two-stage IIR filter\n\
                  and estimate oscillation periods per pixel.\n\
                  Event files hold one 'timestamp_ns polarity [pixel]' record per line."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Estimate periods for the pixels of one event file
    Run(RunArgs),
    /// Run the same analysis over many event files
    Batch(BatchArgs),
    /// Show filter poles and frequency response for a cutoff period
    Poles(PolesArgs),
    /// List available period estimators
    Estimators(EstimatorsArgs),
    /// Validate an event file
    Validate(ValidateArgs),
}

/// Analysis parameters shared by `run` and `batch`
#[derive(Args, Clone, Debug, Default)]
pub struct AnalysisArgs {
    /// JSON analysis config; the flags below override its fields
    #[arg(long)]
    pub config: Option<String>,

    /// Cutoff period T in events (samples)
    #[arg(long)]
    pub cutoff_period: Option<f64>,

    /// Noise filter flip-back window in ns
    #[arg(long)]
    pub pass_dt: Option<i64>,

    /// Noise filter dead time after a transition in ns (default: pass-dt)
    #[arg(long)]
    pub dead_dt: Option<i64>,

    /// Known signal frequency in Hz, enables error statistics
    #[arg(long)]
    pub ground_truth: Option<f64>,

    /// Histogram bin count per estimator
    #[arg(long)]
    pub bins: Option<usize>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Input event file
    #[arg(long)]
    pub events: String,

    /// Pixel indices to analyze (default: all)
    #[arg(long, num_args = 1.., conflicts_with = "top")]
    pub pixel: Vec<u32>,

    /// Analyze only the N most active pixels
    #[arg(long)]
    pub top: Option<usize>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input files (e.g. "recordings/*.txt")
    #[arg(long, conflicts_with = "files")]
    pub glob: Option<String>,

    /// Explicit list of input files
    #[arg(long, num_args = 1..)]
    pub files: Option<Vec<String>>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Directory for per-file JSON results (default: JSONL on stdout)
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Keep going after a file fails
    #[arg(long, default_value_t = false)]
    pub continue_on_error: bool,

    /// List matching files and exit
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Compact JSON in --output-dir files
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct PolesArgs {
    /// Cutoff period T in events (samples)
    #[arg(long)]
    pub cutoff_period: f64,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct EstimatorsArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Input event file
    #[arg(long)]
    pub events: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("evperiod").chain(args.iter().copied()))
    }

    #[test]
    fn test_run_args() {
        let cli = parse(&[
            "run",
            "--events",
            "a.txt",
            "--cutoff-period",
            "12",
            "--pass-dt",
            "1500",
            "--pixel",
            "3",
            "7",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.events, "a.txt");
                assert_eq!(args.pixel, vec![3, 7]);
                assert_eq!(args.analysis.cutoff_period, Some(12.0));
                assert_eq!(args.analysis.pass_dt, Some(1500));
                assert!(args.analysis.dead_dt.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_pixel_conflicts_with_top() {
        assert!(parse(&["run", "--events", "a", "--pixel", "1", "--top", "2"]).is_err());
    }

    #[test]
    fn test_batch_glob_conflicts_with_files() {
        assert!(parse(&["batch", "--glob", "*.txt", "--files", "a.txt"]).is_err());
        assert!(parse(&["batch", "--files", "a.txt", "b.txt", "--dry-run"]).is_ok());
    }

    #[test]
    fn test_poles_requires_cutoff() {
        assert!(parse(&["poles"]).is_err());
        assert!(parse(&["poles", "--cutoff-period", "5"]).is_ok());
    }
}
