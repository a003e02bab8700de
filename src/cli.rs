//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::blur::{BlurMethod, Region};
use crate::config::CliOverrides;
use crate::text::{LabelSet, PlaceholderStyle, DEFAULT_REPLACEMENT};

/// Rule-based PII redaction for text and images
#[derive(Parser, Debug)]
#[command(name = "pii-redactor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./pii-redactor.toml or the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Worker threads for parallel scoring
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Redact PII in a string or text file
    Text(TextArgs),
    /// Replace matches of a custom pattern file
    Pattern(PatternArgs),
    /// Blur explicit regions in one or more images
    Blur(BlurArgs),
    /// Redact an image from a grayscale saliency heatmap
    Mask(MaskArgs),
    /// Show version, system and config information
    Info,
}

/// Text to read: inline argument or `--file`
#[derive(Args, Debug)]
pub struct TextInput {
    /// Inline text
    #[arg(conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TextArgs {
    #[command(flatten)]
    pub input: TextInput,

    /// Only redact these labels (comma separated)
    #[arg(short, long)]
    pub labels: Option<LabelSet>,

    /// Placeholder style: tags or block
    #[arg(short, long)]
    pub style: Option<PlaceholderStyle>,

    /// Give identical entities the same number
    #[arg(short, long)]
    pub unique: bool,

    /// Custom pattern file (JSON component list)
    #[arg(long)]
    pub pattern: Option<PathBuf>,

    /// Label used for custom pattern matches
    #[arg(long, default_value = "CUSTOM")]
    pub pattern_label: String,

    /// Precomputed model spans (JSON array of {start, end, label, score})
    #[arg(long)]
    pub spans: Option<PathBuf>,

    /// Print the resolved spans as JSON instead of the redacted text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PatternArgs {
    /// Pattern file (JSON component list)
    pub pattern: PathBuf,

    #[command(flatten)]
    pub input: TextInput,

    /// Replacement for every match
    #[arg(short, long, default_value = DEFAULT_REPLACEMENT)]
    pub replacement: String,

    /// Print the compiled regular expression and exit
    #[arg(long)]
    pub show_regex: bool,
}

/// Blur method and strength shared by the image commands
#[derive(Args, Debug)]
pub struct BlurMethodArgs {
    /// Blur method: gaussian or mosaic
    #[arg(short, long)]
    pub method: Option<BlurMethod>,

    /// Gaussian kernel size or mosaic block size
    #[arg(long)]
    pub strength: Option<u32>,
}

#[derive(Args, Debug)]
pub struct BlurArgs {
    /// Input images
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Region to blur as x,y,width,height (repeatable)
    #[arg(short, long = "region", required = true)]
    pub regions: Vec<Region>,

    /// Output directory
    #[arg(short, long, default_value = "./redacted")]
    pub output: PathBuf,

    #[command(flatten)]
    pub blur: BlurMethodArgs,
}

#[derive(Args, Debug)]
pub struct MaskArgs {
    /// Input image
    pub input: PathBuf,

    /// Grayscale heatmap with the same size as the input
    #[arg(long)]
    pub heatmap: PathBuf,

    /// Output image path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Fraction of the heatmap to redact, in (0, 1]
    #[arg(short = 'p', long)]
    pub top_fraction: Option<f32>,

    /// Dilation kernel size (0 disables)
    #[arg(short, long)]
    pub dilate: Option<u32>,

    /// Mask mode: regions, pixels or pixels:<size>
    #[arg(long)]
    pub mode: Option<String>,

    #[command(flatten)]
    pub blur: BlurMethodArgs,
}

impl Cli {
    /// Overrides for values the user actually passed
    pub fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides::new();
        overrides.threads = self.threads;

        match &self.command {
            Commands::Text(args) => {
                overrides.labels = args.labels.clone();
                overrides.style = args.style;
                if args.unique {
                    overrides.unique_ids = Some(true);
                }
            }
            Commands::Blur(args) => {
                overrides.blur_method = args.blur.method;
                overrides.blur_strength = args.blur.strength;
            }
            Commands::Mask(args) => {
                overrides.top_fraction = args.top_fraction;
                overrides.dilate = args.dilate;
                overrides.mode = args.mode.clone();
                overrides.blur_method = args.blur.method;
                overrides.blur_strength = args.blur.strength;
            }
            Commands::Pattern(_) | Commands::Info => {}
        }

        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_text() {
        let cli = Cli::try_parse_from([
            "pii-redactor",
            "-vv",
            "text",
            "mail jo@example.com",
            "--labels",
            "email,phone",
            "--style",
            "block",
            "--unique",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let overrides = cli.overrides();
        assert_eq!(overrides.style, Some(PlaceholderStyle::Block));
        assert_eq!(overrides.unique_ids, Some(true));
        assert!(overrides.labels.unwrap().contains("EMAIL"));

        match cli.command {
            Commands::Text(args) => {
                assert_eq!(args.input.text.as_deref(), Some("mail jo@example.com"));
                assert_eq!(args.pattern_label, "CUSTOM");
            }
            _ => panic!("expected text command"),
        }
    }

    #[test]
    fn test_parse_blur_regions() {
        let cli = Cli::try_parse_from([
            "pii-redactor",
            "blur",
            "a.png",
            "b.png",
            "-r",
            "1,2,3,4",
            "-r",
            "10,10,5,5",
            "--method",
            "mosaic",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.blur_method, Some(BlurMethod::Mosaic));
        assert_eq!(overrides.blur_strength, None);

        match cli.command {
            Commands::Blur(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(
                    args.regions,
                    vec![Region::new(1, 2, 3, 4), Region::new(10, 10, 5, 5)]
                );
            }
            _ => panic!("expected blur command"),
        }
    }

    #[test]
    fn test_rejects_bad_region() {
        let result = Cli::try_parse_from(["pii-redactor", "blur", "a.png", "-r", "1,2,3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_mask_defaults_leave_config_alone() {
        let cli = Cli::try_parse_from([
            "pii-redactor",
            "mask",
            "in.png",
            "--heatmap",
            "heat.png",
            "-o",
            "out.png",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.top_fraction, None);
        assert_eq!(overrides.dilate, None);
        assert_eq!(overrides.mode, None);
    }
}
