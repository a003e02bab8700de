//! pii-redactor - Rule-based PII redaction for text and images
//!
//! CLI entry point

use clap::Parser;
use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};

use pii_redactor::cli::TextInput;
use pii_redactor::config::{LOCAL_CONFIG_FILE, USER_CONFIG_FILE};
use pii_redactor::{
    exit_codes,
    // CLI
    BlurArgs, Cli, Commands, MaskArgs, PatternArgs, TextArgs,
    // Config
    Config, ConfigError,
    // Engines
    BlurError, CustomPattern, CustomPatternDetector, JsonSpanDetector, LocationRedactionPipeline,
    RegexDetector, RegionBlur, SaliencyMap, TextError, TextRedactor,
    // Progress tracking
    OutputMode, ProgressTracker, RedactionStage,
};

type CliResult = Result<(), Box<dyn Error>>;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(&cli).and_then(|config| match &cli.command {
        Commands::Text(args) => run_text(args, &config),
        Commands::Pattern(args) => run_pattern(args),
        Commands::Blur(args) => run_blur(args, &config, cli.verbose),
        Commands::Mask(args) => run_mask(args, &config),
        Commands::Info => run_info(&config),
    });

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_code_for(e.as_ref())
        }
    });
}

/// Install the stderr log subscriber
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code_for(error: &(dyn Error + 'static)) -> i32 {
    if matches!(
        error.downcast_ref::<TextError>(),
        Some(TextError::InputNotFound(_))
    ) || matches!(
        error.downcast_ref::<BlurError>(),
        Some(BlurError::ImageNotFound(_))
    ) {
        exit_codes::INPUT_NOT_FOUND
    } else if error.downcast_ref::<ConfigError>().is_some() {
        exit_codes::INVALID_ARGS
    } else {
        exit_codes::GENERAL_ERROR
    }
}

// ============ Config ============

/// Load the config file, apply CLI overrides and size the rayon pool
fn load_config(cli: &Cli) -> Result<Config, Box<dyn Error>> {
    let file_config = match &cli.config {
        Some(path) => match Config::load_from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        },
        None => Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable config file");
            Config::default()
        }),
    };

    // CLI takes precedence over the file
    let config = file_config.merge_with_cli(&cli.overrides());
    config.validate()?;

    if let Some(threads) = config.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!(error = %e, "could not size the thread pool");
        }
    }

    Ok(config)
}

// ============ Text Commands ============

fn read_text(input: &TextInput) -> Result<String, Box<dyn Error>> {
    match (&input.text, &input.file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => {
            if !path.exists() {
                return Err(TextError::InputNotFound(path.clone()).into());
            }
            Ok(std::fs::read_to_string(path)?)
        }
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn print_text(text: &str) {
    if text.ends_with('\n') {
        print!("{}", text);
    } else {
        println!("{}", text);
    }
}

fn run_text(args: &TextArgs, config: &Config) -> CliResult {
    let text = read_text(&args.input)?;

    let regex = RegexDetector::builtin();
    let custom = match &args.pattern {
        Some(path) => Some(CustomPatternDetector::new(
            args.pattern_label.as_str(),
            CustomPattern::from_file(path)?,
        )),
        None => None,
    };
    let model = match &args.spans {
        Some(path) => Some(JsonSpanDetector::from_file(path)?),
        None => None,
    };

    let mut redactor = TextRedactor::new(config.text_options()).with_detector(&regex);
    if let Some(detector) = &custom {
        redactor.add_detector(detector);
    }
    if let Some(detector) = &model {
        redactor.add_detector(detector);
    }

    let result = redactor.redact(&text)?;
    info!(spans = result.spans.len(), "text redacted");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_text(&result.text);
    }
    Ok(())
}

fn run_pattern(args: &PatternArgs) -> CliResult {
    let pattern = CustomPattern::from_file(&args.pattern)?;
    if args.show_regex {
        println!("{}", pattern.as_str());
        return Ok(());
    }

    let text = read_text(&args.input)?;
    print_text(&pattern.replace_all(&text, &args.replacement));
    Ok(())
}

// ============ Image Commands ============

/// Output path for `input` inside `output_dir`
fn output_path(input: &Path, output_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let name = input
        .file_name()
        .ok_or_else(|| format!("Input has no file name: {}", input.display()))?;
    Ok(output_dir.join(name))
}

fn run_blur(args: &BlurArgs, config: &Config, verbose: u8) -> CliResult {
    let start_time = Instant::now();
    let options = config.blur_options();
    std::fs::create_dir_all(&args.output)?;

    let mut tracker = ProgressTracker::new(args.inputs.len(), OutputMode::from_verbosity(verbose));
    let mut ok_count = 0;
    let mut error_count = 0;

    for (index, input) in args.inputs.iter().enumerate() {
        tracker.start_file(index + 1, &input.display().to_string());
        tracker.set_stage(RedactionStage::Redacting, args.regions.len());

        let result = output_path(input, &args.output).and_then(|output| {
            RegionBlur::process_file(input, &output, &args.regions, &options)
                .map_err(Box::<dyn Error>::from)
        });

        match result {
            Ok(applied) => {
                tracker.update(applied);
                tracker.complete_file(&format!("{} regions blurred", applied));
                ok_count += 1;
            }
            Err(e) => {
                eprintln!("  Error: {}: {}", input.display(), e);
                error_count += 1;
            }
        }
    }

    if args.inputs.len() > 1 {
        ProgressTracker::print_summary(args.inputs.len(), ok_count, error_count);
    }
    info!(
        elapsed = start_time.elapsed().as_secs_f64(),
        ok_count, error_count, "blur finished"
    );

    if error_count > 0 {
        return Err(format!("{} of {} images failed", error_count, args.inputs.len()).into());
    }
    Ok(())
}

fn run_mask(args: &MaskArgs, config: &Config) -> CliResult {
    let mut image = pii_redactor::blur::load_rgb(&args.input)?;
    let heat_image = pii_redactor::blur::load_rgb(&args.heatmap)?;
    let heat = SaliencyMap::from_gray(&image::DynamicImage::ImageRgb8(heat_image).to_luma8());

    let mask = config.mask_options()?;
    let blur = config.blur_options();
    let result = LocationRedactionPipeline::apply_heat(&mut image, &heat, &mask, &blur)?;

    image
        .save(&args.output)
        .map_err(|e| BlurError::InvalidImage(e.to_string()))?;

    println!(
        "{} regions blurred ({:.1}% of pixels masked) -> {}",
        result.regions.len(),
        result.coverage * 100.0,
        args.output.display()
    );
    Ok(())
}

// ============ Info Command ============

fn run_info(config: &Config) -> CliResult {
    println!("pii-redactor v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());
    println!(
        "  Threads: {}",
        config.threads.unwrap_or_else(num_cpus::get)
    );

    println!();
    println!("Built-in Detectors:");
    let regex = RegexDetector::builtin();
    println!("  Patterns: {}", regex.labels().collect::<Vec<_>>().join(", "));

    println!();
    println!("Config File Locations:");
    println!("  Local: ./{}", LOCAL_CONFIG_FILE);
    if let Some(config_dir) = dirs::config_dir() {
        println!("  User:  {}", config_dir.join(USER_CONFIG_FILE).display());
    }

    Ok(())
}
