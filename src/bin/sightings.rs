use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sightings::{
    AnnotatedFrameWriter, CorrelationMatcher, DEFAULT_MATCH_THRESHOLD,
    DEFAULT_MIN_SEPARATION_SECONDS, DEFAULT_SAMPLES_PER_SECOND, FfmpegLogLevel, FrameSource,
    LoggingObserver, MatchMetric, MergeStrategy, ObserverChain, ProgressCallback, ProgressInfo,
    ScanConfig, Scanner, Template, VideoSource,
};

const CLI_AFTER_HELP: &str = "Examples:\n  sightings match.mp4 concede.png 3 3 1\n  sightings match.mp4 concede.png 5 2 2 --progress\n  sightings match.mp4 concede.png 3 3 1 1 --debug-dir debug-frames";

#[derive(Debug, Parser)]
#[command(
    name = "sightings",
    version,
    about = "Report when a template image is on screen in a video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Video file to scan.
    video: PathBuf,

    /// Template image to look for.
    template: PathBuf,

    /// Seconds of padding before each appearance.
    #[arg(allow_negative_numbers = true)]
    seconds_before: i64,

    /// Seconds of padding after each appearance.
    #[arg(allow_negative_numbers = true)]
    seconds_after: i64,

    /// Most template instances a frame may contain and still count as a hit.
    max_templates_allowed: usize,

    /// 1 logs every candidate region; 0 disables.
    #[arg(default_value_t = 0)]
    debug: u8,

    /// Minimum similarity for a candidate region.
    #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
    threshold: f32,

    /// Similarity metric (ccoeff, ncc, sqdiff).
    #[arg(long, default_value = "ccoeff")]
    metric: String,

    /// Frames per second of video submitted to the matcher.
    #[arg(long, default_value_t = DEFAULT_SAMPLES_PER_SECOND)]
    samples_per_second: u32,

    /// Detections closer than this many seconds are merged.
    #[arg(long, default_value_t = DEFAULT_MIN_SEPARATION_SECONDS)]
    min_separation: f64,

    /// Merge against the last surviving detection instead of the previous one.
    #[arg(long)]
    anchored: bool,

    /// Show a progress bar on stderr.
    #[arg(long)]
    progress: bool,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long)]
    log_level: Option<String>,

    /// Save annotated PNGs of frames with candidate regions here.
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

fn parse_metric(value: &str) -> Option<MatchMetric> {
    match value.to_ascii_lowercase().as_str() {
        "ccoeff" | "coefficient" => Some(MatchMetric::CorrelationCoefficient),
        "ncc" | "ccorr" | "correlation" => Some(MatchMetric::NormalizedCrossCorrelation),
        "sqdiff" | "sse" => Some(MatchMetric::NormalizedSquaredDifference),
        _ => None,
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:60.cyan/blue} {percent:>3}% {pos}/{len} {msg}",
        )?;
        bar.set_style(style.progress_chars("||-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total
            && info.current > total
        {
            self.bar.set_length(info.current);
        }
        self.bar.set_position(info.current);
        self.bar.set_message(format!("{} hits", info.detections));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let debug = cli.debug == 1;
    init_logging(cli.verbose || debug);

    if let Some(level) = &cli.log_level {
        sightings::set_ffmpeg_log_level(level.parse::<FfmpegLogLevel>()?);
    }

    let metric = parse_metric(&cli.metric)
        .ok_or_else(|| format!("unsupported --metric: {} (ccoeff, ncc, sqdiff)", cli.metric))?;

    let template = Template::open(&cli.template)?;
    let mut source = VideoSource::open(&cli.video)?;

    let mut config = ScanConfig::new()
        .with_match_threshold(cli.threshold)
        .with_max_templates_allowed(cli.max_templates_allowed)
        .with_padding(cli.seconds_before, cli.seconds_after)
        .with_samples_per_second(cli.samples_per_second)
        .with_min_separation(cli.min_separation)
        .with_merge_strategy(if cli.anchored {
            MergeStrategy::Anchored
        } else {
            MergeStrategy::Adjacent
        });
    config.validate()?;

    let progress = if cli.progress {
        let terminal = Arc::new(TerminalProgress::new(source.frame_count())?);
        config = config.with_progress(terminal.clone()).with_batch_size(10);
        Some(terminal)
    } else {
        None
    };

    let matcher = CorrelationMatcher::new(config.match_threshold()).with_metric(metric);

    let mut logging = LoggingObserver;
    let mut writer = cli.debug_dir.as_ref().map(AnnotatedFrameWriter::new).transpose()?;
    let mut observers = ObserverChain::new();
    if debug {
        observers = observers.with(&mut logging);
    }
    if let Some(writer) = writer.as_mut() {
        observers = observers.with(writer);
    }

    let mut scanner = Scanner::new(&config, &matcher, &template);
    if !observers.is_empty() {
        scanner = scanner.with_observer(&mut observers);
    }
    let report = scanner.run(&mut source)?;

    if let Some(progress) = progress {
        progress.bar.finish_with_message(format!("{} events", report.events.len()));
    }

    if let Some(writer) = &writer {
        eprintln!(
            "{} {}",
            "debug:".cyan().bold(),
            format!("saved {} annotated frame(s)", writer.written()).cyan()
        );
    }

    println!("{}", sightings::to_json(&report.intervals)?);
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
