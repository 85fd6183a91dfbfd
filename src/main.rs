// Headless runner: replays a directory of images as the camera and writes the
// annotated original, HSV image and threshold mask of every frame as PNGs.

use anyhow::Context;
use clap::Parser;
use hue_tracker::capture::{self, AnnotatedFrames, DirectorySink, ImageDirectorySource};
use hue_tracker::core_modules::hsv_range::{HsvRange, RangeHandle};
use hue_tracker::{TrackerConfig, TrackingPipeline};
use std::path::PathBuf;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "hue_tracker", about = "Track one coloured object through a sequence of frames")]
struct Args {
    /// Directory of input frames, replayed in file name order.
    input: PathBuf,
    /// Directory the output surfaces are written to.
    output: PathBuf,
    /// JSON tracker config; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    hue: Option<Vec<u16>>,
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    saturation: Option<Vec<u16>>,
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    value: Option<Vec<u16>>,
    /// Skip the erode/dilate cleanup.
    #[arg(long)]
    no_morph: bool,
    /// Only filter; never select or annotate an object.
    #[arg(long)]
    no_track: bool,
    /// TTF/OTF font for on-frame text.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Milliseconds to wait between frames.
    #[arg(long)]
    delay: Option<u64>,
    /// Replay the input directory until interrupted.
    #[arg(long)]
    repeat: bool,
}

impl Args {
    fn tracker_config(&self) -> anyhow::Result<TrackerConfig> {
        let mut config = match &self.config {
            Some(path) => TrackerConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => TrackerConfig::default(),
        };
        let range = &mut config.initial_range;
        let mut apply = |bounds: &Option<Vec<u16>>, lower: usize| {
            if let Some(pair) = bounds {
                let (mut min, mut max) = (range.lower(), range.upper());
                min[lower] = pair[0];
                max[lower] = pair[1];
                *range = HsvRange::new(min, max);
            }
        };
        apply(&self.hue, 0);
        apply(&self.saturation, 1);
        apply(&self.value, 2);

        config.use_morph_ops &= !self.no_morph;
        config.track_objects &= !self.no_track;
        if let Some(font) = &self.font {
            config.font_path = Some(font.clone());
        }
        if let Some(delay) = self.delay {
            config.frame_delay_ms = delay;
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.tracker_config()?;
    log::info!("tracking with {:?}", config.initial_range);

    let source = ImageDirectorySource::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?
        .repeat(args.repeat);
    if source.is_empty() {
        anyhow::bail!("no images found in {}", args.input.display());
    }
    let mut sink = DirectorySink::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let range = RangeHandle::new(config.initial_range);
    let frames = AnnotatedFrames::new(source, TrackingPipeline::new(config), range.view());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupted, finishing current frame");
            shutdown_tx.send_replace(true);
        }
    });

    let summary = capture::run(frames, &mut sink, shutdown_rx).await?;
    println!(
        "{} frames written to {} ({} tracked, {} capture failures)",
        summary.frames_presented,
        args.output.display(),
        summary.frames_tracked,
        summary.capture_failures
    );
    Ok(())
}
