use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Parser;
use log::info;

use emoscope_core::classification::classifier::EmotionClassifier;
use emoscope_core::decoding::image_decoder::decode_bytes;
use emoscope_core::detection::infrastructure::blazeface_locator::{
    BlazefaceLocator, DEFAULT_CONFIDENCE,
};
use emoscope_core::detection::infrastructure::model_resolver;
use emoscope_core::pipeline::frame_analyzer::FrameAnalyzer;
use emoscope_core::pipeline::response::{AnalysisResponse, TimelineResponse};
use emoscope_core::pipeline::timeline::TimelineAggregator;
use emoscope_core::shared::constants::{
    BLAZEFACE_MODEL_NAME, BLAZEFACE_MODEL_URL, DEFAULT_WEIGHTS_NAME,
};

/// Per-face emotion analysis for images and frame sequences.
///
/// One input image prints a single-frame result; several print a timeline
/// with summary statistics.
#[derive(Parser)]
#[command(name = "emoscope")]
struct Cli {
    /// Input image files, in frame order.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Emotion weight artifact (EMO1 format). Missing weights degrade to
    /// random parameters with a warning.
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Directory holding a bundled face-detection model.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Frame timestamps in seconds (comma-separated); defaults to frame
    /// indices.
    #[arg(long, value_delimiter = ',')]
    timestamps: Option<Vec<f64>>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let model_path = model_resolver::resolve(
        BLAZEFACE_MODEL_NAME,
        BLAZEFACE_MODEL_URL,
        cli.model_dir.as_deref(),
    )?;
    let locator = BlazefaceLocator::new(&model_path, cli.confidence)?;

    let weights = cli.weights.clone().or_else(default_weights_path);
    let classifier = Arc::new(EmotionClassifier::new(weights.as_deref()));
    let mut analyzer = FrameAnalyzer::new(Box::new(locator), classifier);

    let output = if cli.images.len() == 1 {
        let bytes = std::fs::read(&cli.images[0])?;
        let frame = decode_bytes(&bytes)?;
        let result = analyzer.analyze(&frame)?;
        info!("{} face(s) in {}", result.face_count(), cli.images[0].display());

        let timestamp = cli.timestamps.as_ref().and_then(|t| t.first().copied());
        to_json(&AnalysisResponse::new(result, timestamp), cli.pretty)?
    } else {
        let payloads = cli
            .images
            .iter()
            .map(|path| std::fs::read(path).map(|bytes| STANDARD.encode(bytes)))
            .collect::<Result<Vec<_>, _>>()?;
        let timestamps: Vec<f64> = match cli.timestamps {
            Some(ts) => ts,
            None => (0..payloads.len()).map(|i| i as f64).collect(),
        };

        let mut aggregator = TimelineAggregator::new(analyzer);
        let analysis = aggregator.aggregate(&payloads, &timestamps)?;
        info!(
            "{} of {} frames had faces",
            analysis.summary.frames_with_faces, analysis.summary.total_frames
        );
        to_json(&TimelineResponse::new(analysis), cli.pretty)?
    };

    println!("{output}");
    Ok(())
}

/// Default weight artifact location: the model cache directory.
///
/// Only returned when the file actually exists; absence means the classifier
/// falls back to random parameters.
fn default_weights_path() -> Option<PathBuf> {
    model_resolver::model_cache_dir()
        .ok()
        .map(|dir| dir.join(DEFAULT_WEIGHTS_NAME))
        .filter(|path| path.exists())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
