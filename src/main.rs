use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use interior_stager::backend::HttpBackend;
use interior_stager::image::ImagePayload;
use interior_stager::models::{Config, GenerationRequest, GenerationResult, RoomMode};
use interior_stager::session::Studio;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Auto,
    Manual,
}

impl From<ModeArg> for RoomMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => RoomMode::Auto,
            ModeArg::Manual => RoomMode::Manual,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "interior-stager")]
#[command(about = "Render furnished versions of a room photo")]
struct CliArgs {
    /// Room photo to restyle.
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Furniture to place; repeat for several items.
    #[arg(short, long = "furniture", value_name = "NAME")]
    furniture: Vec<String>,

    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,

    /// Room type hint such as "living room" or "bedroom".
    #[arg(long)]
    room_type: Option<String>,

    /// Number of variations to request (clamped to 1-3).
    #[arg(long, allow_negative_numbers = true)]
    variations: Option<i64>,

    /// Photo width in pixels; probed from the file when omitted.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    #[arg(long, requires = "width")]
    height: Option<u32>,

    #[arg(long, default_value = "output")]
    out_dir: PathBuf,
}

fn build_request(args: &CliArgs, photo: &ImagePayload) -> GenerationRequest {
    let mut request = GenerationRequest::new(photo.to_data_uri(), args.furniture.clone())
        .with_mode(args.mode.into());

    let dimensions = match (args.width, args.height) {
        (Some(width), Some(height)) => Some((width, height)),
        _ => photo
            .dimensions()
            .map_err(|e| warn!("Could not read photo dimensions: {}", e))
            .ok(),
    };
    if let Some((width, height)) = dimensions {
        request = request.with_dimensions(width, height);
    }
    if let Some(room_type) = &args.room_type {
        request = request.with_room_type(room_type.clone());
    }
    if let Some(count) = args.variations {
        request = request.with_variations(count);
    }
    request
}

/// Write every result under `out_dir`; returns the written paths.
fn save_results(
    studio: &Studio,
    results: &[GenerationResult],
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let session_id = Uuid::new_v4();
    let mut written = Vec::with_capacity(results.len());
    for (index, result) in results.iter().enumerate() {
        let payload = studio.resolve_image(&result.image)?;
        let path = out_dir.join(format!(
            "{}_{}.{}",
            session_id,
            index + 1,
            payload.extension()
        ));
        fs::write(&path, &payload.data)
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interior_stager=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env()?;
    info!("Using backend at {}", config.base_url);

    let bytes = fs::read(&args.image)
        .with_context(|| format!("reading room photo {}", args.image.display()))?;
    let photo = ImagePayload::from_bytes(bytes);
    let request = build_request(&args, &photo);

    let mut studio = Studio::new(Box::new(HttpBackend::new(&config)), config);

    match studio.generate(request).await {
        Ok(results) => {
            if let Some(notice) = &studio.status().notice {
                warn!("{}", notice);
            }
            if results.is_empty() {
                warn!("No variation could be generated");
                return Ok(());
            }
            for path in save_results(&studio, &results, &args.out_dir)? {
                info!("Saved {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            let message = studio
                .status()
                .message
                .clone()
                .unwrap_or_else(|| e.user_message());
            error!("Generation failed: {}", message);
            std::process::exit(1);
        }
    }
}
