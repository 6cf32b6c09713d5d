//! `sketchstudio generate`: submit a sketch and wait for the design.

use anyhow::{Context, bail};
use sketchstudio_core::config::StudioConfig;
use sketchstudio_core::data_uri::{self, ImageMime};
use sketchstudio_core::generation::{
    GenerationError, GenerationRequest, GenerationStatus, GenerationWorkflow, HttpGenerationClient,
};
use sketchstudio_core::handoff::{DesignHandoff, FileHandoffStore, HandoffStore, LATEST_HANDOFF_KEY};
use sketchstudio_core::scene::SceneDocument;
use sketchstudio_render::{Rasterizer, SurfaceExport};
use std::path::Path;

/// Read a sketch as a data URI: PNG/JPEG files are embedded as-is, scene
/// JSON files are rasterized first.
pub fn sketch_data_uri(path: &Path, rasterizer: &Rasterizer) -> anyhow::Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "json" => {
            let doc = SceneDocument::load(path)
                .with_context(|| format!("loading scene {}", path.display()))?;
            return Ok(doc.to_data_uri(rasterizer)?);
        }
        "png" => ImageMime::Png,
        "jpg" | "jpeg" => ImageMime::Jpeg,
        other => bail!("unsupported sketch file type {:?}", other),
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let uri = data_uri::encode(mime, &bytes);
    data_uri::decode(&uri).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
    Ok(uri)
}

/// Where the prompt and sketch come from.
pub enum Source {
    Direct {
        prompt: Option<String>,
        sketch: Option<String>,
    },
    Handoff(Option<std::path::PathBuf>),
}

pub async fn load_request(source: Source) -> anyhow::Result<GenerationRequest> {
    match source {
        Source::Direct { prompt, sketch } => {
            Ok(GenerationRequest::new(prompt.as_deref(), sketch.as_deref())?)
        }
        Source::Handoff(dir) => {
            let store = match dir {
                Some(dir) => FileHandoffStore::new(dir)?,
                None => FileHandoffStore::default_location()?,
            };
            let handoff: DesignHandoff = store
                .load(LATEST_HANDOFF_KEY)
                .await
                .context("no sketch has been handed off yet; run `sketchstudio handoff` or `sketchstudio demo`")?;
            log::info!("using {} handoff: {}", handoff.mode(), handoff.prompt());
            Ok(handoff.to_request())
        }
    }
}

/// Run the workflow to completion, retrying failures up to `retries` times.
/// Ctrl-C cancels polling.
pub async fn run(
    config: &StudioConfig,
    request: GenerationRequest,
    retries: u32,
) -> anyhow::Result<String> {
    let client = HttpGenerationClient::from_config(config)?;
    let mut workflow = GenerationWorkflow::new(client).with_poll_interval(config.poll_interval());

    let cancel = workflow.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupt received, canceling");
            cancel.cancel();
        }
    });

    let mut updates = workflow.subscribe();
    tokio::spawn(async move {
        let mut last = GenerationStatus::Idle;
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if state.status != last {
                eprintln!("status: {}", state.status);
                last = state.status;
            } else if state.status == GenerationStatus::Polling {
                log::debug!("poll #{}", state.polls);
            }
        }
    });

    let mut result = workflow.submit_request(request).await;
    let mut attempt = 0;
    while matches!(result, Err(GenerationError::Failed)) && attempt < retries {
        attempt += 1;
        eprintln!("retrying ({}/{})", attempt, retries);
        result = workflow.retry().await;
    }
    Ok(result?)
}
