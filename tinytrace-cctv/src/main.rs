use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tinytrace_api::models::IncidentId;
use tinytrace_api::shutdown_channel;
use tinytrace_cctv::{
    ConfirmationWorker, DEFAULT_CAMERA_ID, FrameDirectory, HttpBackend, RetryPolicy,
    SamplingPolicy, WorkerConfig, WorkerOutcome, latest_open_incident, load_detector,
};

#[derive(Parser)]
#[command(
    name = "tinytrace-cctv",
    about = "Corroborate an open incident against CCTV footage",
    version
)]
struct Cli {
    /// Detection sheet, or an `.onnx` graph when built with the onnx feature
    #[arg(long)]
    model: PathBuf,

    /// Directory of extracted frames (defaults to the bundled sample)
    #[arg(long)]
    video: Option<PathBuf>,

    /// Incident to corroborate (defaults to the most recent open one)
    #[arg(long)]
    incident_id: Option<String>,

    /// Incident backend base url
    #[arg(long, default_value = "http://localhost:8000")]
    backend: String,

    /// Seconds to wait before checking the incident
    #[arg(long, default_value_t = 5)]
    delay: u64,

    /// Per-frame confidence threshold
    #[arg(long, default_value_t = 0.5)]
    conf: f32,

    /// Camera id attached to the match report
    #[arg(long, default_value = DEFAULT_CAMERA_ID)]
    camera_id: String,

    /// Attempts for the match report, including the first
    #[arg(long, default_value_t = 1)]
    report_attempts: u32,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
                let level = cli.log_level.as_str();

                format!("{app_name}={level}").into()
            }),
        )
        .init();

    match run(cli).await {
        Ok(outcome) => {
            tracing::info!(?outcome, "cctv confirmation finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<WorkerOutcome> {
    if !cli.model.exists() {
        bail!("model file {} not found", cli.model.display());
    }
    let detector = load_detector(&cli.model)?;

    let video = match &cli.video {
        Some(path) => FrameDirectory::new(path),
        None => FrameDirectory::bundled(),
    };
    if !video.exists() {
        bail!(
            "video {} not found; pass --video with a directory of frames",
            video.path().display()
        );
    }

    let backend = HttpBackend::new(&cli.backend)?;

    let incident_id = match cli.incident_id {
        Some(id) => IncidentId::from(id),
        None => {
            let latest = latest_open_incident(&backend)
                .await
                .context("error fetching incidents; pass --incident-id")?
                .context("no open incidents found; pass --incident-id")?;
            tracing::info!(incident_id = %latest.id, "using latest open incident");
            latest.id
        }
    };

    let config = WorkerConfig {
        incident_id,
        startup_delay: Duration::from_secs(cli.delay),
        confidence: cli.conf,
        camera_id: cli.camera_id,
        sampling: SamplingPolicy::default(),
        retry: RetryPolicy::with_attempts(cli.report_attempts),
    };

    tracing::info!(
        model = %cli.model.display(),
        video = %video.path().display(),
        backend = %backend.base_url(),
        incident_id = %config.incident_id,
        "starting cctv simulation"
    );

    let (trigger, shutdown) = shutdown_channel();
    let worker = ConfirmationWorker::new(
        detector,
        Arc::new(backend),
        Arc::new(video),
        config,
    )
    .spawn(shutdown);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down...");
            trigger.trigger();
        }
    });

    worker.await.context("confirmation worker panicked")
}
