#![warn(missing_docs)]
//! # face-verify binary
//!
//! Terminal host for the signup/login gate and the capture-and-submit page.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use face_verify_app::{
    AppConfig, AppError, ClickOutcome, ConfigOverrides, LogFormat, PageController, PageElements,
    app_version, init_logging,
};
use face_verify_auth::{FormGate, FormKind, GateOutcome, PageNavigator};
use face_verify_capture::{CameraBackend, StillImageCamera, SyntheticCamera};
use face_verify_contract::CleanupOutcome;
use face_verify_core::DocumentUpload;
use face_verify_ui::{CAPTURE_BUTTON_ID, ResultView, SUBMIT_BUTTON_ID};
use face_verify_upload::{ReqwestTransport, VerifyClient};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "face-verify",
    version = face_verify_app::APP_VERSION,
    about = "Document and face verification client"
)]
struct Cli {
    /// Verification endpoint (overrides FACE_VERIFY_ENDPOINT).
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Log output format (overrides FACE_VERIFY_LOG_FORMAT).
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit the signup form.
    Signup {
        /// First signup field.
        #[arg(long, default_value = "")]
        username: String,
        /// Second signup field.
        #[arg(long, default_value = "")]
        email: String,
        /// Third signup field.
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Submit the login form.
    Login {
        /// First login field.
        #[arg(long, default_value = "")]
        email: String,
        /// Second login field.
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Capture a frame and submit it with a document for verification.
    Verify {
        /// Identity document to upload.
        #[arg(long)]
        document: Option<PathBuf>,
        /// Camera source: `synthetic`, `image:<path>`, or `v4l2:<device>`.
        #[arg(long, default_value = "synthetic")]
        camera: String,
        /// Submit without capturing a frame first.
        #[arg(long)]
        skip_capture: bool,
        /// Print the result area markup instead of plain text.
        #[arg(long)]
        html: bool,
    },
    /// Ask the server to delete stored uploads and results.
    Cleanup,
}

struct ConsoleNavigator;

impl PageNavigator for ConsoleNavigator {
    fn navigate(&self, location: &str) {
        println!("-> {location}");
    }

    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("face-verify: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let config = AppConfig::from_env_with(&ConfigOverrides {
        verify_endpoint: cli.endpoint,
        log_format: cli.log_format,
    })?;
    init_logging(config.log_format)?;
    info!(version = app_version(), endpoint = %config.verify_endpoint, "face-verify starting");

    match cli.command {
        Command::Signup {
            username,
            email,
            password,
        } => Ok(run_gate(
            &config,
            FormKind::Signup,
            &[username.as_str(), email.as_str(), password.as_str()],
        )),
        Command::Login { email, password } => Ok(run_gate(
            &config,
            FormKind::Login,
            &[email.as_str(), password.as_str()],
        )),
        Command::Verify {
            document,
            camera,
            skip_capture,
            html,
        } => run_verify(&config, document, &camera, skip_capture, html).await,
        Command::Cleanup => run_cleanup(&config).await,
    }
}

fn run_gate(config: &AppConfig, kind: FormKind, values: &[&str]) -> ExitCode {
    let gate = FormGate::new(config.next_page.clone());
    match gate.submit(kind, values, &ConsoleNavigator) {
        GateOutcome::Navigate(_) => ExitCode::SUCCESS,
        GateOutcome::Alert(_) => ExitCode::FAILURE,
    }
}

fn camera_backend(source: &str) -> Result<Box<dyn CameraBackend>, AppError> {
    if source == "synthetic" {
        return Ok(Box::new(SyntheticCamera::new(640, 480)));
    }
    if let Some(path) = source.strip_prefix("image:") {
        return Ok(Box::new(StillImageCamera::new(path)));
    }
    #[cfg(feature = "v4l2")]
    {
        if let Some(device) = source.strip_prefix("v4l2:") {
            return Ok(Box::new(face_verify_capture::V4l2Camera::new(
                device, 640, 480,
            )));
        }
    }

    Err(AppError::Config(format!("unsupported camera source '{source}'")))
}

fn verify_client(config: &AppConfig) -> Result<VerifyClient, AppError> {
    Ok(VerifyClient::new(
        &config.verify_endpoint,
        Arc::new(ReqwestTransport::new()),
    )?)
}

async fn run_verify(
    config: &AppConfig,
    document: Option<PathBuf>,
    camera: &str,
    skip_capture: bool,
    html: bool,
) -> Result<ExitCode, AppError> {
    let backend = camera_backend(camera)?;
    let page = PageController::mount(
        PageElements::complete(),
        verify_client(config)?,
        backend.as_ref(),
    )
    .ok_or_else(|| AppError::IncompletePage("standard page layout".to_string()))?;

    if let Some(notice) = page.status().camera_notice {
        eprintln!("camera unavailable: {notice}");
    }

    if let Some(path) = document {
        page.document_input().select(DocumentUpload::from_path(&path)?);
    }

    if !skip_capture {
        page.click(CAPTURE_BUTTON_ID).await;
    }

    let view = match page.click(SUBMIT_BUTTON_ID).await {
        ClickOutcome::Submitted(view) => view,
        _ => page.result().current(),
    };
    page.release_camera();

    if html {
        println!("{}", view.render_html());
    } else {
        println!("{}", view.render_text());
    }

    Ok(match view {
        ResultView::Report(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn run_cleanup(config: &AppConfig) -> Result<ExitCode, AppError> {
    let page = PageController::wire(PageElements::complete(), verify_client(config)?)
        .ok_or_else(|| AppError::IncompletePage("standard page layout".to_string()))?;

    match page.cleanup().await? {
        CleanupOutcome::Cleaned(message) => {
            println!("{message}");
            Ok(ExitCode::SUCCESS)
        }
        CleanupOutcome::ServerError(error) => {
            eprintln!("❌ Error: {error}");
            Ok(ExitCode::FAILURE)
        }
    }
}
