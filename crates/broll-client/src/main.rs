//! Render client binary: submit one job, poll to completion, save the
//! artifact.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use broll_client::{ClientConfig, EndpointClient, PollOutcome};
use broll_models::{RenderOutput, RenderRequest, Resolution, StatusResponse};

#[derive(Parser, Debug)]
#[command(name = "broll-client", version)]
struct Cli {
    /// Registry template name.
    #[arg(long, default_value = "ai_cpu_activation")]
    template: String,

    /// Scene template URL to download at runtime (overrides --template).
    #[arg(long)]
    template_url: Option<String>,

    /// Output width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Cycles sample count.
    #[arg(long, default_value_t = 128)]
    samples: u32,

    /// Frame rate. Should match the template (ai_cpu_activation is 24fps).
    #[arg(long, default_value_t = 24)]
    fps: u32,

    /// Duration override in seconds; omit to render the template's full
    /// animation.
    #[arg(long)]
    duration: Option<u32>,

    /// Local path for the rendered video.
    #[arg(long, default_value = "output.mp4")]
    output: PathBuf,

    /// Seconds between status polls.
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Local polling ceiling in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

const DEFAULT_LOG_DIRECTIVES: &str = "broll_client=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // RUST_LOG when set, otherwise info for this crate by its full target
    // name (a bare prefix would match nothing).
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(env_filter)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("client configuration")?;

    let poll_interval = cli
        .poll_interval
        .map(Duration::from_secs)
        .unwrap_or(config.poll_interval);
    let poll_timeout = cli
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(config.poll_timeout);

    let request = build_request(&cli);

    println!("==================================================");
    println!("Blender render");
    println!(
        "Template: {}",
        cli.template_url.as_deref().unwrap_or(&cli.template)
    );
    match cli.duration {
        Some(d) => println!("Duration: {d}s"),
        None => println!("Duration: full animation"),
    }
    println!("Resolution: {}x{}", cli.width, cli.height);
    println!("Samples: {}", cli.samples);
    println!("FPS: {}", cli.fps);
    println!("==================================================");

    let client = EndpointClient::new(&config.endpoint_url, &config.api_key)
        .context("building endpoint client")?;

    println!("Submitting job...");
    let submitted = client.submit(&request).await.context("submitting job")?;
    println!("Job ID: {}", submitted.id);

    let outcome = client
        .poll_until_terminal(submitted.id.as_str(), poll_interval, poll_timeout)
        .await
        .context("polling job status")?;

    match outcome {
        PollOutcome::Completed(response) => {
            let output = parse_output(&response)?;
            print_success(&output);
            let written = broll_client::write_artifact(&output.video_base64, &cli.output)
                .context("writing output file")?;
            println!("\nSaved {} bytes to: {}", written, cli.output.display());
            Ok(())
        }
        PollOutcome::Failed(response) => {
            print_failure(&response);
            std::process::exit(1);
        }
        PollOutcome::TimedOut { elapsed } => {
            println!(
                "Timeout: job still not terminal after {}s, giving up (remote job left running)",
                elapsed.as_secs()
            );
            std::process::exit(1);
        }
    }
}

fn build_request(cli: &Cli) -> RenderRequest {
    let mut request = RenderRequest {
        resolution: Some(Resolution(cli.width, cli.height)),
        samples: Some(cli.samples),
        fps: Some(cli.fps),
        duration: cli.duration,
        ..Default::default()
    };

    // Template: either by URL or by registry name.
    if let Some(url) = &cli.template_url {
        request.template_url = Some(url.clone());
    } else {
        request.template = Some(cli.template.clone());
    }

    request
}

fn parse_output(response: &StatusResponse) -> anyhow::Result<RenderOutput> {
    let value = response
        .output
        .clone()
        .context("completed job carried no output payload")?;
    serde_json::from_value(value).context("malformed output payload")
}

fn print_success(output: &RenderOutput) {
    println!("\n==================================================");
    println!("SUCCESS");
    println!("==================================================");
    println!("Template: {}", output.template);
    match output.duration {
        Some(d) => println!("Duration: {d}s"),
        None => println!("Duration: full animation"),
    }
    println!("Resolution: {}", output.resolution);
    println!("Render time: {}s", output.render_time_seconds);
    println!("File size: {} bytes", output.file_size_bytes);
    println!("GPU used: {}", output.gpu_used);
}

fn print_failure(response: &StatusResponse) {
    println!("\n==================================================");
    println!("FAILED");
    println!("==================================================");
    println!(
        "Error: {}",
        response.error.as_deref().unwrap_or("unknown error")
    );

    // Auxiliary diagnostic fields, minus the potentially huge base64 blob.
    if let Some(serde_json::Value::Object(fields)) = &response.output {
        if fields.keys().any(|k| k != "video_base64") {
            println!("\nOutput details:");
            for (key, value) in fields {
                if key != "video_base64" {
                    println!("  {key}: {value}");
                }
            }
        }
    }
}
