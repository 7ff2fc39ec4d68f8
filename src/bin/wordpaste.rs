//! CLI binary for wordpaste.
//!
//! A thin shim over the library crate: reads HTML from a file or stdin,
//! runs one stage, and writes the result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use wordpaste::{
    decode, encode_with, upload_all, ImageList, NoopProgressCallback, Normalizer,
    ProgressCallback, Signer, UploadConfig, UploadProgressCallback,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress bar plus one log line per image.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Uploading");
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar }
    }
}

impl UploadProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_image_start(&self, index: usize, total: usize) {
        self.bar.set_message(format!("image {index}/{total}"));
    }

    fn on_image_uploaded(&self, index: usize, total: usize, url: &str) {
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(url)
        ));
    }

    fn on_image_failed(&self, index: usize, total: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(&msg)
        ));
    }

    fn on_progress(&self, index: usize, total: usize, succeeded: usize) {
        self.bar.set_position(index as u64);
        self.bar
            .set_message(format!("{index}/{total}, {succeeded} succeeded"));
    }

    fn on_batch_complete(&self, _total: usize, _succeeded: usize, cancelled: bool) {
        self.bar.finish_and_clear();
        if cancelled {
            eprintln!("{} Upload cancelled", cyan("⚠"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Show clipboard HTML as placeholder text, keeping the image list
  wordpaste encode clip.html --images images.json --inlined inlined.html

  # Rebuild HTML after editing the placeholder text
  wordpaste decode edited.txt --images images.json -o edited.html

  # Upload embedded images and rewrite the document
  wordpaste upload inlined.html -o final.html

ENVIRONMENT VARIABLES:
  OSS_UPLOAD_URL   Endpoint receiving the signed multipart POST
  OSS_BASE_URL     Public base URL of uploaded objects
  STS_URL          Endpoint issuing temporary upload credentials
  RUST_LOG         Log filter (overrides --verbose / --quiet)
"#;

/// Convert word-processor clipboard HTML and offload its images.
#[derive(Parser, Debug)]
#[command(
    name = "wordpaste",
    version,
    about = "Inline, edit and upload images in word-processor clipboard HTML",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "WORDPASTE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "WORDPASTE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed local images and print the placeholder text.
    Encode {
        /// HTML file, or `-` for stdin.
        input: String,

        /// Write the placeholder text here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the ordered image list as JSON.
        #[arg(long)]
        images: Option<PathBuf>,

        /// Write the HTML with images embedded.
        #[arg(long)]
        inlined: Option<PathBuf>,

        /// Resolve relative image paths against this directory.
        /// Default: the input file's directory.
        #[arg(long)]
        base_dir: Option<PathBuf>,
    },

    /// Rebuild HTML from placeholder text and an image list.
    Decode {
        /// Placeholder text file, or `-` for stdin.
        input: String,

        /// Image list JSON written by `encode --images`.
        #[arg(long)]
        images: PathBuf,

        /// Write HTML here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload every embedded image and rewrite the document with remote URLs.
    Upload {
        /// HTML file, or `-` for stdin.
        input: String,

        /// Write the rewritten HTML here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Endpoint receiving the signed multipart POST.
        #[arg(long, env = "OSS_UPLOAD_URL")]
        upload_url: String,

        /// Public base URL of uploaded objects.
        #[arg(long, env = "OSS_BASE_URL")]
        base_url: String,

        /// Endpoint issuing temporary upload credentials.
        #[arg(long, env = "STS_URL")]
        sts_url: String,

        /// Object key prefix.
        #[arg(long, env = "WORDPASTE_KEY_PREFIX", default_value = "pc/course/dev")]
        key_prefix: String,

        /// Credential request timeout in seconds.
        #[arg(long, default_value_t = 10)]
        credential_timeout: u64,

        /// Upload request timeout in seconds.
        #[arg(long, default_value_t = 30)]
        upload_timeout: u64,

        /// Disable progress bar.
        #[arg(long, env = "WORDPASTE_NO_PROGRESS")]
        no_progress: bool,

        /// Embed local images before uploading.
        #[arg(long)]
        normalize: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = matches!(&cli.command, Command::Upload { no_progress, .. } if !no_progress)
        && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Encode {
            input,
            output,
            images,
            inlined,
            base_dir,
        } => {
            let html = read_input(&input)?;
            let normalizer = normalizer_for(&input, base_dir);
            let encoded = encode_with(&normalizer, &html);

            if let Some(path) = images {
                let json = serde_json::to_string_pretty(&encoded.images)
                    .context("Failed to serialise image list")?;
                write_file(&path, &json)?;
            }
            if let Some(path) = inlined {
                write_file(&path, &encoded.inlined_html)?;
            }
            write_output(output.as_deref(), &encoded.placeholder_text)?;

            if !cli.quiet {
                eprintln!("{} {} images", green("✔"), bold(&encoded.images.len().to_string()));
            }
        }

        Command::Decode {
            input,
            images,
            output,
        } => {
            let text = read_input(&input)?;
            let json = std::fs::read_to_string(&images)
                .with_context(|| format!("Failed to read image list {:?}", images))?;
            let list: ImageList = serde_json::from_str(&json)
                .with_context(|| format!("Invalid image list {:?}", images))?;
            write_output(output.as_deref(), &decode(&text, &list))?;
        }

        Command::Upload {
            input,
            output,
            upload_url,
            base_url,
            sts_url,
            key_prefix,
            credential_timeout,
            upload_timeout,
            no_progress: _,
            normalize,
        } => {
            let config = UploadConfig::builder()
                .upload_endpoint(upload_url)
                .base_url(base_url)
                .sts_endpoint(sts_url)
                .key_prefix(key_prefix)
                .credential_timeout_secs(credential_timeout)
                .upload_timeout_secs(upload_timeout)
                .build()
                .context("Invalid configuration")?;

            let mut html = read_input(&input)?;
            if normalize {
                html = normalizer_for(&input, None).normalize(&html);
            }

            let signer = Signer::from_config(config).context("Failed to set up uploader")?;

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            let progress: ProgressCallback = if show_progress {
                Arc::new(CliProgressCallback::new())
            } else {
                Arc::new(NoopProgressCallback)
            };
            let outcome = upload_all(&signer, &html, progress.as_ref(), &cancel).await;

            write_output(output.as_deref(), &outcome.document)?;

            if !cli.quiet {
                let mark = if outcome.all_succeeded() {
                    green("✔")
                } else if outcome.succeeded == 0 {
                    red("✘")
                } else {
                    cyan("⚠")
                };
                eprintln!("{} {}", mark, outcome.summary());
                for failure in &outcome.failures {
                    eprintln!("   {}", dim(&failure.to_string()));
                }
            }
        }
    }

    Ok(())
}

fn normalizer_for(input: &str, base_dir: Option<PathBuf>) -> Normalizer {
    let base = base_dir.or_else(|| {
        (input != "-")
            .then(|| Path::new(input).parent().map(Path::to_path_buf))
            .flatten()
            .filter(|p| !p.as_os_str().is_empty())
    });
    match base {
        Some(dir) => Normalizer::new().base_dir(dir),
        None => Normalizer::new(),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {input:?}"))
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => write_file(path, contents),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(contents.as_bytes())
                .context("Failed to write to stdout")?;
            if !contents.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
            Ok(())
        }
    }
}
