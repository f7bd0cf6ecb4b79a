//! Command-line client for a Wastebin server.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use wastebin_core::{naming, DEFAULT_CLI_HOST};

const APP_NAME: &str = "wpaste";
const CONFIG_FILE_NAME: &str = "conf.json";

#[derive(Parser)]
#[command(name = "wpaste", about = "Wastebin CLI", version)]
struct Cli {
    /// http/s host to connect to; saved for later runs
    #[arg(long, env = "WPASTE_HOST")]
    host: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the list of pastes
    List,
    /// Create a paste in $EDITOR
    New { name: String },
    /// Print a paste
    Get { name: String },
    /// Edit a paste in $EDITOR
    Edit { name: String },
    /// Delete a paste
    Del { name: String },
}

/// Saved client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CliConfig {
    #[serde(default)]
    host: String,
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Read the saved settings, writing defaults on first run.
fn load_or_init_config(path: &Path) -> anyhow::Result<CliConfig> {
    if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        return serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()));
    }
    let config = CliConfig::default();
    save_config(path, &config)?;
    Ok(config)
}

fn save_config(path: &Path, config: &CliConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, serde_json::to_string(config)?)
        .with_context(|| format!("writing {}", path.display()))
}

/// Explicit host first, then the saved one, then the default.
fn resolve_host(explicit: Option<&str>, saved: &CliConfig) -> String {
    explicit
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .or_else(|| Some(saved.host.trim()).filter(|host| !host.is_empty()))
        .unwrap_or(DEFAULT_CLI_HOST)
        .to_string()
}

/// Build `<host>/<segments...>`; each `/`-separated part of a paste name is
/// its own path segment.
fn paste_url(host: &str, path: &str) -> anyhow::Result<reqwest::Url> {
    let mut url =
        reqwest::Url::parse(host).with_context(|| format!("Invalid host URL '{}'", host))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Host URL '{}' cannot be a base", host))?;
        segments.pop_if_empty();
        for segment in path.split('/') {
            segments.push(segment);
        }
    }
    Ok(url)
}

fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }
    body.trim().to_string()
}

async fn ensure_success_or_exit(res: reqwest::Response, action: &str) -> reqwest::Response {
    let status = res.status();
    if status.is_success() {
        return res;
    }

    let body = match res.text().await {
        Ok(body) => body,
        Err(err) => format!("failed to read error response body: {}", err),
    };
    let message = error_message_for_response(status, &body);
    eprintln!("{} failed ({}): {}", action, status, message);
    std::process::exit(1);
}

/// `$EDITOR`, then `$VISUAL`, then `vi`.
fn editor_command() -> String {
    ["EDITOR", "VISUAL"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Open `initial` in `editor` on a temp file and return what was saved.
fn edit_with(editor: &str, initial: &str) -> anyhow::Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("wpaste-")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;

    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("No editor configured. Set $EDITOR.");
    };
    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to launch editor '{}'", editor))?;
    if !status.success() {
        bail!("Editor '{}' exited with {}", editor, status);
    }

    Ok(std::fs::read_to_string(file.path())?)
}

async fn fetch_paste(client: &reqwest::Client, host: &str, name: &str) -> anyhow::Result<String> {
    let res = client.get(paste_url(host, name)?).send().await?;
    let res = ensure_success_or_exit(res, "Get").await;
    Ok(res.text().await?)
}

async fn post_paste(
    client: &reqwest::Client,
    host: &str,
    name: &str,
    contents: &str,
) -> anyhow::Result<reqwest::Url> {
    let res = client
        .post(paste_url(host, "make")?)
        .form(&[("name", name), ("contents", contents)])
        .send()
        .await?;
    let res = ensure_success_or_exit(res, "Save").await;
    Ok(res.url().clone())
}

async fn edit_and_post(
    client: &reqwest::Client,
    host: &str,
    name: &str,
    initial: &str,
) -> anyhow::Result<()> {
    let contents = edit_with(&editor_command(), initial)?;
    if contents.is_empty() {
        println!("Blank paste, exiting");
        return Ok(());
    }
    println!("{}", post_paste(client, host, name, &contents).await?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { host, command } = Cli::parse();

    let config_path = config_path().context("Could not determine config dir")?;
    let mut saved = load_or_init_config(&config_path)?;
    let host = resolve_host(host.as_deref(), &saved);
    if saved.host != host {
        saved.host = host.clone();
        save_config(&config_path, &saved)?;
    }

    let client = reqwest::Client::new();

    match command {
        Commands::List => {
            let res = client.get(paste_url(&host, "search")?).send().await?;
            let res = ensure_success_or_exit(res, "List").await;
            let names = res.text().await?;
            if !names.is_empty() {
                println!("{}", names);
            }
        }
        Commands::Get { name } => {
            print!("{}", fetch_paste(&client, &host, &name).await?);
        }
        Commands::New { name } => {
            naming::validate_name(&name)?;
            edit_and_post(&client, &host, &name, "").await?;
        }
        Commands::Edit { name } => {
            let current = fetch_paste(&client, &host, &name).await?;
            edit_and_post(&client, &host, &name, &current).await?;
        }
        Commands::Del { name } => {
            let res = client.delete(paste_url(&host, &name)?).send().await?;
            ensure_success_or_exit(res, "Delete").await;
            println!("Deleted {}", name);
        }
    }

    Ok(())
}
