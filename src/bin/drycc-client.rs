//! Drycc controller CLI binary.
//!
//! A command-line interface for probing a controller and moving files on app volumes.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use drycc_client::cli::{Cli, Command};
use drycc_client::{filer, Checked, DryccClient, FilerDirEntry, Page};
use serde::Serialize;
use tabled::{Table, Tabled};
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = match DryccClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Set DRYCC_CONTROLLER_URL and DRYCC_TOKEN environment variables");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &DryccClient, cli: Cli) -> drycc_client::Result<()> {
    let strict = cli.strict;
    match cli.command {
        Command::Check => {
            settle(client.check_connection().await?, strict)?;
            output_versions(client, cli.json)
        }
        Command::Health => {
            settle(client.healthcheck().await?, strict)?;
            output_versions(client, cli.json)
        }
        Command::Ls {
            app,
            volume,
            path,
            limit,
        } => {
            let page = settle(filer::list_dir(client, &app, &volume, &path, limit).await?, strict)?;
            output_page(&page, cli.json)
        }
        Command::Put {
            app,
            volume,
            file,
            path,
            name,
        } => {
            let name = match name {
                Some(name) => name,
                None => file_name(&file)?,
            };
            let reader = tokio::fs::File::open(&file).await?;
            settle(
                filer::upload_file(client, &app, &volume, &path, &name, reader).await?,
                strict,
            )?;
            eprintln!("Uploaded {} to {volume}:{path}", file.display());
            Ok(())
        }
        Command::Get {
            app,
            volume,
            path,
            output,
        } => {
            let mut response = settle(filer::get_file(client, &app, &volume, &path).await?, strict)?;
            let mut sink: Box<dyn tokio::io::AsyncWrite + Unpin> = match output {
                Some(output) => Box::new(tokio::fs::File::create(output).await?),
                None => Box::new(tokio::io::stdout()),
            };
            while let Some(chunk) = response.chunk().await? {
                sink.write_all(&chunk).await?;
            }
            sink.flush().await?;
            Ok(())
        }
        Command::Rm { app, volume, path } => {
            settle(filer::delete_file(client, &app, &volume, &path).await?, strict)?;
            eprintln!("Deleted {volume}:{path}");
            Ok(())
        }
    }
}

/// Apply the version policy chosen on the command line.
fn settle<T>(checked: Checked<T>, strict: bool) -> drycc_client::Result<T> {
    if strict {
        return checked.strict();
    }
    if let Some(mismatch) = checked.mismatch() {
        eprintln!("Warning: {mismatch}");
    }
    Ok(checked.into_inner())
}

fn file_name(file: &Path) -> drycc_client::Result<String> {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} has no file name", file.display()),
            )
            .into()
        })
}

#[derive(Serialize)]
struct VersionsOutput {
    controller: String,
    api_version: String,
    platform_version: String,
}

fn output_versions(client: &DryccClient, json: bool) -> drycc_client::Result<()> {
    let versions = client.controller_versions();
    let output = VersionsOutput {
        controller: client.base_url().to_string(),
        api_version: versions.api_version,
        platform_version: versions.platform_version,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Controller:       {}", output.controller);
        println!("API version:      {}", output.api_version);
        println!("Platform version: {}", output.platform_version);
    }
    Ok(())
}

fn output_page(page: &Page<FilerDirEntry>, json: bool) -> drycc_client::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&page.items)?);
    } else {
        let rows: Vec<EntryRow> = page.iter().map(EntryRow::from).collect();
        println!("{}", Table::new(rows));
        if page.has_more() {
            println!("\n{} of {} entries (raise --limit for more)", page.len(), page.total);
        } else {
            println!("\n{} entries", page.total);
        }
    }
    Ok(())
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct EntryRow {
    name: String,
    #[tabled(rename = "type")]
    entry_type: String,
    size: String,
    modified: String,
}

impl From<&FilerDirEntry> for EntryRow {
    fn from(e: &FilerDirEntry) -> Self {
        Self {
            name: e.name.clone().unwrap_or_default(),
            entry_type: e.entry_type.clone().unwrap_or_default(),
            size: e.size.clone().unwrap_or_default(),
            modified: match e.modified() {
                Ok(Some(ts)) => ts.to_string(),
                _ => e.timestamp.clone().unwrap_or_default(),
            },
        }
    }
}
