//! reefscope — linked-view exploration engine for coral colony data
//!
//! The binary wires a data provider to a session, runs the initial reload
//! on the session's update thread and reports the loaded tables. Rendering
//! and serving are the client's concern; everything the client needs is in
//! the session's render sinks.

mod constants;
mod data;
mod error;
mod factor;
mod graph;
mod provider;
mod reduce;
mod session;
mod sink;
mod view;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;

use crate::error::{ReefError, Result};
use crate::provider::DataProvider;
use crate::provider::filesystem::FilesystemProvider;
use crate::provider::random::RandomProvider;
use crate::session::{Session, SessionConfig};

#[derive(Parser)]
#[command(name = "reefscope", version, about = "Linked-view explorer for coral colony data")]
struct Cli {
    /// Path to a session configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    provider: ProviderKind,
}

#[derive(Subcommand)]
enum ProviderKind {
    /// CSV spreadsheets in the local filesystem
    Filesystem {
        /// Path to a CSV spreadsheet containing vertex data
        #[arg(long = "vertex")]
        vertex: Vec<PathBuf>,

        /// Path to a CSV spreadsheet containing edge data
        #[arg(long = "edge")]
        edge: Vec<PathBuf>,

        /// Path the current vertex selection is written to
        #[arg(long)]
        vertex_selection: Option<PathBuf>,

        /// Path the current edge selection is written to
        #[arg(long)]
        edge_selection: Option<PathBuf>,

        /// Path the current vertex colormap is written to
        #[arg(long)]
        vertex_colormap: Option<PathBuf>,

        /// Path the current edge colormap is written to
        #[arg(long)]
        edge_colormap: Option<PathBuf>,
    },

    /// Randomly generated test data
    Random {
        /// Number of samples to generate
        #[arg(long, default_value_t = 100)]
        samples: usize,

        /// Seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn build_provider(kind: &ProviderKind) -> Result<Box<dyn DataProvider>> {
    match kind {
        ProviderKind::Filesystem {
            vertex,
            edge,
            vertex_selection,
            edge_selection,
            vertex_colormap,
            edge_colormap,
        } => {
            if vertex.is_empty() && edge.is_empty() {
                return Err(ReefError::Config(
                    "the filesystem provider needs at least one --vertex or --edge file"
                        .to_string(),
                ));
            }
            for path in vertex.iter().chain(edge.iter()) {
                if !path.is_file() {
                    return Err(ReefError::Config(format!(
                        "file not found: {}",
                        path.display()
                    )));
                }
            }

            let mut provider = FilesystemProvider::new();
            for path in vertex {
                provider.add_vertex_csv(path, None);
            }
            for path in edge {
                provider.add_edge_csv(path, None);
            }
            provider.vertex_selection_path = vertex_selection.clone();
            provider.edge_selection_path = edge_selection.clone();
            provider.vertex_colormap_path = vertex_colormap.clone();
            provider.edge_colormap_path = edge_colormap.clone();
            Ok(Box::new(provider))
        }
        ProviderKind::Random { samples, seed } => {
            Ok(Box::new(RandomProvider::new(*samples, *seed)))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let provider = build_provider(&cli.provider)?;
    let mut session = Session::new(provider)?;

    if let Some(path) = &cli.config {
        let json = std::fs::read_to_string(path)?;
        let config = SessionConfig::from_json(&json)?;
        session.apply_config(&config)?;
    }

    session.reload()?;
    session.drain()?;

    let data = &session.data;
    info!(
        "session ready: {} vertices ({} columns), {} edges ({} columns)",
        data.vertices.height(),
        data.vertices.width(),
        data.edges.height(),
        data.edges.width()
    );
    info!("label columns: {}", data.vertex_label_columns.join(", "));
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("reefscope: {}", e.user_message());
            eprintln!("run 'reefscope --help' for usage");
            ExitCode::FAILURE
        }
    }
}
