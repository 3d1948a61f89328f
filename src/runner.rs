//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! loads the description named on the command line and runs the requested
//! command against it.

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::cli::{Cli, Commands, GenerateArgs, GraphArgs};
use crate::description;
use crate::graph::BuildGraph;
use crate::pbxproj;
use crate::toolchain::{Toolchain, ToolchainConfig};

/// Execute the parsed [`Cli`] commands.
///
/// # Errors
///
/// Returns an error if the description cannot be loaded or the project cannot
/// be generated or written.
pub fn run(cli: &Cli) -> Result<()> {
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Commands::Generate(GenerateArgs::default()));
    match command {
        Commands::Generate(args) => handle_generate(cli, &args),
        Commands::Print(args) => handle_print(cli, &args),
    }
}

fn handle_generate(cli: &Cli, args: &GenerateArgs) -> Result<()> {
    let loaded = load(cli, &args.graph)?;
    let out_dir = match &args.out_dir {
        Some(dir) => utf8(&resolve_cli_path(cli, dir))?,
        None => loaded.toolchain.build_dir().to_owned(),
    };
    let options = args.graph.options();
    let project = pbxproj::write_project(&loaded.graph, &loaded.toolchain, &options, &out_dir)
        .with_context(|| format!("failed to generate Xcode project for {}", loaded.path))?;
    info!(project = %project, "project written");
    Ok(())
}

fn handle_print(cli: &Cli, args: &GraphArgs) -> Result<()> {
    let loaded = load(cli, args)?;
    let text = pbxproj::generate(&loaded.graph, &loaded.toolchain, &args.options())
        .with_context(|| format!("failed to render Xcode project for {}", loaded.path))?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write project to stdout")
}

/// A description turned into a graph, with its anchored toolchain.
struct Loaded {
    path: Utf8PathBuf,
    graph: BuildGraph,
    toolchain: ToolchainConfig,
}

fn load(cli: &Cli, args: &GraphArgs) -> Result<Loaded> {
    let path = utf8(&resolve_cli_path(cli, &args.graph))?;
    debug!(path = %path, "loading build graph description");
    let desc = description::from_path(&path)?;
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    let base = description_dir(&utf8(&cwd)?, &path);
    let toolchain = anchor_toolchain(desc.toolchain.clone(), &base);
    let graph = BuildGraph::from_description(&desc, &toolchain)
        .with_context(|| format!("invalid build graph description {path}"))?;
    debug!(
        project = %graph.project_name,
        targets = graph.targets.len(),
        tests = graph.tests.len(),
        "build graph loaded"
    );
    Ok(Loaded {
        path,
        graph,
        toolchain,
    })
}

/// Absolute directory holding the description at `path`.
fn description_dir(cwd: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    let absolute = cwd.join(path);
    absolute.parent().map_or_else(|| cwd.to_owned(), Utf8Path::to_owned)
}

/// Resolve relative toolchain directories against the description's directory.
fn anchor_toolchain(mut toolchain: ToolchainConfig, base: &Utf8Path) -> ToolchainConfig {
    for dir in [
        &mut toolchain.source_dir,
        &mut toolchain.build_dir,
        &mut toolchain.script_dir,
    ] {
        if dir.is_relative() {
            *dir = base.join(&*dir);
        }
    }
    toolchain
}

/// Resolve a command-line path relative to the `-C/--directory` option.
fn resolve_cli_path(cli: &Cli, path: &Path) -> std::path::PathBuf {
    match &cli.directory {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

fn utf8(path: &Path) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .map_err(|raw| anyhow!("path {} is not valid UTF-8", raw.display()))
}
