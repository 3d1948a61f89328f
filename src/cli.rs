//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. Running
//! `pbxgen` without a subcommand behaves like `pbxgen generate`.

use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use std::path::PathBuf;

use crate::pbxproj::{BuildVariant, GeneratorOptions};

/// Description file read when none is given.
pub const DEFAULT_GRAPH: &str = "pbxgen.yml";

/// Generate Xcode projects from resolved build graph descriptions.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Optional subcommand to execute; defaults to `generate` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Parse the provided arguments, applying the default command when needed.
    ///
    /// # Errors
    ///
    /// Returns the clap error when the arguments are invalid.
    pub fn try_parse_with_default<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).map(Self::with_default_command)
    }

    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Generate(GenerateArgs::default()));
        }
        self
    }
}

/// Arguments naming the description and shaping the generated project.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct GraphArgs {
    /// Build graph description to read (YAML or JSON).
    #[arg(value_name = "GRAPH", default_value = DEFAULT_GRAPH)]
    pub graph: PathBuf,

    /// Build variant to configure; repeat for several. Defaults to `debug`.
    /// Repeated names are configured once.
    #[arg(long = "variant", value_name = "NAME")]
    pub variants: Vec<String>,

    /// Extension of the generated project bundle.
    #[arg(long, value_name = "EXT", default_value = "xcodeproj")]
    pub extension: String,
}

impl Default for GraphArgs {
    fn default() -> Self {
        Self {
            graph: PathBuf::from(DEFAULT_GRAPH),
            variants: Vec::new(),
            extension: GeneratorOptions::default().extension,
        }
    }
}

impl GraphArgs {
    /// Generator options selected by these arguments.
    #[must_use]
    pub fn options(&self) -> GeneratorOptions {
        let mut options = GeneratorOptions {
            extension: self.extension.clone(),
            ..GeneratorOptions::default()
        };
        if !self.variants.is_empty() {
            options.variants = self.variants.iter().unique().map(BuildVariant::new).collect();
        }
        options
    }
}

/// Arguments accepted by the `generate` command.
#[derive(Debug, Args, PartialEq, Eq, Clone, Default)]
pub struct GenerateArgs {
    /// Description and project options.
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Directory to write the bundle into; defaults to the build directory.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Available top-level commands for pbxgen.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Write the Xcode project bundle `default`.
    Generate(GenerateArgs),

    /// Print the project file to standard output without writing anything.
    Print(GraphArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_with_default(args).expect("valid arguments")
    }

    #[rstest]
    fn bare_invocation_generates_from_the_default_graph() {
        let cli = parse(&["pbxgen"]);
        assert_eq!(
            cli.command,
            Some(Commands::Generate(GenerateArgs::default()))
        );
    }

    #[rstest]
    fn print_accepts_variants_and_extension() {
        let cli = parse(&[
            "pbxgen",
            "-C",
            "work",
            "print",
            "graph.json",
            "--variant",
            "debug",
            "--variant",
            "release",
            "--extension",
            "xcproj",
        ]);
        let Some(Commands::Print(args)) = cli.command else {
            panic!("expected print command");
        };
        assert_eq!(args.graph, PathBuf::from("graph.json"));
        let options = args.options();
        assert_eq!(options.extension, "xcproj");
        let names: Vec<_> = options.variants.iter().map(BuildVariant::as_str).collect();
        assert_eq!(names, ["debug", "release"]);
        assert_eq!(cli.directory, Some(PathBuf::from("work")));
    }

    #[rstest]
    fn repeated_variants_are_configured_once() {
        let cli = parse(&["pbxgen", "print", "--variant", "debug", "--variant", "debug"]);
        let Some(Commands::Print(args)) = cli.command else {
            panic!("expected print command");
        };
        assert_eq!(args.options().variants, [BuildVariant::new("debug")]);
    }

    #[rstest]
    fn generate_takes_an_output_directory() {
        let cli = parse(&["pbxgen", "generate", "--out-dir", "out"]);
        let Some(Commands::Generate(args)) = cli.command else {
            panic!("expected generate command");
        };
        assert_eq!(args.out_dir, Some(PathBuf::from("out")));
        assert_eq!(args.graph.graph, PathBuf::from(DEFAULT_GRAPH));
        assert_eq!(args.graph.options(), GeneratorOptions::default());
    }
}
