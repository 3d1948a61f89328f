//! Xcode project generator.
//!
//! This module converts a [`BuildGraph`] into an Xcode project bundle
//! (`<project>.xcodeproj/project.pbxproj`). A pass has two phases: every
//! object identifier is allocated up front into an immutable
//! [`GenerationContext`], then the section emitters write the records in a
//! fixed order, cross-referencing each other only through that context.
//!
//! Identifiers are random, so two passes over the same graph produce the same
//! structure with different identifier values.
//!
//! ```
//! use pbxgen::graph::{BuildGraph, SourceEntry, Target, TargetKind};
//! use pbxgen::pbxproj::{self, GeneratorOptions};
//! use pbxgen::toolchain::ToolchainConfig;
//!
//! let mut graph = BuildGraph::new("demo");
//! let mut app = Target::new("app", TargetKind::Executable);
//! app.sources.push(SourceEntry::Path("main.c".into()));
//! graph.targets.insert("app".into(), app);
//!
//! let toolchain = ToolchainConfig::new("/src", "/build");
//! let text = pbxproj::generate(&graph, &toolchain, &GeneratorOptions::default())?;
//! assert!(text.starts_with("// !$*UTF8*$!"));
//! assert!(text.contains("productType = \"com.apple.product-type.tool\";"));
//! # Ok::<(), pbxgen::pbxproj::GenerateError>(())
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use miette::Diagnostic;
use rand::RngCore;
use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::graph::BuildGraph;
use crate::toolchain::Toolchain;

mod context;
pub mod file_types;
pub mod flags;
mod ids;
mod sections;
mod writer;

pub use context::{AggregateIds, GenerationContext, RefMap};
pub use ids::{IdRegistry, ObjectId};
pub use writer::PbxWriter;

/// A named build configuration, such as `debug`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildVariant(String);

impl BuildVariant {
    /// Create a variant called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the variant.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for BuildVariant {
    fn default() -> Self {
        Self::new("debug")
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Settings of a generation pass that do not come from the build graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Extension of the project bundle directory.
    pub extension: String,
    /// Name of the project file inside the bundle.
    pub project_file: String,
    /// Build variants; the first is the default configuration.
    pub variants: Vec<BuildVariant>,
    /// Name of the serialized test data file in the build directory.
    pub test_data_file: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            extension: "xcodeproj".to_owned(),
            project_file: "project.pbxproj".to_owned(),
            variants: vec![BuildVariant::default()],
            test_data_file: "pbxgen_tests.json".to_owned(),
        }
    }
}

impl GeneratorOptions {
    /// Options with a single variant called `name`.
    #[must_use]
    pub fn with_variant(name: impl Into<String>) -> Self {
        Self {
            variants: vec![BuildVariant::new(name)],
            ..Self::default()
        }
    }
}

/// Errors raised while generating a project.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerateError {
    /// A target has objects but no C or C++ compiler to handle them.
    #[error("target {target} has object files but no C or C++ compiler is available")]
    #[diagnostic(
        code(pbxgen::generate::missing_compiler),
        help("configure a c or cpp compiler in the toolchain")
    )]
    MissingCompiler {
        /// Target name.
        target: String,
    },

    /// A target links a target that is not in the graph.
    #[error("target {target} links unknown target {link}")]
    #[diagnostic(code(pbxgen::generate::unknown_link_target))]
    UnknownLinkTarget {
        /// Linking target.
        target: String,
        /// Missing link target.
        link: String,
    },

    /// The options name no build variant.
    #[error("at least one build variant is required")]
    #[diagnostic(code(pbxgen::generate::no_variants))]
    NoVariants,

    /// The options name the same build variant twice.
    #[error("build variant {variant} is listed more than once")]
    #[diagnostic(
        code(pbxgen::generate::duplicate_variant),
        help("list each variant name once")
    )]
    DuplicateVariant {
        /// Repeated variant name.
        variant: String,
    },

    /// An emitter looked up an object that was never allocated.
    #[error("no {map} identifier was allocated for {key}")]
    #[diagnostic(code(pbxgen::generate::unmapped_object))]
    UnmappedObject {
        /// Name of the reference map.
        map: &'static str,
        /// Key that was looked up.
        key: String,
    },

    /// Writing the project text failed.
    #[error("failed to write project")]
    #[diagnostic(code(pbxgen::generate::write))]
    Write(#[from] io::Error),

    /// A file or directory under `path` could not be created.
    #[error("failed to create {path}")]
    #[diagnostic(code(pbxgen::generate::create))]
    Create {
        /// Path being created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The test definitions could not be serialized.
    #[error("failed to serialize test data to {path}")]
    #[diagnostic(code(pbxgen::generate::test_data))]
    TestData {
        /// Destination of the test data.
        path: Utf8PathBuf,
        /// Serializer error.
        #[source]
        source: serde_json::Error,
    },
}

/// One generation pass: a graph, its toolchain, and the allocated identifiers.
pub struct Generator<'a> {
    graph: &'a BuildGraph,
    toolchain: &'a dyn Toolchain,
    options: &'a GeneratorOptions,
    context: GenerationContext,
}

impl fmt::Debug for Generator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("project", &self.graph.project_name)
            .field("options", self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> Generator<'a> {
    /// Allocate every identifier of the pass from the thread-local generator.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::NoVariants`] if `options` names no variant and
    /// [`GenerateError::DuplicateVariant`] if it names one twice.
    pub fn new(
        graph: &'a BuildGraph,
        toolchain: &'a dyn Toolchain,
        options: &'a GeneratorOptions,
    ) -> Result<Self, GenerateError> {
        Self::with_ids(graph, toolchain, options, &mut IdRegistry::new())
    }

    /// Allocate every identifier of the pass from `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::NoVariants`] if `options` names no variant and
    /// [`GenerateError::DuplicateVariant`] if it names one twice.
    pub fn with_ids<R: RngCore>(
        graph: &'a BuildGraph,
        toolchain: &'a dyn Toolchain,
        options: &'a GeneratorOptions,
        ids: &mut IdRegistry<R>,
    ) -> Result<Self, GenerateError> {
        if options.variants.is_empty() {
            return Err(GenerateError::NoVariants);
        }
        if let Some(repeat) = options.variants.iter().duplicates().next() {
            return Err(GenerateError::DuplicateVariant {
                variant: repeat.to_string(),
            });
        }
        let context = GenerationContext::build(graph, &options.variants, ids);
        debug!(
            project = %graph.project_name,
            targets = graph.targets.len(),
            objects = ids.issued(),
            "allocated project object identifiers"
        );
        Ok(Self {
            graph,
            toolchain,
            options,
            context,
        })
    }

    /// Identifiers allocated for this pass.
    #[must_use]
    pub const fn context(&self) -> &GenerationContext {
        &self.context
    }

    /// Location of the serialized test data passed to the test runner.
    #[must_use]
    pub fn test_data_path(&self) -> Utf8PathBuf {
        self.toolchain
            .build_dir()
            .join(&self.options.test_data_file)
    }

    /// Directory of the project bundle under `out_dir`.
    #[must_use]
    pub fn bundle_dir(&self, out_dir: &Utf8Path) -> Utf8PathBuf {
        out_dir.join(format!(
            "{}.{}",
            self.graph.project_name, self.options.extension
        ))
    }

    /// Write the project text to `out` and return it.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError`] when a target cannot be projected or writing
    /// fails.
    pub fn render<W: Write>(&self, out: W) -> Result<W, GenerateError> {
        let mut writer = PbxWriter::new(out);
        let test_data = self.test_data_path();
        let pass = sections::Generation {
            graph: self.graph,
            toolchain: self.toolchain,
            variants: &self.options.variants,
            cx: &self.context,
            test_data: &test_data,
        };
        sections::emit_all(&mut writer, &pass)?;
        Ok(writer.into_inner())
    }

    /// Serialize the graph's tests to [`Generator::test_data_path`].
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError`] if serialization or writing fails.
    pub fn write_test_data(&self) -> Result<Utf8PathBuf, GenerateError> {
        let path = self.test_data_path();
        let json = serde_json::to_string_pretty(&self.graph.tests).map_err(|source| {
            GenerateError::TestData {
                path: path.clone(),
                source,
            }
        })?;
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        fs::write(&path, json).map_err(|source| GenerateError::Create {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Write the project bundle under `out_dir` and return the project file.
    ///
    /// The text is written to a temporary file inside the bundle and renamed
    /// over the project file only once complete, so a failed pass leaves any
    /// previous project untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError`] when directories or files cannot be created,
    /// or when rendering fails.
    pub fn write(&self, out_dir: &Utf8Path) -> Result<Utf8PathBuf, GenerateError> {
        let bundle = self.bundle_dir(out_dir);
        create_dir(&bundle)?;
        self.write_test_data()?;

        let target = bundle.join(&self.options.project_file);
        let staging = NamedTempFile::new_in(&bundle).map_err(|source| GenerateError::Create {
            path: bundle.clone(),
            source,
        })?;
        let mut out = self.render(BufWriter::new(staging))?;
        out.flush()?;
        let written = out.into_inner().map_err(io::IntoInnerError::into_error)?;
        written.persist(&target).map_err(|err| GenerateError::Create {
            path: target.clone(),
            source: err.error,
        })?;
        info!("Generated Xcode project at {target}");
        Ok(target)
    }
}

fn create_dir(path: &Utf8Path) -> Result<(), GenerateError> {
    fs::create_dir_all(path).map_err(|source| GenerateError::Create {
        path: path.to_owned(),
        source,
    })
}

/// Generate the project text for `graph` as a string.
///
/// # Errors
///
/// Returns [`GenerateError`] when a target cannot be projected onto the
/// project format.
pub fn generate(
    graph: &BuildGraph,
    toolchain: &dyn Toolchain,
    options: &GeneratorOptions,
) -> Result<String, GenerateError> {
    let bytes = Generator::new(graph, toolchain, options)?.render(Vec::new())?;
    String::from_utf8(bytes).map_err(|err| GenerateError::Write(io::Error::other(err)))
}

/// Write the project bundle for `graph` under `out_dir`.
///
/// Returns the path of the written project file.
///
/// # Errors
///
/// Returns [`GenerateError`] when generation or any filesystem step fails.
pub fn write_project(
    graph: &BuildGraph,
    toolchain: &dyn Toolchain,
    options: &GeneratorOptions,
    out_dir: &Utf8Path,
) -> Result<Utf8PathBuf, GenerateError> {
    Generator::new(graph, toolchain, options)?.write(out_dir)
}
