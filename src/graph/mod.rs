//! Resolved build graph consumed by the project generator.
//!
//! A [`BuildGraph`] is the read-only input of a generation pass: the project
//! name, the targets in declaration order, and the argument layers shared by
//! every target. It is usually produced from a [`crate::description`] file via
//! [`BuildGraph::from_description`], but tests and embedders may assemble one
//! directly.
//!
//! # Examples
//!
//! ```
//! use pbxgen::graph::{BuildGraph, SourceEntry, Target, TargetKind};
//!
//! let mut graph = BuildGraph::new("demo");
//! let mut app = Target::new("app", TargetKind::Executable);
//! app.sources.push(SourceEntry::Path("main.c".into()));
//! graph.targets.insert(app.name.clone(), app);
//! assert_eq!(graph.targets.len(), 1);
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

mod from_description;

/// Per-language argument lists, keyed in declaration order.
pub type LanguageArgs = IndexMap<Language, Vec<String>>;

/// Source language of a compiler or argument list.
///
/// The four C-family languages map onto dedicated Xcode flag settings; any
/// other language is carried through so argument layering stays faithful but
/// produces no flag setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    /// C.
    C,
    /// C++.
    Cpp,
    /// Objective-C.
    ObjC,
    /// Objective-C++.
    ObjCpp,
    /// Any other language, by its build-system name.
    Other(String),
}

impl Language {
    /// Build-system name of the language (`c`, `cpp`, `objc`, `objcpp`, …).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::ObjC => "objc",
            Self::ObjCpp => "objcpp",
            Self::Other(name) => name,
        }
    }

    /// Infix of the `OTHER_<infix>FLAGS` build setting, if Xcode has one.
    #[must_use]
    pub const fn setting_infix(&self) -> Option<&'static str> {
        match self {
            Self::C => Some("C"),
            Self::Cpp => Some("CPLUSPLUS"),
            Self::ObjC => Some("OBJC"),
            Self::ObjCpp => Some("OBJCPLUSPLUS"),
            Self::Other(_) => None,
        }
    }

    /// Whether the language is C or C++.
    #[must_use]
    pub const fn is_c_or_cpp(&self) -> bool {
        matches!(self, Self::C | Self::Cpp)
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        match value.as_str() {
            "c" => Self::C,
            "cpp" => Self::Cpp,
            "objc" => Self::ObjC,
            "objcpp" => Self::ObjCpp,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Language {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        match value {
            Language::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a detected compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Compiler {
    /// Compiler identifier, e.g. `clang` or `gcc`.
    pub id: String,
    /// Command used to invoke the compiler.
    #[serde(default)]
    pub command: Vec<String>,
}

impl Compiler {
    /// Create a compiler handle without an explicit command.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: Vec::new(),
        }
    }
}

/// Kind of a target, and the data only that kind carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetKind {
    /// A command-line executable.
    #[default]
    Executable,
    /// A static archive.
    StaticLibrary,
    /// A dynamic library with an optional shared-object version.
    SharedLibrary {
        /// Version appended to the product name, e.g. `1`.
        soversion: Option<String>,
    },
    /// A target built by an external command.
    Custom {
        /// Command line; the first element is the tool.
        command: Vec<String>,
        /// Files the command produces, relative to the target directory.
        outputs: Vec<String>,
        /// Names of targets that must be built first.
        depends: Vec<String>,
    },
}

impl TargetKind {
    /// Name used for this kind in graph descriptions.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Executable => "executable",
            Self::StaticLibrary => "static_library",
            Self::SharedLibrary { .. } => "shared_library",
            Self::Custom { .. } => "custom",
        }
    }
}

/// A source file given relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Directory of the file relative to the source root.
    pub subdir: Utf8PathBuf,
    /// File name within `subdir`.
    pub fname: String,
}

/// One entry of a target's source list.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEntry {
    /// A structured file reference, relative to the source root.
    File(FileRef),
    /// A plain path relative to the target's directory.
    Path(Utf8PathBuf),
    /// An entry of any other shape; it is reported and skipped.
    Unrecognized(serde_json::Value),
}

impl SourceEntry {
    /// Path of the entry relative to the source root.
    ///
    /// Returns `None` for [`SourceEntry::Unrecognized`].
    #[must_use]
    pub fn resolve(&self, target_subdir: &Utf8Path) -> Option<Utf8PathBuf> {
        match self {
            Self::File(file) => Some(file.subdir.join(&file.fname)),
            Self::Path(path) => Some(target_subdir.join(path)),
            Self::Unrecognized(_) => None,
        }
    }
}

/// Include directories declared together, relative to `curdir`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncludeDirs {
    /// Directory the include specification was declared in.
    #[serde(default)]
    pub curdir: Utf8PathBuf,
    /// Directories under the source root.
    #[serde(default)]
    pub dirs: Vec<Utf8PathBuf>,
    /// Directories under the build root.
    #[serde(default)]
    pub build_dirs: Vec<Utf8PathBuf>,
}

/// An external dependency contributing compile arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalDependency {
    /// Dependency name, used in diagnostics only.
    pub name: String,
    /// Compile arguments in Unix syntax.
    #[serde(default)]
    pub compile_args: Vec<String>,
}

/// A buildable unit of the graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Target {
    /// Unique target name.
    pub name: String,
    /// Target kind.
    pub kind: TargetKind,
    /// Directory of the target relative to the source root.
    pub subdir: Utf8PathBuf,
    /// Subproject the target belongs to; empty for the main project.
    pub subproject: String,
    /// Sources in declaration order.
    pub sources: Vec<SourceEntry>,
    /// Prebuilt object files relative to the target's directory.
    pub objects: Vec<Utf8PathBuf>,
    /// Names of targets linked into this one.
    pub link_targets: Vec<String>,
    /// Compilers used by the target, by language.
    pub compilers: IndexMap<Language, Compiler>,
    /// Per-target compile arguments, by language.
    pub extra_args: LanguageArgs,
    /// Per-target link arguments.
    pub link_args: Vec<String>,
    /// Include directory specifications in declaration order.
    pub include_dirs: Vec<IncludeDirs>,
    /// External dependencies in declaration order.
    pub external_deps: Vec<ExternalDependency>,
    /// Whether the target is built for another machine.
    pub is_cross: bool,
    /// Filename prefix overriding the kind's default.
    pub prefix: Option<String>,
    /// Filename suffix (extension without the dot) overriding the default.
    pub suffix: Option<String>,
}

impl Target {
    /// Create an empty target of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    /// Name of the target without any filename decoration.
    #[must_use]
    pub fn basename(&self) -> &str {
        &self.name
    }

    /// Filename prefix, or the kind's default (`lib` for libraries).
    #[must_use]
    pub fn file_prefix(&self) -> &str {
        let default = match self.kind {
            TargetKind::StaticLibrary | TargetKind::SharedLibrary { .. } => "lib",
            TargetKind::Executable | TargetKind::Custom { .. } => "",
        };
        self.prefix.as_deref().unwrap_or(default)
    }

    /// Filename extension without the dot, or the kind's default.
    #[must_use]
    pub fn file_suffix(&self) -> &str {
        let default = match self.kind {
            TargetKind::StaticLibrary => "a",
            TargetKind::SharedLibrary { .. } => "dylib",
            TargetKind::Executable | TargetKind::Custom { .. } => "",
        };
        self.suffix.as_deref().unwrap_or(default)
    }

    /// Filename of the artefact the target produces.
    #[must_use]
    pub fn filename(&self) -> String {
        let ext = match self.file_suffix() {
            "" => String::new(),
            suffix => format!(".{suffix}"),
        };
        match &self.kind {
            TargetKind::Executable | TargetKind::StaticLibrary => {
                format!("{}{}{ext}", self.file_prefix(), self.name)
            }
            TargetKind::SharedLibrary { soversion } => {
                let version = soversion
                    .as_ref()
                    .map(|v| format!(".{v}"))
                    .unwrap_or_default();
                format!("{}{}{version}{ext}", self.file_prefix(), self.name)
            }
            TargetKind::Custom { outputs, .. } => outputs
                .first()
                .cloned()
                .unwrap_or_else(|| self.name.clone()),
        }
    }

    /// Whether the target is driven by an external command.
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self.kind, TargetKind::Custom { .. })
    }

    /// Whether the target produces a dynamic library.
    #[must_use]
    pub const fn is_shared_library(&self) -> bool {
        matches!(self.kind, TargetKind::SharedLibrary { .. })
    }

    /// Names of the targets this one depends on.
    ///
    /// Custom targets depend on their declared dependencies; every other kind
    /// depends on the targets it links.
    #[must_use]
    pub fn dependency_names(&self) -> &[String] {
        match &self.kind {
            TargetKind::Custom { depends, .. } => depends,
            TargetKind::Executable
            | TargetKind::StaticLibrary
            | TargetKind::SharedLibrary { .. } => &self.link_targets,
        }
    }

    /// Source-root-relative paths of the recognised sources.
    pub fn source_paths(&self) -> impl Iterator<Item = Utf8PathBuf> + '_ {
        self.sources
            .iter()
            .filter_map(|source| source.resolve(&self.subdir))
    }

    /// Source-root-relative paths of the declared object files.
    pub fn object_paths(&self) -> impl Iterator<Item = Utf8PathBuf> + '_ {
        self.objects.iter().map(|object| self.subdir.join(object))
    }
}

/// A test registered with the build, serialized for the external test runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestDefinition {
    /// Test name.
    pub name: String,
    /// Command that runs the test; the first element is the executable.
    pub command: Vec<String>,
    /// Extra arguments passed after the command.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables set for the test.
    #[serde(default)]
    pub env: IndexMap<String, String>,
    /// Working directory, defaulting to the build directory.
    #[serde(default)]
    pub workdir: Option<Utf8PathBuf>,
    /// Whether a non-zero exit status counts as success.
    #[serde(default)]
    pub should_fail: bool,
    /// Timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// The resolved build graph of one project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildGraph {
    /// Project name; names the generated bundle.
    pub project_name: String,
    /// Targets keyed by name, in declaration order.
    pub targets: IndexMap<String, Target>,
    /// Arguments applied to every target, by language.
    pub global_args: LanguageArgs,
    /// Arguments applied to the targets of one subproject, by language.
    pub project_args: IndexMap<String, LanguageArgs>,
    /// Tests run by the `RUN_TESTS` aggregate target.
    pub tests: Vec<TestDefinition>,
}

impl BuildGraph {
    /// Create an empty graph for `project_name`.
    #[must_use]
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Self::default()
        }
    }
}

/// Errors raised while loading a description or building a graph from it.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The description could not be read.
    #[error("failed to read build graph description {path}")]
    #[diagnostic(code(pbxgen::graph::read))]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The description is not valid YAML or JSON for the schema.
    #[error("failed to parse build graph description {name}: {message}")]
    #[diagnostic(code(pbxgen::graph::parse))]
    Parse {
        /// Name of the description, usually its path.
        name: String,
        /// Parser message.
        message: String,
    },

    /// The description declares a format this crate does not understand.
    #[error("unsupported description format version {found}")]
    #[diagnostic(
        code(pbxgen::graph::unsupported_version),
        help("set format_version to a 1.x release")
    )]
    UnsupportedVersion {
        /// Version found in the description.
        found: semver::Version,
    },

    /// A target kind has no product type.
    #[error("target {target} has unknown kind {kind}")]
    #[diagnostic(
        code(pbxgen::graph::unknown_target_kind),
        help("use one of executable, static_library, shared_library or custom")
    )]
    UnknownTargetKind {
        /// Target name.
        target: String,
        /// Kind given in the description.
        kind: String,
    },

    /// Two targets share a name.
    #[error("target {target} is declared more than once")]
    #[diagnostic(code(pbxgen::graph::duplicate_target))]
    DuplicateTarget {
        /// Target name.
        target: String,
    },

    /// A target links or depends on a target that is not in the graph.
    #[error("target {target} depends on unknown target {dependency}")]
    #[diagnostic(code(pbxgen::graph::unknown_dependency))]
    UnknownDependency {
        /// Dependent target name.
        target: String,
        /// Missing target name.
        dependency: String,
    },

    /// A target uses a language the toolchain has no compiler for.
    #[error("target {target} uses {language} but no {language} compiler is configured")]
    #[diagnostic(
        code(pbxgen::graph::unknown_compiler),
        help("add a compiler for the language to the toolchain section")
    )]
    UnknownCompiler {
        /// Target name.
        target: String,
        /// Language without a compiler.
        language: Language,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TargetKind::Executable, None, None, "tool")]
    #[case(TargetKind::StaticLibrary, None, None, "libtool.a")]
    #[case(TargetKind::SharedLibrary { soversion: None }, None, None, "libtool.dylib")]
    #[case(
        TargetKind::SharedLibrary { soversion: Some("2".into()) },
        None,
        None,
        "libtool.2.dylib"
    )]
    #[case(TargetKind::Executable, None, Some("exe"), "tool.exe")]
    #[case(TargetKind::StaticLibrary, Some(""), Some("lib"), "tool.lib")]
    fn filename_applies_kind_defaults(
        #[case] kind: TargetKind,
        #[case] prefix: Option<&str>,
        #[case] suffix: Option<&str>,
        #[case] expected: &str,
    ) {
        let mut target = Target::new("tool", kind);
        target.prefix = prefix.map(str::to_owned);
        target.suffix = suffix.map(str::to_owned);
        assert_eq!(target.filename(), expected);
    }

    #[rstest]
    fn custom_filename_uses_first_output() {
        let target = Target::new(
            "gen",
            TargetKind::Custom {
                command: vec!["python3".into()],
                outputs: vec!["gen.h".into(), "gen.c".into()],
                depends: Vec::new(),
            },
        );
        assert_eq!(target.filename(), "gen.h");
    }

    #[rstest]
    fn source_paths_resolve_against_the_right_root() {
        let mut target = Target::new("app", TargetKind::Executable);
        target.subdir = "src".into();
        target.sources = vec![
            SourceEntry::Path("main.c".into()),
            SourceEntry::File(FileRef {
                subdir: "gen".into(),
                fname: "table.c".into(),
            }),
            SourceEntry::Unrecognized(serde_json::json!(42)),
        ];
        let paths: Vec<_> = target.source_paths().collect();
        assert_eq!(
            paths,
            vec![Utf8PathBuf::from("src/main.c"), Utf8PathBuf::from("gen/table.c")]
        );
    }

    #[rstest]
    #[case("c", Language::C)]
    #[case("objcpp", Language::ObjCpp)]
    #[case("rust", Language::Other("rust".into()))]
    fn language_round_trips_through_its_name(#[case] name: &str, #[case] language: Language) {
        assert_eq!(Language::from(name), language);
        assert_eq!(String::from(language), name);
    }

    #[rstest]
    fn dependency_names_follow_the_kind() {
        let mut lib_user = Target::new("app", TargetKind::Executable);
        lib_user.link_targets = vec!["util".into()];
        assert_eq!(lib_user.dependency_names(), ["util".to_owned()]);

        let mut custom = Target::new(
            "gen",
            TargetKind::Custom {
                command: Vec::new(),
                outputs: Vec::new(),
                depends: vec!["app".into()],
            },
        );
        custom.link_targets = vec!["ignored".into()];
        assert_eq!(custom.dependency_names(), ["app".to_owned()]);
    }
}
