//! Serialized build-graph descriptions.
//!
//! A description is the on-disk form of a resolved build: the project name,
//! the toolchain facts, the argument layers, the targets, and the tests. It is
//! written by the upstream build system as YAML or JSON and turned into a
//! [`crate::graph::BuildGraph`] with
//! [`BuildGraph::from_description`](crate::graph::BuildGraph::from_description).
//!
//! ```rust
//! use pbxgen::description::{self, Format};
//!
//! let yaml = concat!(
//!     "format_version: \"1.0.0\"\n",
//!     "project: demo\n",
//!     "toolchain:\n",
//!     "  source_dir: /src\n",
//!     "  build_dir: /build\n",
//!     "targets:\n",
//!     "  - name: app\n",
//!     "    kind: executable\n",
//!     "    sources: [main.c]\n",
//! );
//! let desc = description::from_str(yaml, "pbxgen.yml", Format::Yaml).expect("parse");
//! assert_eq!(desc.targets.len(), 1);
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::graph::{
    ExternalDependency, GraphError, IncludeDirs, Language, LanguageArgs, TestDefinition,
};
use crate::toolchain::ToolchainConfig;

/// Serialization format of a description file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML, parsed with `serde-saphyr`.
    Yaml,
    /// JSON, parsed with `serde_json`.
    Json,
}

impl Format {
    /// Pick the format from a file extension; anything but `yml`/`yaml` is JSON.
    #[must_use]
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some("yml" | "yaml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Top-level description document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDescription {
    /// Version of the description format.
    pub format_version: Version,

    /// Project name.
    pub project: String,

    /// Directories, compilers and argument projections of the build.
    pub toolchain: ToolchainConfig,

    /// Arguments applied to every target.
    #[serde(default)]
    pub global_args: LanguageArgs,

    /// Arguments applied per subproject.
    #[serde(default)]
    pub project_args: IndexMap<String, LanguageArgs>,

    /// Targets in declaration order.
    #[serde(default)]
    pub targets: Vec<TargetDescription>,

    /// Tests run by the test runner.
    #[serde(default)]
    pub tests: Vec<TestDefinition>,
}

/// One source list entry as written in a description.
///
/// Strings are paths relative to the target directory; `{subdir, file}` maps
/// are relative to the source root. Anything else is kept so the generator can
/// report it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SourceDescription {
    /// Path relative to the target directory.
    Path(Utf8PathBuf),
    /// File relative to the source root.
    File {
        /// Directory relative to the source root.
        subdir: Utf8PathBuf,
        /// File name within `subdir`.
        file: String,
    },
    /// Any other shape.
    Other(serde_json::Value),
}

/// A target as written in a description.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDescription {
    /// Unique target name.
    pub name: String,
    /// One of `executable`, `static_library`, `shared_library` or `custom`.
    pub kind: String,
    /// Directory relative to the source root.
    #[serde(default)]
    pub subdir: Utf8PathBuf,
    /// Owning subproject; empty for the main project.
    #[serde(default)]
    pub subproject: String,
    /// Sources in declaration order.
    #[serde(default)]
    pub sources: Vec<SourceDescription>,
    /// Prebuilt objects relative to the target directory.
    #[serde(default)]
    pub objects: Vec<Utf8PathBuf>,
    /// Languages compiled by the target; compilers come from the toolchain.
    #[serde(default)]
    pub languages: Vec<Language>,
    /// Targets linked into this one.
    #[serde(default)]
    pub link_with: Vec<String>,
    /// Per-target compile arguments.
    #[serde(default)]
    pub args: LanguageArgs,
    /// Per-target link arguments.
    #[serde(default)]
    pub link_args: Vec<String>,
    /// Include directory specifications.
    #[serde(default)]
    pub include_dirs: Vec<IncludeDirs>,
    /// External dependencies.
    #[serde(default)]
    pub dependencies: Vec<ExternalDependency>,
    /// Built for another machine.
    #[serde(default)]
    pub cross: bool,
    /// Shared-object version of a shared library.
    #[serde(default)]
    pub soversion: Option<String>,
    /// Filename prefix override.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Filename suffix override.
    #[serde(default)]
    pub suffix: Option<String>,
    /// Command line of a custom target.
    #[serde(default)]
    pub command: Vec<String>,
    /// Outputs of a custom target.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Targets a custom target depends on.
    #[serde(default)]
    pub depends: Vec<String>,
}

/// Parse a description from `text`.
///
/// `name` labels the source in diagnostics.
///
/// # Errors
///
/// Returns [`GraphError::Parse`] if the text is not a valid description.
pub fn from_str(text: &str, name: &str, format: Format) -> Result<GraphDescription, GraphError> {
    let parsed = match format {
        Format::Yaml => serde_saphyr::from_str(text).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| GraphError::Parse {
        name: name.to_owned(),
        message,
    })
}

/// Read and parse the description at `path`, choosing the format by extension.
///
/// # Errors
///
/// Returns [`GraphError::Read`] when the file cannot be read and
/// [`GraphError::Parse`] when its contents are invalid.
pub fn from_path(path: &Utf8Path) -> Result<GraphDescription, GraphError> {
    let text = std::fs::read_to_string(path).map_err(|source| GraphError::Read {
        path: path.to_owned(),
        source,
    })?;
    from_str(&text, path.as_str(), Format::from_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const JSON: &str = r#"{
        "format_version": "1.0.0",
        "project": "demo",
        "toolchain": { "source_dir": "/src", "build_dir": "/build" },
        "targets": [
            {
                "name": "app",
                "kind": "executable",
                "sources": ["main.c", { "subdir": "gen", "file": "table.c" }, 7]
            }
        ]
    }"#;

    #[rstest]
    fn json_sources_keep_their_shape() {
        let desc = from_str(JSON, "demo.json", Format::Json).expect("parse");
        let target = desc.targets.first().expect("target");
        assert!(matches!(
            target.sources.as_slice(),
            [
                SourceDescription::Path(_),
                SourceDescription::File { .. },
                SourceDescription::Other(_)
            ]
        ));
    }

    #[rstest]
    fn unknown_fields_are_rejected() {
        let yaml = concat!(
            "format_version: \"1.0.0\"\n",
            "project: demo\n",
            "toolchain: { source_dir: /src, build_dir: /build }\n",
            "flavour: spicy\n",
        );
        let err = from_str(yaml, "pbxgen.yml", Format::Yaml).expect_err("unknown field");
        assert!(matches!(err, GraphError::Parse { ref name, .. } if name == "pbxgen.yml"));
    }

    #[rstest]
    #[case("pbxgen.yml", Format::Yaml)]
    #[case("graph.yaml", Format::Yaml)]
    #[case("graph.json", Format::Json)]
    #[case("graph", Format::Json)]
    fn format_follows_extension(#[case] path: &str, #[case] expected: Format) {
        assert_eq!(Format::from_path(Utf8Path::new(path)), expected);
    }
}
