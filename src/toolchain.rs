//! Toolchain and environment collaborator.
//!
//! The generator never detects compilers or computes option arguments itself.
//! It asks a [`Toolchain`] for directories, compiler handles, and the argument
//! projections layered beneath each target's own arguments.
//! [`ToolchainConfig`] is the serde-loadable implementation used by the
//! `pbxgen` binary.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::graph::{Compiler, Language, LanguageArgs};

/// Name of the test runner looked up in the script directory when the
/// toolchain does not name one.
pub const DEFAULT_TEST_RUNNER: &str = "pbxgen-testrunner";

/// Environment facts and argument projections supplied by the build system.
pub trait Toolchain {
    /// Root of the source tree.
    fn source_dir(&self) -> &Utf8Path;

    /// Root of the build tree.
    fn build_dir(&self) -> &Utf8Path;

    /// Directory holding helper scripts such as the test runner.
    fn script_dir(&self) -> &Utf8Path;

    /// Compiler detected for `language`, if any.
    fn compiler(&self, language: &Language) -> Option<&Compiler>;

    /// Arguments derived from the base options for `compiler`.
    fn base_compile_args(&self, language: &Language, compiler: &Compiler) -> Vec<String>;

    /// Arguments derived from the compiler options for `compiler`.
    fn option_compile_args(&self, language: &Language, compiler: &Compiler) -> Vec<String>;

    /// Arguments supplied by the user's environment, e.g. `CFLAGS`.
    fn external_args(&self, language: &Language) -> &[String];

    /// Translate dependency arguments from Unix syntax to `compiler`'s syntax.
    fn to_native_args(&self, compiler: &Compiler, args: &[String]) -> Vec<String>;

    /// Command prefix of the external test runner.
    fn test_runner(&self) -> Vec<String>;
}

/// Toolchain facts loaded from a graph description.
///
/// # Examples
///
/// ```
/// use pbxgen::toolchain::{Toolchain, ToolchainConfig};
///
/// let toolchain = ToolchainConfig::new("/src", "/build");
/// assert_eq!(toolchain.build_dir().as_str(), "/build");
/// assert!(toolchain.test_runner()[0].ends_with("pbxgen-testrunner"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Root of the source tree.
    pub source_dir: Utf8PathBuf,
    /// Root of the build tree.
    pub build_dir: Utf8PathBuf,
    /// Directory holding helper scripts.
    #[serde(default)]
    pub script_dir: Utf8PathBuf,
    /// Detected compilers, by language.
    #[serde(default)]
    pub compilers: IndexMap<Language, Compiler>,
    /// Base-option arguments, by language.
    #[serde(default)]
    pub base_args: LanguageArgs,
    /// Compiler-option arguments, by language.
    #[serde(default)]
    pub option_args: LanguageArgs,
    /// Environment-supplied arguments, by language.
    #[serde(default)]
    pub external_args: LanguageArgs,
    /// Test runner command prefix; defaults to the script directory's runner.
    #[serde(default)]
    pub test_runner: Vec<String>,
}

impl ToolchainConfig {
    /// Create a configuration with only the source and build roots set.
    #[must_use]
    pub fn new(source_dir: impl Into<Utf8PathBuf>, build_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            ..Self::default()
        }
    }
}

fn args_for(map: &LanguageArgs, language: &Language) -> Vec<String> {
    map.get(language).cloned().unwrap_or_default()
}

impl Toolchain for ToolchainConfig {
    fn source_dir(&self) -> &Utf8Path {
        &self.source_dir
    }

    fn build_dir(&self) -> &Utf8Path {
        &self.build_dir
    }

    fn script_dir(&self) -> &Utf8Path {
        &self.script_dir
    }

    fn compiler(&self, language: &Language) -> Option<&Compiler> {
        self.compilers.get(language)
    }

    fn base_compile_args(&self, language: &Language, _compiler: &Compiler) -> Vec<String> {
        args_for(&self.base_args, language)
    }

    fn option_compile_args(&self, language: &Language, _compiler: &Compiler) -> Vec<String> {
        args_for(&self.option_args, language)
    }

    fn external_args(&self, language: &Language) -> &[String] {
        self.external_args
            .get(language)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    // Xcode drives clang, which already accepts the Unix spelling.
    fn to_native_args(&self, _compiler: &Compiler, args: &[String]) -> Vec<String> {
        args.to_vec()
    }

    fn test_runner(&self) -> Vec<String> {
        if self.test_runner.is_empty() {
            vec![self.script_dir.join(DEFAULT_TEST_RUNNER).into_string()]
        } else {
            self.test_runner.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn explicit_test_runner_wins_over_script_dir() {
        let mut toolchain = ToolchainConfig::new("/src", "/build");
        toolchain.script_dir = "/opt/scripts".into();
        assert_eq!(
            toolchain.test_runner(),
            vec!["/opt/scripts/pbxgen-testrunner".to_owned()]
        );

        toolchain.test_runner = vec!["python3".into(), "run.py".into()];
        assert_eq!(toolchain.test_runner(), vec!["python3", "run.py"]);
    }

    #[rstest]
    fn missing_language_yields_no_arguments() {
        let mut toolchain = ToolchainConfig::new("/src", "/build");
        toolchain
            .external_args
            .insert(Language::C, vec!["-O2".into()]);
        assert_eq!(toolchain.external_args(&Language::C), ["-O2".to_owned()]);
        assert!(toolchain.external_args(&Language::Cpp).is_empty());
        let clang = Compiler::new("clang");
        assert!(toolchain.base_compile_args(&Language::C, &clang).is_empty());
    }
}
