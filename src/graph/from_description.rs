//! Description-to-graph conversion.

use indexmap::IndexMap;

use crate::description::{GraphDescription, SourceDescription, TargetDescription};
use crate::toolchain::ToolchainConfig;

use super::{BuildGraph, Compiler, FileRef, GraphError, Language, SourceEntry, Target, TargetKind};

/// Major version of the description format this crate reads.
const FORMAT_MAJOR: u64 = 1;

impl BuildGraph {
    /// Transform a description into a [`BuildGraph`].
    ///
    /// Compilers are resolved against `toolchain`, usually the description's
    /// own toolchain section.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when the format version is unsupported, a target
    /// kind is unknown, a target name repeats, a dependency names a missing
    /// target, or a language has no compiler.
    pub fn from_description(
        desc: &GraphDescription,
        toolchain: &ToolchainConfig,
    ) -> Result<Self, GraphError> {
        if desc.format_version.major != FORMAT_MAJOR {
            return Err(GraphError::UnsupportedVersion {
                found: desc.format_version.clone(),
            });
        }

        let mut targets = IndexMap::with_capacity(desc.targets.len());
        for raw in &desc.targets {
            let target = convert_target(raw, toolchain)?;
            if targets.contains_key(&target.name) {
                return Err(GraphError::DuplicateTarget {
                    target: target.name,
                });
            }
            targets.insert(target.name.clone(), target);
        }
        check_dependencies(&targets)?;

        Ok(Self {
            project_name: desc.project.clone(),
            targets,
            global_args: desc.global_args.clone(),
            project_args: desc.project_args.clone(),
            tests: desc.tests.clone(),
        })
    }
}

fn convert_kind(raw: &TargetDescription) -> Result<TargetKind, GraphError> {
    match raw.kind.as_str() {
        "executable" => Ok(TargetKind::Executable),
        "static_library" => Ok(TargetKind::StaticLibrary),
        "shared_library" => Ok(TargetKind::SharedLibrary {
            soversion: raw.soversion.clone(),
        }),
        "custom" => Ok(TargetKind::Custom {
            command: raw.command.clone(),
            outputs: raw.outputs.clone(),
            depends: raw.depends.clone(),
        }),
        other => Err(GraphError::UnknownTargetKind {
            target: raw.name.clone(),
            kind: other.to_owned(),
        }),
    }
}

fn convert_source(raw: &SourceDescription) -> SourceEntry {
    match raw {
        SourceDescription::Path(path) => SourceEntry::Path(path.clone()),
        SourceDescription::File { subdir, file } => SourceEntry::File(FileRef {
            subdir: subdir.clone(),
            fname: file.clone(),
        }),
        SourceDescription::Other(value) => SourceEntry::Unrecognized(value.clone()),
    }
}

fn resolve_compilers(
    raw: &TargetDescription,
    toolchain: &ToolchainConfig,
) -> Result<IndexMap<Language, Compiler>, GraphError> {
    raw.languages
        .iter()
        .map(|language| {
            toolchain
                .compilers
                .get(language)
                .map(|compiler| (language.clone(), compiler.clone()))
                .ok_or_else(|| GraphError::UnknownCompiler {
                    target: raw.name.clone(),
                    language: language.clone(),
                })
        })
        .collect()
}

fn convert_target(
    raw: &TargetDescription,
    toolchain: &ToolchainConfig,
) -> Result<Target, GraphError> {
    let kind = convert_kind(raw)?;
    // Custom targets own no compiler.
    let compilers = if matches!(kind, TargetKind::Custom { .. }) {
        IndexMap::new()
    } else {
        resolve_compilers(raw, toolchain)?
    };
    Ok(Target {
        name: raw.name.clone(),
        kind,
        subdir: raw.subdir.clone(),
        subproject: raw.subproject.clone(),
        sources: raw.sources.iter().map(convert_source).collect(),
        objects: raw.objects.clone(),
        link_targets: raw.link_with.clone(),
        compilers,
        extra_args: raw.args.clone(),
        link_args: raw.link_args.clone(),
        include_dirs: raw.include_dirs.clone(),
        external_deps: raw.dependencies.clone(),
        is_cross: raw.cross,
        prefix: raw.prefix.clone(),
        suffix: raw.suffix.clone(),
    })
}

fn check_dependencies(targets: &IndexMap<String, Target>) -> Result<(), GraphError> {
    for target in targets.values() {
        let mut deps = target.link_targets.iter().chain(target.dependency_names());
        if let Some(missing) = deps.find(|dep| !targets.contains_key(*dep)) {
            return Err(GraphError::UnknownDependency {
                target: target.name.clone(),
                dependency: missing.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{self, Format};
    use rstest::{fixture, rstest};

    #[fixture]
    fn toolchain() -> ToolchainConfig {
        let mut toolchain = ToolchainConfig::new("/src", "/build");
        toolchain
            .compilers
            .insert(Language::C, Compiler::new("clang"));
        toolchain
    }

    fn target(name: &str, kind: &str) -> TargetDescription {
        TargetDescription {
            name: name.to_owned(),
            kind: kind.to_owned(),
            ..TargetDescription::default()
        }
    }

    fn describe(targets: Vec<TargetDescription>) -> GraphDescription {
        let yaml = concat!(
            "format_version: \"1.2.0\"\n",
            "project: demo\n",
            "toolchain: { source_dir: /src, build_dir: /build }\n",
        );
        let mut desc = description::from_str(yaml, "test", Format::Yaml).expect("parse");
        desc.targets = targets;
        desc
    }

    #[rstest]
    fn kinds_map_onto_the_closed_variant(toolchain: ToolchainConfig) {
        let mut lib = target("util", "shared_library");
        lib.soversion = Some("3".into());
        let desc = describe(vec![
            target("app", "executable"),
            target("ar", "static_library"),
            lib,
            target("gen", "custom"),
        ]);
        let graph = BuildGraph::from_description(&desc, &toolchain).expect("graph");
        let kinds: Vec<_> = graph.targets.values().map(|t| t.kind.as_str()).collect();
        assert_eq!(
            kinds,
            ["executable", "static_library", "shared_library", "custom"]
        );
        let util = graph.targets.get("util").expect("util");
        assert_eq!(
            util.kind,
            TargetKind::SharedLibrary {
                soversion: Some("3".into())
            }
        );
    }

    #[rstest]
    fn unknown_kind_is_fatal(toolchain: ToolchainConfig) {
        let desc = describe(vec![target("fw", "framework")]);
        let err = BuildGraph::from_description(&desc, &toolchain).expect_err("unknown kind");
        assert!(matches!(
            err,
            GraphError::UnknownTargetKind { ref target, ref kind } if target == "fw" && kind == "framework"
        ));
    }

    #[rstest]
    fn duplicate_names_are_rejected(toolchain: ToolchainConfig) {
        let desc = describe(vec![target("app", "executable"), target("app", "executable")]);
        let err = BuildGraph::from_description(&desc, &toolchain).expect_err("duplicate");
        assert!(matches!(err, GraphError::DuplicateTarget { .. }));
    }

    #[rstest]
    fn missing_link_target_is_rejected(toolchain: ToolchainConfig) {
        let mut app = target("app", "executable");
        app.link_with = vec!["nowhere".into()];
        let err = BuildGraph::from_description(&describe(vec![app]), &toolchain)
            .expect_err("missing link target");
        assert!(matches!(
            err,
            GraphError::UnknownDependency { ref dependency, .. } if dependency == "nowhere"
        ));
    }

    #[rstest]
    fn languages_resolve_to_toolchain_compilers(toolchain: ToolchainConfig) {
        let mut app = target("app", "executable");
        app.languages = vec![Language::C];
        let graph =
            BuildGraph::from_description(&describe(vec![app.clone()]), &toolchain).expect("graph");
        let compiler = graph
            .targets
            .get("app")
            .and_then(|t| t.compilers.get(&Language::C))
            .expect("c compiler");
        assert_eq!(compiler.id, "clang");

        app.languages = vec![Language::Cpp];
        let err = BuildGraph::from_description(&describe(vec![app]), &toolchain)
            .expect_err("no c++ compiler");
        assert!(matches!(err, GraphError::UnknownCompiler { .. }));
    }

    #[rstest]
    fn major_version_two_is_unsupported(toolchain: ToolchainConfig) {
        let mut desc = describe(Vec::new());
        desc.format_version = semver::Version::new(2, 0, 0);
        let err = BuildGraph::from_description(&desc, &toolchain).expect_err("version");
        assert!(matches!(err, GraphError::UnsupportedVersion { .. }));
    }
}
