//! Per-target build-setting projection.
//!
//! [`project`] folds the argument layers of a target into the values written
//! to its `XCBuildConfiguration`: header search paths, one flag list per
//! language, link arguments, and the product name and install path.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

use crate::graph::{BuildGraph, Compiler, Language, Target, TargetKind};
use crate::toolchain::Toolchain;

use super::{BuildVariant, GenerateError};

/// Prefix of include-path arguments.
const INCLUDE_PREFIX: &str = "-I";

/// Link flags placed before every dynamic library build.
const DYLIB_LINK_ARGS: [&str; 2] = ["-dynamiclib", "-Wl,-headerpad_max_install_names"];

/// Link flags placed before linked targets when any of them is a dylib.
const DYLIB_SEARCH_ARGS: [&str; 2] = ["-Wl,-search_paths_first", "-Wl,-headerpad_max_install_names"];

/// Build settings of one target in one build variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetFlags {
    /// Header search directories, de-duplicated, in search order.
    pub header_dirs: Vec<String>,
    /// Compile flags per language, with include paths removed.
    pub language_flags: IndexMap<Language, Vec<String>>,
    /// Linker arguments.
    pub link_args: Vec<String>,
    /// Install directory; only set for shared libraries.
    pub install_path: Option<Utf8PathBuf>,
    /// Product name, with the shared-object version when there is one.
    pub product_name: String,
    /// Shared-object version of a dynamic library.
    pub dylib_version: Option<String>,
}

/// Project `target` onto the build settings of `variant`.
///
/// # Errors
///
/// Returns [`GenerateError::UnknownLinkTarget`] when a link target is missing
/// from `graph`, and [`GenerateError::MissingCompiler`] when the target has
/// object files but neither it nor the toolchain has a C or C++ compiler.
pub fn project(
    graph: &BuildGraph,
    toolchain: &dyn Toolchain,
    target: &Target,
    variant: &BuildVariant,
) -> Result<TargetFlags, GenerateError> {
    let build_dir = toolchain.build_dir();
    let mut flags = TargetFlags {
        header_dirs: vec![build_dir.to_string()],
        product_name: target.basename().to_owned(),
        ..TargetFlags::default()
    };

    if target.is_custom() {
        let dir = toolchain
            .source_dir()
            .join(&target.subdir)
            .join(variant.as_str());
        flags.header_dirs.push(dir.into_string());
        return Ok(flags);
    }

    for spec in target.include_dirs.iter().rev() {
        let curdir = &spec.curdir;
        let source_dirs = spec
            .dirs
            .iter()
            .map(|dir| toolchain.source_dir().join(curdir).join(dir));
        let build_dirs = spec
            .build_dirs
            .iter()
            .map(|dir| build_dir.join(curdir).join(dir));
        flags
            .header_dirs
            .extend(source_dirs.chain(build_dirs).map(Utf8PathBuf::into_string));
    }

    flags.link_args = link_args(graph, toolchain, target, variant)?;
    if let TargetKind::SharedLibrary { soversion } = &target.kind {
        flags.install_path = Some(build_dir.join(&target.subdir).join(variant.as_str()));
        if let Some(version) = soversion {
            flags.product_name = format!("{}.{version}", target.basename());
        }
        flags.dylib_version.clone_from(soversion);
    }

    let mut merged = merged_args(graph, toolchain, target);
    let dep_args = dependency_args(toolchain, target, &mut flags.header_dirs)?;
    for args in merged.values_mut() {
        args.retain(|arg| match arg.strip_prefix(INCLUDE_PREFIX) {
            Some(dir) => {
                push_unique(&mut flags.header_dirs, dir.to_owned());
                false
            }
            None => true,
        });
        for arg in &dep_args {
            if !args.contains(arg) {
                args.push(arg.clone());
            }
        }
    }
    flags.language_flags = merged;
    Ok(flags)
}

/// Arguments per owned language, lowest precedence first.
fn merged_args(
    graph: &BuildGraph,
    toolchain: &dyn Toolchain,
    target: &Target,
) -> IndexMap<Language, Vec<String>> {
    let project_args = graph.project_args.get(&target.subproject);
    target
        .compilers
        .iter()
        .map(|(language, compiler)| {
            let mut args = toolchain.base_compile_args(language, compiler);
            args.extend(toolchain.option_compile_args(language, compiler));
            let global = graph.global_args.get(language);
            let subproject = project_args.and_then(|by_lang| by_lang.get(language));
            args.extend(global.into_iter().flatten().cloned());
            args.extend(subproject.into_iter().flatten().cloned());
            if !target.is_cross {
                args.extend(toolchain.external_args(language).iter().cloned());
            }
            args.extend(target.extra_args.get(language).into_iter().flatten().cloned());
            (language.clone(), args)
        })
        .collect()
}

/// Compile arguments of external dependencies in native syntax.
///
/// Include paths go to `header_dirs`; the rest are returned de-duplicated.
fn dependency_args(
    toolchain: &dyn Toolchain,
    target: &Target,
    header_dirs: &mut Vec<String>,
) -> Result<Vec<String>, GenerateError> {
    let compiler = c_family_compiler(target, toolchain);
    if compiler.is_none() && !target.objects.is_empty() {
        return Err(GenerateError::MissingCompiler {
            target: target.name.clone(),
        });
    }
    let mut rest = Vec::new();
    for dep in target.external_deps.iter().rev() {
        let native = compiler.map_or_else(
            || dep.compile_args.clone(),
            |compiler| toolchain.to_native_args(compiler, &dep.compile_args),
        );
        for arg in native {
            match arg.strip_prefix(INCLUDE_PREFIX) {
                Some(dir) => push_unique(header_dirs, dir.to_owned()),
                None => push_unique(&mut rest, arg),
            }
        }
    }
    Ok(rest)
}

/// The target's C or C++ compiler, else the toolchain's.
fn c_family_compiler<'a>(target: &'a Target, toolchain: &'a dyn Toolchain) -> Option<&'a Compiler> {
    target
        .compilers
        .iter()
        .find(|(language, _)| language.is_c_or_cpp())
        .map(|(_, compiler)| compiler)
        .or_else(|| toolchain.compiler(&Language::C))
        .or_else(|| toolchain.compiler(&Language::Cpp))
}

fn link_args(
    graph: &BuildGraph,
    toolchain: &dyn Toolchain,
    target: &Target,
    variant: &BuildVariant,
) -> Result<Vec<String>, GenerateError> {
    let mut libs = Vec::with_capacity(target.link_targets.len());
    let mut links_dylib = false;
    for name in &target.link_targets {
        let linked = graph
            .targets
            .get(name)
            .ok_or_else(|| GenerateError::UnknownLinkTarget {
                target: target.name.clone(),
                link: name.clone(),
            })?;
        links_dylib |= linked.is_shared_library();
        let path = toolchain
            .build_dir()
            .join(&linked.subdir)
            .join(variant.as_str())
            .join(linked.filename());
        libs.push(format!("'{path}'"));
    }

    let mut args: Vec<String> = Vec::new();
    if target.is_shared_library() {
        args.extend(DYLIB_LINK_ARGS.map(str::to_owned));
    }
    if links_dylib {
        args.extend(DYLIB_SEARCH_ARGS.map(str::to_owned));
    }
    args.extend(libs);
    args.extend(target.link_args.iter().cloned());
    Ok(args)
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

/// Join `args` into one flag string, escaping embedded double quotes.
///
/// ```
/// use pbxgen::pbxproj::flags::flag_string;
///
/// let args = vec!["-DNAME=\"x\"".to_owned(), "-O0".to_owned()];
/// assert_eq!(flag_string(&args), r#"-DNAME=\\\"x\\\" -O0"#);
/// ```
#[must_use]
pub fn flag_string(args: &[String]) -> String {
    args.join(" ").replace('"', r#"\\\""#)
}

/// Wrap `value` in double quotes, escaping backslashes and quotes.
#[must_use]
pub fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Lexical path leading from directory `from` to `to`.
///
/// Returns `.` when both name the same directory.
///
/// ```
/// use camino::Utf8Path;
/// use pbxgen::pbxproj::flags::relative_path;
///
/// let rel = relative_path(Utf8Path::new("/work/build"), Utf8Path::new("/work/src"));
/// assert_eq!(rel.as_str(), "../src");
/// ```
#[must_use]
pub fn relative_path(from: &Utf8Path, to: &Utf8Path) -> Utf8PathBuf {
    let parts = |path: &Utf8Path| -> Vec<String> {
        path.components()
            .filter(|c| !matches!(c, Utf8Component::CurDir))
            .map(|c| c.as_str().to_owned())
            .collect()
    };
    let up = parts(from);
    let down = parts(to);
    let common = up.iter().zip(&down).take_while(|(a, b)| a == b).count();

    let mut rel = Utf8PathBuf::new();
    for _ in common..up.len() {
        rel.push("..");
    }
    for part in down.iter().skip(common) {
        rel.push(part);
    }
    if rel.as_str().is_empty() {
        rel.push(".");
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ExternalDependency, IncludeDirs};
    use crate::toolchain::ToolchainConfig;
    use rstest::{fixture, rstest};

    #[fixture]
    fn toolchain() -> ToolchainConfig {
        let mut toolchain = ToolchainConfig::new("/src", "/build");
        toolchain.compilers.insert(Language::C, Compiler::new("clang"));
        toolchain
    }

    fn c_target(name: &str, kind: TargetKind) -> Target {
        let mut target = Target::new(name, kind);
        target.compilers.insert(Language::C, Compiler::new("clang"));
        target
    }

    fn graph_with(targets: Vec<Target>) -> BuildGraph {
        let mut graph = BuildGraph::new("demo");
        for target in targets {
            graph.targets.insert(target.name.clone(), target);
        }
        graph
    }

    fn flags_for(graph: &BuildGraph, toolchain: &ToolchainConfig, name: &str) -> TargetFlags {
        let target = graph.targets.get(name).expect("target");
        project(graph, toolchain, target, &BuildVariant::default()).expect("flags")
    }

    #[rstest]
    fn include_arguments_move_to_header_dirs(toolchain: ToolchainConfig) {
        let mut app = c_target("app", TargetKind::Executable);
        app.extra_args
            .insert(Language::C, vec!["-Ifoo".into(), "-Wall".into(), "-Ibar".into()]);
        let graph = graph_with(vec![app]);
        let flags = flags_for(&graph, &toolchain, "app");
        assert_eq!(flags.language_flags.get(&Language::C), Some(&vec!["-Wall".to_owned()]));
        assert_eq!(flags.header_dirs, ["/build", "foo", "bar"]);
    }

    #[rstest]
    fn layers_apply_in_precedence_order(mut toolchain: ToolchainConfig) {
        toolchain.base_args.insert(Language::C, vec!["-base".into()]);
        toolchain.option_args.insert(Language::C, vec!["-opt".into()]);
        toolchain.external_args.insert(Language::C, vec!["-env".into()]);
        let mut app = c_target("app", TargetKind::Executable);
        app.subproject = "sub".into();
        app.extra_args.insert(Language::C, vec!["-own".into()]);
        let mut graph = graph_with(vec![app]);
        graph.global_args.insert(Language::C, vec!["-global".into()]);
        graph
            .project_args
            .insert("sub".into(), IndexMap::from([(Language::C, vec!["-sub".to_owned()])]));

        let flags = flags_for(&graph, &toolchain, "app");
        assert_eq!(
            flags.language_flags.get(&Language::C).expect("c flags"),
            &["-base", "-opt", "-global", "-sub", "-env", "-own"]
        );

        let mut cross = graph.clone();
        if let Some(app) = cross.targets.get_mut("app") {
            app.is_cross = true;
        }
        let flags = flags_for(&cross, &toolchain, "app");
        assert!(
            !flags
                .language_flags
                .get(&Language::C)
                .expect("c flags")
                .contains(&"-env".to_owned())
        );
    }

    #[rstest]
    fn include_specs_are_searched_last_declared_first(toolchain: ToolchainConfig) {
        let mut app = c_target("app", TargetKind::Executable);
        app.include_dirs = vec![
            IncludeDirs {
                curdir: "a".into(),
                dirs: vec!["inc".into()],
                build_dirs: Vec::new(),
            },
            IncludeDirs {
                curdir: "b".into(),
                dirs: vec!["inc".into()],
                build_dirs: vec!["gen".into()],
            },
        ];
        let graph = graph_with(vec![app]);
        let flags = flags_for(&graph, &toolchain, "app");
        assert_eq!(
            flags.header_dirs,
            ["/build", "/src/b/inc", "/build/b/gen", "/src/a/inc"]
        );
    }

    #[rstest]
    fn dependency_arguments_reach_every_language(toolchain: ToolchainConfig) {
        let mut app = c_target("app", TargetKind::Executable);
        app.compilers.insert(Language::ObjC, Compiler::new("clang"));
        app.extra_args.insert(Language::C, vec!["-Iown".into()]);
        app.external_deps = vec![
            ExternalDependency {
                name: "zlib".into(),
                compile_args: vec!["-I/opt/zlib".into(), "-DZ".into()],
            },
            ExternalDependency {
                name: "png".into(),
                compile_args: vec!["-I/opt/png".into(), "-DZ".into()],
            },
        ];
        let graph = graph_with(vec![app]);
        let flags = flags_for(&graph, &toolchain, "app");
        assert_eq!(flags.header_dirs, ["/build", "/opt/png", "/opt/zlib", "own"]);
        for language in [Language::C, Language::ObjC] {
            assert_eq!(
                flags.language_flags.get(&language).expect("flags"),
                &["-DZ"]
            );
        }
    }

    #[rstest]
    fn shared_library_links_and_installs(toolchain: ToolchainConfig) {
        let mut util = c_target(
            "util",
            TargetKind::SharedLibrary {
                soversion: Some("2".into()),
            },
        );
        util.subdir = "lib".into();
        let mut app = c_target("app", TargetKind::Executable);
        app.link_targets = vec!["util".into()];
        app.link_args = vec!["-lm".into()];
        let graph = graph_with(vec![util, app]);

        let lib = flags_for(&graph, &toolchain, "util");
        assert_eq!(lib.link_args, DYLIB_LINK_ARGS);
        assert_eq!(lib.install_path.as_deref().map(Utf8Path::as_str), Some("/build/lib/debug"));
        assert_eq!(lib.product_name, "util.2");
        assert_eq!(lib.dylib_version.as_deref(), Some("2"));

        let exe = flags_for(&graph, &toolchain, "app");
        assert_eq!(
            exe.link_args,
            [
                "-Wl,-search_paths_first",
                "-Wl,-headerpad_max_install_names",
                "'/build/lib/debug/libutil.2.dylib'",
                "-lm",
            ]
        );
        assert_eq!(exe.install_path, None);
        assert_eq!(exe.product_name, "app");
    }

    #[rstest]
    fn static_links_skip_search_flags(toolchain: ToolchainConfig) {
        let ar = c_target("ar", TargetKind::StaticLibrary);
        let mut app = c_target("app", TargetKind::Executable);
        app.link_targets = vec!["ar".into()];
        let graph = graph_with(vec![ar, app]);
        assert_eq!(
            flags_for(&graph, &toolchain, "app").link_args,
            ["'/build/debug/libar.a'"]
        );
    }

    #[rstest]
    fn custom_targets_only_get_directories(toolchain: ToolchainConfig) {
        let mut generator = Target::new(
            "gen",
            TargetKind::Custom {
                command: vec!["gen.py".into()],
                outputs: vec!["out.h".into()],
                depends: Vec::new(),
            },
        );
        generator.subdir = "tools".into();
        generator.link_args = vec!["-ignored".into()];
        let graph = graph_with(vec![generator]);
        let flags = flags_for(&graph, &toolchain, "gen");
        assert_eq!(flags.header_dirs, ["/build", "/src/tools/debug"]);
        assert!(flags.language_flags.is_empty());
        assert!(flags.link_args.is_empty());
    }

    #[rstest]
    fn objects_without_any_compiler_are_fatal(toolchain: ToolchainConfig) {
        let bare = ToolchainConfig::new("/src", "/build");
        let mut app = Target::new("app", TargetKind::Executable);
        app.objects = vec!["prebuilt.o".into()];
        let graph = graph_with(vec![app]);
        let target = graph.targets.get("app").expect("target");
        let err = project(&graph, &bare, target, &BuildVariant::default()).expect_err("no compiler");
        assert!(matches!(err, GenerateError::MissingCompiler { ref target } if target == "app"));

        // The toolchain's compiler stands in for the target's.
        assert!(project(&graph, &toolchain, target, &BuildVariant::default()).is_ok());
    }

    #[rstest]
    fn unknown_link_target_is_fatal(toolchain: ToolchainConfig) {
        let mut app = c_target("app", TargetKind::Executable);
        app.link_targets = vec!["ghost".into()];
        let graph = graph_with(vec![app]);
        let target = graph.targets.get("app").expect("target");
        let err = project(&graph, &toolchain, target, &BuildVariant::default())
            .expect_err("unknown link");
        assert!(matches!(err, GenerateError::UnknownLinkTarget { ref link, .. } if link == "ghost"));
    }

    #[rstest]
    #[case(r"plain", r#""plain""#)]
    #[case(r#"say "hi""#, r#""say \"hi\"""#)]
    #[case(r"C:\dir", r#""C:\\dir""#)]
    fn quoted_escapes_backslashes_and_quotes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(quoted(raw), expected);
    }

    #[rstest]
    #[case("/work/build", "/work/src", "../src")]
    #[case("/work/src/build", "/work/src", "..")]
    #[case("/work", "/work/src", "src")]
    #[case("/work", "/work", ".")]
    #[case("/a/b/c", "/x/y", "../../../x/y")]
    fn relative_paths_are_lexical(#[case] from: &str, #[case] to: &str, #[case] expected: &str) {
        assert_eq!(
            relative_path(Utf8Path::new(from), Utf8Path::new(to)).as_str(),
            expected
        );
    }
}
