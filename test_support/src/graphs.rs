//! Sample build graphs.

use camino::Utf8Path;
use pbxgen::graph::{
    BuildGraph, Compiler, ExternalDependency, IncludeDirs, Language, SourceEntry, Target,
    TargetKind, TestDefinition,
};
use pbxgen::toolchain::ToolchainConfig;

/// Source root used by [`toolchain`].
pub const SOURCE_DIR: &str = "/src";
/// Build root used by [`toolchain`].
pub const BUILD_DIR: &str = "/build";
/// Script directory used by [`toolchain`].
pub const SCRIPT_DIR: &str = "/scripts";

/// A toolchain rooted at [`SOURCE_DIR`] and [`BUILD_DIR`] with C and C++
/// compilers.
pub fn toolchain() -> ToolchainConfig {
    toolchain_in(Utf8Path::new(SOURCE_DIR), Utf8Path::new(BUILD_DIR))
}

/// Like [`toolchain`], but rooted at the given directories.
pub fn toolchain_in(source: &Utf8Path, build: &Utf8Path) -> ToolchainConfig {
    let mut toolchain = ToolchainConfig::new(source, build);
    toolchain.script_dir = SCRIPT_DIR.into();
    toolchain
        .compilers
        .insert(Language::C, Compiler::new("clang"));
    toolchain
        .compilers
        .insert(Language::Cpp, Compiler::new("clang++"));
    toolchain
}

fn add(graph: &mut BuildGraph, target: Target) {
    graph.targets.insert(target.name.clone(), target);
}

/// Project `demo` with one executable `app` built from `main.c`.
pub fn single_app_graph() -> BuildGraph {
    let mut graph = BuildGraph::new("demo");
    let mut app = Target::new("app", TargetKind::Executable);
    app.sources.push(SourceEntry::Path("main.c".into()));
    app.compilers.insert(Language::C, Compiler::new("clang"));
    add(&mut graph, app);
    graph
}

/// Project `suite` exercising every target kind.
///
/// - `util`: static library with a header and an include directory.
/// - `core`: C++ shared library, version `1`, linking `util`.
/// - `app`: executable linking both libraries, with a prebuilt object and an
///   external dependency.
/// - `gen`: custom command depending on `app`.
///
/// One test, `smoke`, runs the executable.
pub fn multi_target_graph() -> BuildGraph {
    let mut graph = BuildGraph::new("suite");
    graph
        .global_args
        .insert(Language::C, vec!["-Wall".into()]);

    let mut util = Target::new("util", TargetKind::StaticLibrary);
    util.subdir = "util".into();
    util.sources = vec![
        SourceEntry::Path("util.c".into()),
        SourceEntry::Path("util.h".into()),
    ];
    util.compilers.insert(Language::C, Compiler::new("clang"));
    util.include_dirs.push(IncludeDirs {
        curdir: "util".into(),
        dirs: vec!["include".into()],
        build_dirs: Vec::new(),
    });
    add(&mut graph, util);

    let mut core = Target::new(
        "core",
        TargetKind::SharedLibrary {
            soversion: Some("1".into()),
        },
    );
    core.subdir = "core".into();
    core.sources.push(SourceEntry::Path("core.cpp".into()));
    core.link_targets.push("util".into());
    core.compilers.insert(Language::Cpp, Compiler::new("clang++"));
    core.extra_args
        .insert(Language::Cpp, vec!["-DCORE_BUILD".into()]);
    add(&mut graph, core);

    let mut app = Target::new("app", TargetKind::Executable);
    app.subdir = "app".into();
    app.sources.push(SourceEntry::Path("main.c".into()));
    app.objects.push("prebuilt.o".into());
    app.link_targets = vec!["core".into(), "util".into()];
    app.compilers.insert(Language::C, Compiler::new("clang"));
    app.external_deps.push(ExternalDependency {
        name: "zlib".into(),
        compile_args: vec!["-I/opt/zlib/include".into(), "-DHAVE_ZLIB".into()],
    });
    add(&mut graph, app);

    let gen_target = Target::new(
        "gen",
        TargetKind::Custom {
            command: vec![
                "python3".into(),
                "gen.py".into(),
                "--out".into(),
                "gen out.h".into(),
            ],
            outputs: vec!["gen.h".into()],
            depends: vec!["app".into()],
        },
    );
    add(&mut graph, gen_target);

    graph.tests.push(TestDefinition {
        name: "smoke".into(),
        command: vec![format!("{BUILD_DIR}/app/app")],
        args: vec!["--quick".into()],
        ..TestDefinition::default()
    });
    graph
}
