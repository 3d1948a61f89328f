//! Build phases.

use itertools::Itertools;
use shell_quote::{QuoteRefExt, Sh};
use std::io::Write;

use crate::pbxproj::file_types::is_header;
use crate::pbxproj::flags::quoted;
use crate::pbxproj::{GenerateError, PbxWriter};

use super::{EmitResult, Generation, commented, record, section};

/// Mask meaning "run for every build action".
const ALL_BUILD_ACTIONS: u32 = 2_147_483_647;

fn shell_quote(arg: &str) -> String {
    let bytes: Vec<u8> = arg.quoted(Sh);
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Shell command the `RUN_TESTS` phase runs.
fn test_command(g: &Generation<'_>) -> String {
    let build_dir = g.toolchain.build_dir();
    g.toolchain
        .test_runner()
        .iter()
        .map(String::as_str)
        .chain([g.test_data.as_str(), "--wd", build_dir.as_str()])
        .map(shell_quote)
        .join(" ")
}

pub(super) fn shell_script_phase<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    section(w, "PBXShellScriptBuildPhase", |w| {
        record(w, commented(&g.cx.test_phase, "test run command"), |w| {
            w.line("isa = PBXShellScriptBuildPhase;")?;
            w.line(format_args!("buildActionMask = {ALL_BUILD_ACTIONS};"))?;
            w.list("files", Vec::<String>::new())?;
            w.list("inputPaths", Vec::<String>::new())?;
            w.list("outputPaths", Vec::<String>::new())?;
            w.line("runOnlyForDeploymentPostprocessing = 0;")?;
            w.line("shellPath = /bin/sh;")?;
            w.line(format_args!("shellScript = {};", quoted(&test_command(g))))?;
            w.line("showEnvVarsInLog = 0;")?;
            Ok(())
        })
    })
}

pub(super) fn sources_phases<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    section(w, "PBXSourcesBuildPhase", |w| {
        for (name, target) in &g.graph.targets {
            let files = target
                .source_paths()
                .filter(|path| !is_header(path))
                .unique()
                .map(|path| {
                    cx.build_files
                        .get(&(name.clone(), path.clone()))
                        .map(|id| commented(id, g.source_path(&path)))
                })
                .collect::<Result<Vec<_>, GenerateError>>()?;
            record(w, commented(cx.build_phases.get(name.as_str())?, "Sources"), |w| {
                w.line("isa = PBXSourcesBuildPhase;")?;
                w.line(format_args!("buildActionMask = {ALL_BUILD_ACTIONS};"))?;
                w.list("files", &files)?;
                w.line("runOnlyForDeploymentPostprocessing = 0;")?;
                Ok(())
            })?;
        }
        Ok(())
    })
}
