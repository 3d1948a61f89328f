//! The `PBXProject` root record.

use std::io::Write;

use crate::pbxproj::PbxWriter;
use crate::pbxproj::flags::{quoted, relative_path};

use super::{EmitResult, Generation, commented, dict, record, section};

pub(super) fn project<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    let styles = g
        .variants
        .iter()
        .map(|variant| cx.build_styles.get(variant).map(|id| commented(id, variant)))
        .collect::<Result<Vec<_>, _>>()?;
    let mut targets = vec![
        commented(&cx.all_build.target, "ALL_BUILD"),
        commented(&cx.run_tests.target, "RUN_TESTS"),
    ];
    for name in g.graph.targets.keys() {
        targets.push(commented(cx.native_targets.get(name.as_str())?, name));
    }
    let project_dir = relative_path(g.toolchain.build_dir(), g.toolchain.source_dir());

    section(w, "PBXProject", |w| {
        record(w, commented(&cx.project, "Project object"), |w| {
            w.line("isa = PBXProject;")?;
            dict(w, "attributes", |w| w.line("BuildIndependentTargetsInParallel = YES;"))?;
            w.line(format_args!(
                "buildConfigurationList = {};",
                commented(
                    &cx.project_config_list,
                    format_args!(
                        "Build configuration list for PBXProject \"{}\"",
                        g.graph.project_name
                    )
                )
            ))?;
            dict(w, "buildSettings", |_| Ok(()))?;
            w.list("buildStyles", &styles)?;
            w.line("compatibilityVersion = \"Xcode 3.2\";")?;
            w.line("hasScannedForEncodings = 0;")?;
            w.line(format_args!("mainGroup = {};", cx.main_group))?;
            w.line(format_args!("projectDirPath = {};", quoted(project_dir.as_str())))?;
            w.line("projectRoot = \"\";")?;
            w.list("targets", &targets)?;
            Ok(())
        })
    })
}
