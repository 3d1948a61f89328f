//! Target records: aggregates, native and legacy targets, dependencies.

use std::io::Write;

use crate::graph::{Target, TargetKind};
use shell_quote::{QuoteRefExt, Sh};

use super::{EmitResult, Generation, commented, record, section, target_isa};
use crate::pbxproj::flags::quoted;
use crate::pbxproj::{GenerateError, ObjectId, PbxWriter};

const ALL_BUILD: &str = "ALL_BUILD";
const RUN_TESTS: &str = "RUN_TESTS";

/// Product type tag of a natively built target; custom targets have none.
const fn product_type(kind: &TargetKind) -> Option<&'static str> {
    match kind {
        TargetKind::Executable => Some("com.apple.product-type.tool"),
        TargetKind::StaticLibrary => Some("com.apple.product-type.library.static"),
        TargetKind::SharedLibrary { .. } => Some("com.apple.product-type.library.dynamic"),
        TargetKind::Custom { .. } => None,
    }
}

pub(super) fn aggregate_targets<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    section(w, "PBXAggregateTarget", |w| {
        let deps = g
            .graph
            .targets
            .keys()
            .map(|name| cx.target_deps.get(name.as_str()).map(|id| commented(id, "PBXTargetDependency")))
            .collect::<Result<Vec<_>, _>>()?;
        aggregate(w, &cx.all_build.target, &cx.all_build.config_list, ALL_BUILD, &[], &deps)?;
        let phases = [commented(&cx.test_phase, "test run command")];
        aggregate(w, &cx.run_tests.target, &cx.run_tests.config_list, RUN_TESTS, &phases, &[])
    })
}

fn aggregate<W: Write>(
    w: &mut PbxWriter<W>,
    id: &ObjectId,
    config_list: &ObjectId,
    name: &str,
    phases: &[String],
    deps: &[String],
) -> EmitResult {
    record(w, commented(id, name), |w| {
        w.line("isa = PBXAggregateTarget;")?;
        w.line(format_args!(
            "buildConfigurationList = {};",
            commented(
                config_list,
                format_args!("Build configuration list for PBXAggregateTarget \"{name}\"")
            )
        ))?;
        w.list("buildPhases", phases)?;
        w.list("dependencies", deps)?;
        w.line(format_args!("name = {name};"))?;
        w.line(format_args!("productName = {name};"))?;
        Ok(())
    })
}

pub(super) fn native_targets<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    section(w, "PBXNativeTarget", |w| {
        for (name, target) in &g.graph.targets {
            let isa = target_isa(target);
            let deps = target
                .dependency_names()
                .iter()
                .map(|dep| {
                    cx.target_deps
                        .get(dep.as_str())
                        .map(|id| commented(id, "PBXTargetDependency"))
                        .map_err(|_| GenerateError::UnknownLinkTarget {
                            target: name.clone(),
                            link: dep.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let phases = [commented(cx.build_phases.get(name.as_str())?, "Sources")];
            let config_list = cx.config_lists.get(name.as_str())?;
            let product = cx.product_refs.get(name.as_str())?;

            record(w, commented(cx.native_targets.get(name.as_str())?, name), |w| {
                w.line(format_args!("isa = {isa};"))?;
                legacy_command(w, g, target)?;
                w.line(format_args!(
                    "buildConfigurationList = {};",
                    commented(
                        config_list,
                        format_args!("Build configuration list for {isa} \"{name}\"")
                    )
                ))?;
                w.list("buildPhases", &phases)?;
                w.list("buildRules", Vec::<String>::new())?;
                w.list("dependencies", &deps)?;
                w.line(format_args!("name = {};", quoted(target.basename())))?;
                w.line(format_args!("productName = {};", quoted(name)))?;
                w.line(format_args!("productReference = {};", commented(product, name)))?;
                if let Some(product_type) = product_type(&target.kind) {
                    w.line(format_args!("productType = {};", quoted(product_type)))?;
                }
                Ok(())
            })?;
        }
        Ok(())
    })
}

/// Fields through which a legacy target runs its command.
fn legacy_command<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>, target: &Target) -> EmitResult {
    let TargetKind::Custom { command, .. } = &target.kind else {
        return Ok(());
    };
    let Some((tool, args)) = command.split_first() else {
        return Ok(());
    };
    let args = args
        .iter()
        .map(|arg| {
            let bytes: Vec<u8> = arg.as_str().quoted(Sh);
            String::from_utf8_lossy(&bytes).into_owned()
        })
        .collect::<Vec<_>>()
        .join(" ");
    w.line(format_args!("buildArgumentsString = {};", quoted(&args)))?;
    w.line(format_args!("buildToolPath = {};", quoted(tool)))?;
    w.line(format_args!(
        "buildWorkingDirectory = {};",
        quoted(g.toolchain.build_dir().as_str())
    ))?;
    w.line("passBuildSettingsInEnvironment = 1;")?;
    Ok(())
}

pub(super) fn target_dependencies<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    section(w, "PBXTargetDependency", |w| {
        for name in g.graph.targets.keys() {
            let key = name.as_str();
            record(w, commented(cx.target_deps.get(key)?, "PBXTargetDependency"), |w| {
                w.line("isa = PBXTargetDependency;")?;
                w.line(format_args!("target = {};", commented(cx.native_targets.get(key)?, name)))?;
                w.line(format_args!(
                    "targetProxy = {};",
                    commented(cx.container_proxies.get(key)?, "PBXContainerItemProxy")
                ))?;
                Ok(())
            })?;
        }
        Ok(())
    })
}

pub(super) fn container_proxies<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    section(w, "PBXContainerItemProxy", |w| {
        for name in g.graph.targets.keys() {
            let key = name.as_str();
            record(w, commented(cx.container_proxies.get(key)?, "PBXContainerItemProxy"), |w| {
                w.line("isa = PBXContainerItemProxy;")?;
                w.line(format_args!(
                    "containerPortal = {};",
                    commented(&cx.project, "Project object")
                ))?;
                w.line("proxyType = 1;")?;
                w.line(format_args!("remoteGlobalIDString = {};", cx.native_targets.get(key)?))?;
                w.line(format_args!("remoteInfo = {};", quoted(name)))?;
                Ok(())
            })?;
        }
        Ok(())
    })
}
