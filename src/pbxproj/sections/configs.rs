//! Build styles, build configurations and configuration lists.

use camino::Utf8Path;
use std::io::{self, Write};

use crate::graph::Target;
use crate::pbxproj::flags::{self, TargetFlags, flag_string, quoted};
use crate::pbxproj::{BuildVariant, GenerateError, ObjectId, PbxWriter, RefMap};

use super::{EmitResult, Generation, commented, dict, record, section, target_isa};

const WARNING_CFLAGS: &str =
    "WARNING_CFLAGS = (\"-Wmost\", \"-Wno-four-char-constants\", \"-Wno-unknown-pragmas\", );";

pub(super) fn build_styles<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    section(w, "PBXBuildStyle", |w| {
        for variant in g.variants {
            record(w, commented(g.cx.build_styles.get(variant)?, variant), |w| {
                w.line("isa = PBXBuildStyle;")?;
                dict(w, "buildSettings", |w| w.line("COPY_PHASE_STRIP = NO;"))?;
                w.line(format_args!("name = {};", quoted(variant.as_str())))?;
                Ok(())
            })?;
        }
        Ok(())
    })
}

/// One `XCBuildConfiguration` record named after `variant`.
fn configuration<W: Write>(
    w: &mut PbxWriter<W>,
    id: &ObjectId,
    variant: &BuildVariant,
    settings: impl FnOnce(&mut PbxWriter<W>) -> io::Result<()>,
) -> EmitResult {
    record(w, commented(id, variant), |w| {
        w.line("isa = XCBuildConfiguration;")?;
        dict(w, "buildSettings", settings)?;
        w.line(format_args!("name = {};", quoted(variant.as_str())))?;
        Ok(())
    })
}

/// Settings shared by the `ALL_BUILD` and `RUN_TESTS` aggregates.
fn aggregate_settings<W: Write>(w: &mut PbxWriter<W>, product: &str, symroot: &str) -> io::Result<()> {
    for line in [
        "COMBINE_HIDPI_IMAGES = YES;",
        "GCC_GENERATE_DEBUGGING_SYMBOLS = NO;",
        "GCC_INLINES_ARE_PRIVATE_EXTERN = NO;",
        "GCC_OPTIMIZATION_LEVEL = 0;",
        "GCC_PREPROCESSOR_DEFINITIONS = (\"\");",
        "GCC_SYMBOLS_PRIVATE_EXTERN = NO;",
        "INSTALL_PATH = \"\";",
        "OTHER_CFLAGS = \"  \";",
        "OTHER_LDFLAGS = \" \";",
        "OTHER_REZFLAGS = \"\";",
    ] {
        w.line(line)?;
    }
    w.line(format_args!("PRODUCT_NAME = {product};"))?;
    w.line("SECTORDER_FLAGS = \"\";")?;
    w.line(format_args!("SYMROOT = {};", quoted(symroot)))?;
    w.line("USE_HEADERMAP = NO;")?;
    w.line(WARNING_CFLAGS)
}

fn target_settings<W: Write>(
    w: &mut PbxWriter<W>,
    g: &Generation<'_>,
    target: &Target,
    flags: &TargetFlags,
) -> io::Result<()> {
    w.line("COMBINE_HIDPI_IMAGES = YES;")?;
    if let Some(version) = &flags.dylib_version {
        w.line(format_args!("DYLIB_CURRENT_VERSION = {};", quoted(version)))?;
    }
    if !target.is_custom() {
        w.line(format_args!("EXECUTABLE_PREFIX = {};", quoted(target.file_prefix())))?;
    }
    let suffix = match target.file_suffix() {
        "" => String::new(),
        ext => format!(".{ext}"),
    };
    w.line(format_args!("EXECUTABLE_SUFFIX = {};", quoted(&suffix)))?;
    w.line("GCC_GENERATE_DEBUGGING_SYMBOLS = YES;")?;
    w.line("GCC_INLINES_ARE_PRIVATE_EXTERN = NO;")?;
    w.line("GCC_OPTIMIZATION_LEVEL = 0;")?;
    w.line("GCC_PREPROCESSOR_DEFINITIONS = (\"\");")?;
    w.line("GCC_SYMBOLS_PRIVATE_EXTERN = NO;")?;
    // Each search path is itself quoted so paths with spaces survive.
    w.list(
        "HEADER_SEARCH_PATHS",
        flags.header_dirs.iter().map(|dir| quoted(&quoted(dir))),
    )?;
    let install_path = flags
        .install_path
        .as_deref()
        .map(Utf8Path::as_str)
        .unwrap_or_default();
    w.line(format_args!("INSTALL_PATH = {};", quoted(install_path)))?;
    w.line("LIBRARY_SEARCH_PATHS = \"\";")?;
    if target.is_shared_library() {
        w.line("LIBRARY_STYLE = DYNAMIC;")?;
    }
    for (language, args) in &flags.language_flags {
        if let Some(infix) = language.setting_infix() {
            w.line(format_args!("OTHER_{infix}FLAGS = \"{}\";", flag_string(args)))?;
        }
    }
    w.line(format_args!("OTHER_LDFLAGS = \"{}\";", flag_string(&flags.link_args)))?;
    w.line("OTHER_REZFLAGS = \"\";")?;
    w.line(format_args!("PRODUCT_NAME = {};", quoted(&flags.product_name)))?;
    w.line("SECTORDER_FLAGS = \"\";")?;
    let symroot = g.toolchain.build_dir().join(&target.subdir);
    w.line(format_args!("SYMROOT = {};", quoted(symroot.as_str())))?;
    w.line("USE_HEADERMAP = NO;")?;
    w.line(WARNING_CFLAGS)
}

pub(super) fn build_configurations<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    let build_dir = g.toolchain.build_dir();
    section(w, "XCBuildConfiguration", |w| {
        for variant in g.variants {
            configuration(w, cx.project_configs.get(variant)?, variant, |w| {
                w.line("ARCHS = \"$(ARCHS_STANDARD_32_64_BIT)\";")?;
                w.line("ONLY_ACTIVE_ARCH = YES;")?;
                w.line("SDKROOT = \"macosx\";")?;
                w.line(format_args!("SYMROOT = {};", quoted(build_dir.join("build").as_str())))
            })?;
        }
        for (aggregate, product) in [(&cx.all_build, "ALL_BUILD"), (&cx.run_tests, "RUN_TESTS")] {
            for variant in g.variants {
                configuration(w, aggregate.configs.get(variant)?, variant, |w| {
                    aggregate_settings(w, product, build_dir.as_str())
                })?;
            }
        }
        for (name, target) in &g.graph.targets {
            for variant in g.variants {
                let flags = flags::project(g.graph, g.toolchain, target, variant)?;
                let id = cx.build_configs.get(&(name.clone(), variant.clone()))?;
                configuration(w, id, variant, |w| target_settings(w, g, target, &flags))?;
            }
        }
        Ok(())
    })
}

fn configuration_list<W: Write>(
    w: &mut PbxWriter<W>,
    g: &Generation<'_>,
    id: &ObjectId,
    owner: &str,
    configs: impl Fn(&BuildVariant) -> Result<ObjectId, GenerateError>,
) -> EmitResult {
    let entries = g
        .variants
        .iter()
        .map(|variant| configs(variant).map(|config| commented(&config, variant)))
        .collect::<Result<Vec<_>, _>>()?;
    let default = g.default_variant()?;
    record(w, commented(id, format_args!("Build configuration list for {owner}")), |w| {
        w.line("isa = XCConfigurationList;")?;
        w.list("buildConfigurations", &entries)?;
        w.line("defaultConfigurationIsVisible = 0;")?;
        w.line(format_args!("defaultConfigurationName = {};", quoted(default.as_str())))?;
        Ok(())
    })
}

fn per_variant(
    map: &RefMap<BuildVariant>,
) -> impl Fn(&BuildVariant) -> Result<ObjectId, GenerateError> + '_ {
    move |variant| map.get(variant).cloned()
}

pub(super) fn configuration_lists<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    section(w, "XCConfigurationList", |w| {
        let project = format!("PBXProject \"{}\"", g.graph.project_name);
        configuration_list(w, g, &cx.project_config_list, &project, per_variant(&cx.project_configs))?;
        for (aggregate, name) in [(&cx.all_build, "ALL_BUILD"), (&cx.run_tests, "RUN_TESTS")] {
            let owner = format!("PBXAggregateTarget \"{name}\"");
            configuration_list(w, g, &aggregate.config_list, &owner, per_variant(&aggregate.configs))?;
        }
        for (name, target) in &g.graph.targets {
            let owner = format!("{} \"{name}\"", target_isa(target));
            configuration_list(w, g, cx.config_lists.get(name.as_str())?, &owner, |variant| {
                cx.build_configs
                    .get(&(name.clone(), variant.clone()))
                    .cloned()
            })?;
        }
        Ok(())
    })
}
