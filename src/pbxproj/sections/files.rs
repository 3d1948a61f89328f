//! File records and the navigation tree.

use camino::Utf8Path;
use itertools::Itertools;
use std::io::Write;

use crate::graph::{Target, TargetKind};
use crate::pbxproj::file_types::{self, EXECUTABLE_FILE_TYPE};
use crate::pbxproj::flags::quoted;
use crate::pbxproj::{GenerateError, PbxWriter};

use super::{EmitResult, Generation, commented, record, section};

pub(super) fn build_files<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    section(w, "PBXBuildFile", |w| {
        for ((_, path), id) in cx.build_files.iter() {
            let full = g.source_path(path);
            let file_ref = cx.file_refs.get(path)?;
            w.line(format_args!(
                "{} = {{ isa = PBXBuildFile; fileRef = {}; }};",
                commented(id, &full),
                commented(file_ref, &full)
            ))?;
        }
        Ok(())
    })
}

/// Type tag of the artefact `target` produces.
fn product_file_type(target: &Target) -> &'static str {
    match target.kind {
        TargetKind::Executable => EXECUTABLE_FILE_TYPE,
        TargetKind::SharedLibrary { .. } => {
            file_types::file_type(Utf8Path::new("product.dylib"))
        }
        TargetKind::StaticLibrary | TargetKind::Custom { .. } => {
            file_types::file_type(Utf8Path::new(&target.filename()))
        }
    }
}

pub(super) fn file_references<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    section(w, "PBXFileReference", |w| {
        for (path, id) in cx.file_refs.iter() {
            let name = path.file_name().unwrap_or_else(|| path.as_str());
            w.line(format_args!(
                "{} = {{ isa = PBXFileReference; explicitFileType = {}; fileEncoding = 4; \
                 name = {}; path = {}; sourceTree = SOURCE_ROOT; }};",
                commented(id, g.source_path(path)),
                quoted(file_types::file_type(path)),
                quoted(name),
                quoted(path.as_str())
            ))?;
        }
        for (name, target) in &g.graph.targets {
            w.line(format_args!(
                "{} = {{ isa = PBXFileReference; explicitFileType = {}; path = {}; \
                 refType = 0; sourceTree = BUILT_PRODUCTS_DIR; }};",
                commented(cx.product_refs.get(name.as_str())?, name),
                quoted(product_file_type(target)),
                quoted(&target.filename())
            ))?;
        }
        Ok(())
    })
}

pub(super) fn groups<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    let cx = g.cx;
    section(w, "PBXGroup", |w| {
        let top = [
            commented(&cx.sources_group, "Sources"),
            commented(&cx.resources_group, "Resources"),
            commented(&cx.products_group, "Products"),
        ];
        record(w, &cx.main_group, |w| {
            w.line("isa = PBXGroup;")?;
            w.list("children", &top)?;
            w.line("sourceTree = \"<group>\";")?;
            Ok(())
        })?;

        let target_groups = g
            .graph
            .targets
            .keys()
            .map(|name| cx.target_groups.get(name.as_str()).map(|id| commented(id, name)))
            .collect::<Result<Vec<_>, GenerateError>>()?;
        group(w, commented(&cx.sources_group, "Sources"), "Sources", &target_groups)?;
        group(w, commented(&cx.resources_group, "Resources"), "Resources", &[])?;

        for (name, target) in &g.graph.targets {
            let key = name.as_str();
            let source_group = cx.source_groups.get(key)?;
            group(
                w,
                commented(cx.target_groups.get(key)?, name),
                &quoted(target.basename()),
                &[commented(source_group, "Source files")],
            )?;
            let files = target
                .source_paths()
                .chain(target.object_paths())
                .unique()
                .map(|path| cx.file_refs.get(&path).map(|id| commented(id, &path)))
                .collect::<Result<Vec<_>, GenerateError>>()?;
            group(w, commented(source_group, "Source files"), "\"Source files\"", &files)?;
        }

        let products = g
            .graph
            .targets
            .keys()
            .map(|name| cx.product_refs.get(name.as_str()).map(|id| commented(id, name)))
            .collect::<Result<Vec<_>, GenerateError>>()?;
        group(w, commented(&cx.products_group, "Products"), "Products", &products)
    })
}

fn group<W: Write>(w: &mut PbxWriter<W>, head: String, name: &str, children: &[String]) -> EmitResult {
    record(w, head, |w| {
        w.line("isa = PBXGroup;")?;
        w.list("children", children)?;
        w.line(format_args!("name = {name};"))?;
        w.line("sourceTree = \"<group>\";")?;
        Ok(())
    })
}
