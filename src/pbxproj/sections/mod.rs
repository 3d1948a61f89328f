//! Section emitters.
//!
//! Each emitter writes one `/* Begin <isa> section */` block of records.
//! Emitters only read the [`Generation`] view; every identifier they print
//! comes from the shared [`GenerationContext`].

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt::Display;
use std::io::{self, Write};

use crate::graph::{BuildGraph, Target};
use crate::toolchain::Toolchain;

use super::{BuildVariant, GenerateError, GenerationContext, ObjectId, PbxWriter};

mod configs;
mod files;
mod phases;
mod project;
mod targets;

type EmitResult = Result<(), GenerateError>;

/// Everything an emitter may read during one pass.
pub(super) struct Generation<'a> {
    pub graph: &'a BuildGraph,
    pub toolchain: &'a dyn Toolchain,
    pub variants: &'a [BuildVariant],
    pub cx: &'a GenerationContext,
    pub test_data: &'a Utf8Path,
}

impl Generation<'_> {
    fn default_variant(&self) -> Result<&BuildVariant, GenerateError> {
        self.variants.first().ok_or(GenerateError::NoVariants)
    }

    fn source_path(&self, rel: &Utf8Path) -> Utf8PathBuf {
        self.toolchain.source_dir().join(rel)
    }
}

/// Write the whole project document.
pub(super) fn emit_all<W: Write>(w: &mut PbxWriter<W>, g: &Generation<'_>) -> EmitResult {
    w.line("// !$*UTF8*$!")?;
    w.block("{", "}", |w| {
        w.line("archiveVersion = 1;")?;
        dict(w, "classes", |_| Ok(()))?;
        w.line("objectVersion = 46;")?;
        w.block("objects = {", "};", |w| {
            targets::aggregate_targets(w, g)?;
            files::build_files(w, g)?;
            configs::build_styles(w, g)?;
            targets::container_proxies(w, g)?;
            files::file_references(w, g)?;
            files::groups(w, g)?;
            targets::native_targets(w, g)?;
            project::project(w, g)?;
            phases::shell_script_phase(w, g)?;
            phases::sources_phases(w, g)?;
            targets::target_dependencies(w, g)?;
            configs::build_configurations(w, g)?;
            configs::configuration_lists(w, g)
        })?;
        w.line(format_args!("rootObject = {};", commented(&g.cx.project, "Project object")))?;
        Ok(())
    })
}

/// Write a delimited section of records of type `isa`.
fn section<W: Write>(
    w: &mut PbxWriter<W>,
    isa: &str,
    body: impl FnOnce(&mut PbxWriter<W>) -> EmitResult,
) -> EmitResult {
    w.raw(&format!("\n/* Begin {isa} section */\n"))?;
    body(w)?;
    w.raw(&format!("/* End {isa} section */\n"))?;
    Ok(())
}

/// Write one `<head> = { ... };` record.
fn record<W: Write>(
    w: &mut PbxWriter<W>,
    head: impl Display,
    body: impl FnOnce(&mut PbxWriter<W>) -> EmitResult,
) -> EmitResult {
    w.block(format_args!("{head} = {{"), "};", body)
}

/// Write a nested `<key> = { ... };` dictionary.
fn dict<W: Write>(
    w: &mut PbxWriter<W>,
    key: &str,
    body: impl FnOnce(&mut PbxWriter<W>) -> io::Result<()>,
) -> io::Result<()> {
    w.block(format_args!("{key} = {{"), "};", body)
}

/// Record type of the target's main record.
const fn target_isa(target: &Target) -> &'static str {
    if target.is_custom() {
        "PBXLegacyTarget"
    } else {
        "PBXNativeTarget"
    }
}

/// `id /* comment */`, the form every reference is written in.
///
/// A `*/` inside the comment would close it early, so it is written as `* /`.
fn commented(id: &ObjectId, comment: impl Display) -> String {
    let comment = comment.to_string().replace("*/", "* /");
    format!("{id} /* {comment} */")
}
