//! File extension to Xcode file type mapping.

use camino::Utf8Path;
use tracing::warn;

/// Type tag used for files whose extension is not in [`FILE_TYPES`].
pub const GENERIC_FILE_TYPE: &str = "compiled";

/// Type tag of executable products.
pub const EXECUTABLE_FILE_TYPE: &str = "compiled.mach-o.executable";

/// Known extensions and their Xcode `explicitFileType` tags.
pub const FILE_TYPES: &[(&str, &str)] = &[
    ("c", "sourcecode.c.c"),
    ("a", "archive.ar"),
    ("cc", "sourcecode.cpp.cpp"),
    ("cxx", "sourcecode.cpp.cpp"),
    ("cpp", "sourcecode.cpp.cpp"),
    ("c++", "sourcecode.cpp.cpp"),
    ("m", "sourcecode.c.objc"),
    ("mm", "sourcecode.cpp.objcpp"),
    ("h", "sourcecode.c.h"),
    ("hpp", "sourcecode.cpp.h"),
    ("hxx", "sourcecode.cpp.h"),
    ("hh", "sourcecode.cpp.hh"),
    ("inc", "sourcecode.c.h"),
    ("dylib", "compiled.mach-o.dylib"),
    ("o", "compiled.mach-o.objfile"),
    ("S", "sourcecode.asm"),
    ("js", "sourcecode.javascript"),
];

/// Extensions of header files, which never join a sources build phase.
const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "H", "ipp", "inc", "moc", "vapi", "di"];

/// Text after the last `.` of the file name, or the whole name without one.
fn extension(path: &Utf8Path) -> &str {
    let name = path.file_name().unwrap_or_else(|| path.as_str());
    name.rsplit('.').next().unwrap_or(name)
}

/// Look up the type tag for `path` without falling back.
#[must_use]
pub fn known_file_type(path: &Utf8Path) -> Option<&'static str> {
    let ext = extension(path);
    FILE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, tag)| *tag)
}

/// Type tag for `path`, degrading to [`GENERIC_FILE_TYPE`] with a warning.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use pbxgen::pbxproj::file_types::file_type;
///
/// assert_eq!(file_type(Utf8Path::new("src/main.c")), "sourcecode.c.c");
/// assert_eq!(file_type(Utf8Path::new("data.xyz")), "compiled");
/// ```
#[must_use]
pub fn file_type(path: &Utf8Path) -> &'static str {
    known_file_type(path).unwrap_or_else(|| {
        warn!(
            extension = extension(path),
            file = %path,
            "unknown file extension; using generic file type"
        );
        GENERIC_FILE_TYPE
    })
}

/// Whether `path` names a header file.
#[must_use]
pub fn is_header(path: &Utf8Path) -> bool {
    HEADER_EXTENSIONS.contains(&extension(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("main.c", "sourcecode.c.c")]
    #[case("lib/a.cpp", "sourcecode.cpp.cpp")]
    #[case("ui/view.m", "sourcecode.c.objc")]
    #[case("ui/bridge.mm", "sourcecode.cpp.objcpp")]
    #[case("api.h", "sourcecode.c.h")]
    #[case("api.hpp", "sourcecode.cpp.h")]
    #[case("libfoo.dylib", "compiled.mach-o.dylib")]
    #[case("prebuilt/x.o", "compiled.mach-o.objfile")]
    #[case("start.S", "sourcecode.asm")]
    #[case("tool.js", "sourcecode.javascript")]
    #[case("libbar.a", "archive.ar")]
    fn known_extensions_map_to_their_tag(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(file_type(Utf8Path::new(path)), expected);
    }

    #[rstest]
    #[case("data.xyz")]
    #[case("README")]
    #[case("start.s")]
    fn unknown_extensions_fall_back(#[case] path: &str) {
        assert_eq!(known_file_type(Utf8Path::new(path)), None);
        assert_eq!(file_type(Utf8Path::new(path)), GENERIC_FILE_TYPE);
    }

    #[rstest]
    #[case("a.h", true)]
    #[case("b.hpp", true)]
    #[case("c.c", false)]
    #[case("d.mm", false)]
    fn headers_are_recognised(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_header(Utf8Path::new(path)), expected);
    }
}
