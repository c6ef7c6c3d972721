//! CROSSTOOL record types.
//!
//! Mirrors the `crosstool_config.proto` messages the generator writes. Scalar
//! fields are `Option`s because field presence is part of the encoding: a
//! field set to `""` is written out, an unset one is not.

use std::io;

use crate::text_format::{ParseError, Parser, TextEnum, TextMessage, TextWriter};

/// Compilation mode selected by a `compilation_mode_flags` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilationMode {
    Fastbuild,
    Dbg,
    Coverage,
    Opt,
}

impl TextEnum for CompilationMode {
    const TYPE_NAME: &'static str = "CompilationMode";

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "FASTBUILD" => Some(Self::Fastbuild),
            "DBG" => Some(Self::Dbg),
            "COVERAGE" => Some(Self::Coverage),
            "OPT" => Some(Self::Opt),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Fastbuild => "FASTBUILD",
            Self::Dbg => "DBG",
            Self::Coverage => "COVERAGE",
            Self::Opt => "OPT",
        }
    }
}

/// Linking mode selected by a `linking_mode_flags` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkingMode {
    FullyStatic,
    MostlyStatic,
    Dynamic,
    MostlyStaticLibraries,
}

impl TextEnum for LinkingMode {
    const TYPE_NAME: &'static str = "LinkingMode";

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "FULLY_STATIC" => Some(Self::FullyStatic),
            "MOSTLY_STATIC" => Some(Self::MostlyStatic),
            "DYNAMIC" => Some(Self::Dynamic),
            "MOSTLY_STATIC_LIBRARIES" => Some(Self::MostlyStaticLibraries),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::FullyStatic => "FULLY_STATIC",
            Self::MostlyStatic => "MOSTLY_STATIC",
            Self::Dynamic => "DYNAMIC",
            Self::MostlyStaticLibraries => "MOSTLY_STATIC_LIBRARIES",
        }
    }
}

/// A named tool and where to find it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPath {
    pub name: Option<String>,
    pub path: Option<String>,
}

impl ToolPath {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            path: Some(path.into()),
        }
    }
}

impl TextMessage for ToolPath {
    const FULL_NAME: &'static str =
        "com.google.devtools.build.lib.view.config.crosstool.ToolPath";

    fn merge_field(&mut self, name: &str, p: &mut Parser<'_>) -> Result<(), ParseError> {
        match name {
            "name" => p.optional_string(&mut self.name),
            "path" => p.optional_string(&mut self.path),
            _ => Err(p.unknown_field::<Self>()),
        }
    }

    fn write_fields(&self, w: &mut TextWriter<'_>) -> io::Result<()> {
        w.optional_string("name", &self.name)?;
        w.optional_string("path", &self.path)
    }
}

/// Extra flags applied in one compilation mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationModeFlags {
    pub mode: Option<CompilationMode>,
    pub compiler_flag: Vec<String>,
    pub cxx_flag: Vec<String>,
    pub linker_flag: Vec<String>,
}

impl TextMessage for CompilationModeFlags {
    const FULL_NAME: &'static str =
        "com.google.devtools.build.lib.view.config.crosstool.CompilationModeFlags";

    fn merge_field(&mut self, name: &str, p: &mut Parser<'_>) -> Result<(), ParseError> {
        match name {
            "mode" => p.optional_enum(&mut self.mode),
            "compiler_flag" => p.repeated_string(&mut self.compiler_flag),
            "cxx_flag" => p.repeated_string(&mut self.cxx_flag),
            "linker_flag" => p.repeated_string(&mut self.linker_flag),
            _ => Err(p.unknown_field::<Self>()),
        }
    }

    fn write_fields(&self, w: &mut TextWriter<'_>) -> io::Result<()> {
        w.optional_enum("mode", self.mode)?;
        w.strings("compiler_flag", &self.compiler_flag)?;
        w.strings("cxx_flag", &self.cxx_flag)?;
        w.strings("linker_flag", &self.linker_flag)
    }
}

/// Extra flags applied in one linking mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkingModeFlags {
    pub mode: Option<LinkingMode>,
    pub linker_flag: Vec<String>,
}

impl TextMessage for LinkingModeFlags {
    const FULL_NAME: &'static str =
        "com.google.devtools.build.lib.view.config.crosstool.LinkingModeFlags";

    fn merge_field(&mut self, name: &str, p: &mut Parser<'_>) -> Result<(), ParseError> {
        match name {
            "mode" => p.optional_enum(&mut self.mode),
            "linker_flag" => p.repeated_string(&mut self.linker_flag),
            _ => Err(p.unknown_field::<Self>()),
        }
    }

    fn write_fields(&self, w: &mut TextWriter<'_>) -> io::Result<()> {
        w.optional_enum("mode", self.mode)?;
        w.strings("linker_flag", &self.linker_flag)
    }
}

/// One compiler configuration for a target platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CToolchain {
    pub toolchain_identifier: Option<String>,
    pub host_system_name: Option<String>,
    pub target_system_name: Option<String>,
    pub target_cpu: Option<String>,
    pub target_libc: Option<String>,
    pub compiler: Option<String>,
    pub abi_version: Option<String>,
    pub abi_libc_version: Option<String>,
    pub tool_path: Vec<ToolPath>,
    pub compiler_flag: Vec<String>,
    pub cxx_flag: Vec<String>,
    pub unfiltered_cxx_flag: Vec<String>,
    pub linker_flag: Vec<String>,
    pub dynamic_library_linker_flag: Vec<String>,
    pub test_only_linker_flag: Vec<String>,
    pub objcopy_embed_flag: Vec<String>,
    pub ld_embed_flag: Vec<String>,
    pub ar_flag: Vec<String>,
    pub compilation_mode_flags: Vec<CompilationModeFlags>,
    pub linking_mode_flags: Vec<LinkingModeFlags>,
    pub cxx_builtin_include_directory: Vec<String>,
    pub builtin_sysroot: Option<String>,
    pub supports_gold_linker: Option<bool>,
    pub supports_thin_archives: Option<bool>,
    pub supports_start_end_lib: Option<bool>,
    pub supports_interface_shared_objects: Option<bool>,
    pub supports_embedded_runtimes: Option<bool>,
    pub supports_incremental_linker: Option<bool>,
    pub supports_fission: Option<bool>,
    pub supports_normalizing_ar: Option<bool>,
    pub supports_dsym: Option<bool>,
    pub needs_pic: Option<bool>,
}

impl CToolchain {
    /// Tool path registered under `name`, first match wins.
    pub fn tool(&self, name: &str) -> Option<&str> {
        self.tool_path
            .iter()
            .find(|t| t.name.as_deref() == Some(name))
            .and_then(|t| t.path.as_deref())
    }
}

impl TextMessage for CToolchain {
    const FULL_NAME: &'static str =
        "com.google.devtools.build.lib.view.config.crosstool.CToolchain";

    fn merge_field(&mut self, name: &str, p: &mut Parser<'_>) -> Result<(), ParseError> {
        match name {
            "toolchain_identifier" => p.optional_string(&mut self.toolchain_identifier),
            "host_system_name" => p.optional_string(&mut self.host_system_name),
            "target_system_name" => p.optional_string(&mut self.target_system_name),
            "target_cpu" => p.optional_string(&mut self.target_cpu),
            "target_libc" => p.optional_string(&mut self.target_libc),
            "compiler" => p.optional_string(&mut self.compiler),
            "abi_version" => p.optional_string(&mut self.abi_version),
            "abi_libc_version" => p.optional_string(&mut self.abi_libc_version),
            "tool_path" => p.repeated_message(&mut self.tool_path),
            "compiler_flag" => p.repeated_string(&mut self.compiler_flag),
            "cxx_flag" => p.repeated_string(&mut self.cxx_flag),
            "unfiltered_cxx_flag" => p.repeated_string(&mut self.unfiltered_cxx_flag),
            "linker_flag" => p.repeated_string(&mut self.linker_flag),
            "dynamic_library_linker_flag" => p.repeated_string(&mut self.dynamic_library_linker_flag),
            "test_only_linker_flag" => p.repeated_string(&mut self.test_only_linker_flag),
            "objcopy_embed_flag" => p.repeated_string(&mut self.objcopy_embed_flag),
            "ld_embed_flag" => p.repeated_string(&mut self.ld_embed_flag),
            "ar_flag" => p.repeated_string(&mut self.ar_flag),
            "compilation_mode_flags" => p.repeated_message(&mut self.compilation_mode_flags),
            "linking_mode_flags" => p.repeated_message(&mut self.linking_mode_flags),
            "cxx_builtin_include_directory" => p.repeated_string(&mut self.cxx_builtin_include_directory),
            "builtin_sysroot" => p.optional_string(&mut self.builtin_sysroot),
            "supports_gold_linker" => p.optional_bool(&mut self.supports_gold_linker),
            "supports_thin_archives" => p.optional_bool(&mut self.supports_thin_archives),
            "supports_start_end_lib" => p.optional_bool(&mut self.supports_start_end_lib),
            "supports_interface_shared_objects" => {
                p.optional_bool(&mut self.supports_interface_shared_objects)
            }
            "supports_embedded_runtimes" => p.optional_bool(&mut self.supports_embedded_runtimes),
            "supports_incremental_linker" => {
                p.optional_bool(&mut self.supports_incremental_linker)
            }
            "supports_fission" => p.optional_bool(&mut self.supports_fission),
            "supports_normalizing_ar" => p.optional_bool(&mut self.supports_normalizing_ar),
            "supports_dsym" => p.optional_bool(&mut self.supports_dsym),
            "needsPic" => p.optional_bool(&mut self.needs_pic),
            _ => Err(p.unknown_field::<Self>()),
        }
    }

    fn write_fields(&self, w: &mut TextWriter<'_>) -> io::Result<()> {
        w.optional_string("toolchain_identifier", &self.toolchain_identifier)?;
        w.optional_string("host_system_name", &self.host_system_name)?;
        w.optional_string("target_system_name", &self.target_system_name)?;
        w.optional_string("target_cpu", &self.target_cpu)?;
        w.optional_string("target_libc", &self.target_libc)?;
        w.optional_string("compiler", &self.compiler)?;
        w.optional_string("abi_version", &self.abi_version)?;
        w.optional_string("abi_libc_version", &self.abi_libc_version)?;
        w.messages("tool_path", &self.tool_path)?;
        w.strings("compiler_flag", &self.compiler_flag)?;
        w.strings("cxx_flag", &self.cxx_flag)?;
        w.strings("unfiltered_cxx_flag", &self.unfiltered_cxx_flag)?;
        w.strings("linker_flag", &self.linker_flag)?;
        w.strings("dynamic_library_linker_flag", &self.dynamic_library_linker_flag)?;
        w.strings("test_only_linker_flag", &self.test_only_linker_flag)?;
        w.strings("objcopy_embed_flag", &self.objcopy_embed_flag)?;
        w.strings("ld_embed_flag", &self.ld_embed_flag)?;
        w.strings("ar_flag", &self.ar_flag)?;
        w.messages("compilation_mode_flags", &self.compilation_mode_flags)?;
        w.messages("linking_mode_flags", &self.linking_mode_flags)?;
        w.strings("cxx_builtin_include_directory", &self.cxx_builtin_include_directory)?;
        w.optional_string("builtin_sysroot", &self.builtin_sysroot)?;
        w.optional_bool("supports_gold_linker", self.supports_gold_linker)?;
        w.optional_bool("supports_thin_archives", self.supports_thin_archives)?;
        w.optional_bool("supports_start_end_lib", self.supports_start_end_lib)?;
        w.optional_bool(
            "supports_interface_shared_objects",
            self.supports_interface_shared_objects,
        )?;
        w.optional_bool("supports_embedded_runtimes", self.supports_embedded_runtimes)?;
        w.optional_bool("supports_incremental_linker", self.supports_incremental_linker)?;
        w.optional_bool("supports_fission", self.supports_fission)?;
        w.optional_bool("supports_normalizing_ar", self.supports_normalizing_ar)?;
        w.optional_bool("supports_dsym", self.supports_dsym)?;
        w.optional_bool("needsPic", self.needs_pic)
    }
}

/// Top-level container for every generated toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrosstoolRelease {
    pub major_version: Option<String>,
    pub minor_version: Option<String>,
    pub default_target_cpu: Option<String>,
    pub toolchain: Vec<CToolchain>,
}

impl TextMessage for CrosstoolRelease {
    const FULL_NAME: &'static str =
        "com.google.devtools.build.lib.view.config.crosstool.CrosstoolRelease";

    fn merge_field(&mut self, name: &str, p: &mut Parser<'_>) -> Result<(), ParseError> {
        match name {
            "major_version" => p.optional_string(&mut self.major_version),
            "minor_version" => p.optional_string(&mut self.minor_version),
            "default_target_cpu" => p.optional_string(&mut self.default_target_cpu),
            "toolchain" => p.repeated_message(&mut self.toolchain),
            _ => Err(p.unknown_field::<Self>()),
        }
    }

    fn write_fields(&self, w: &mut TextWriter<'_>) -> io::Result<()> {
        w.optional_string("major_version", &self.major_version)?;
        w.optional_string("minor_version", &self.minor_version)?;
        w.optional_string("default_target_cpu", &self.default_target_cpu)?;
        w.messages("toolchain", &self.toolchain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_format::{parse, to_string};

    const PACKAGE: &str = "com.google.devtools.build.lib.view.config.crosstool";

    #[test]
    fn full_names_share_package() {
        for name in [
            ToolPath::FULL_NAME,
            CompilationModeFlags::FULL_NAME,
            LinkingModeFlags::FULL_NAME,
            CToolchain::FULL_NAME,
            CrosstoolRelease::FULL_NAME,
        ] {
            assert!(name.starts_with(PACKAGE), "{name}");
        }
    }

    #[test]
    fn enum_names_round_trip() {
        for mode in [
            CompilationMode::Fastbuild,
            CompilationMode::Dbg,
            CompilationMode::Coverage,
            CompilationMode::Opt,
        ] {
            assert_eq!(CompilationMode::from_name(mode.name()), Some(mode));
        }
        for mode in [
            LinkingMode::FullyStatic,
            LinkingMode::MostlyStatic,
            LinkingMode::Dynamic,
            LinkingMode::MostlyStaticLibraries,
        ] {
            assert_eq!(LinkingMode::from_name(mode.name()), Some(mode));
        }
        assert_eq!(LinkingMode::from_name("dynamic"), None);
    }

    #[test]
    fn parses_nested_blocks_in_both_delimiters() {
        let release: CrosstoolRelease = parse(
            r#"
            major_version: "local"
            toolchain {
              toolchain_identifier: "host"
              tool_path < name: "gcc" path: "/usr/bin/gcc" >
              compilation_mode_flags: { mode: OPT compiler_flag: "-O2" }
              linking_mode_flags { mode: DYNAMIC }
              needsPic: true
            }
            "#,
        )
        .unwrap();
        let tc = &release.toolchain[0];
        assert_eq!(release.major_version.as_deref(), Some("local"));
        assert_eq!(tc.tool("gcc"), Some("/usr/bin/gcc"));
        assert_eq!(tc.compilation_mode_flags[0].mode, Some(CompilationMode::Opt));
        assert_eq!(tc.linking_mode_flags[0].mode, Some(LinkingMode::Dynamic));
        assert_eq!(tc.needs_pic, Some(true));
    }

    #[test]
    fn presence_survives_round_trip() {
        let release = CrosstoolRelease {
            major_version: Some("local".into()),
            minor_version: Some(String::new()),
            ..Default::default()
        };
        let text = to_string(&release);
        assert_eq!(text, "major_version: \"local\"\nminor_version: \"\"\n");
        assert_eq!(parse::<CrosstoolRelease>(&text).unwrap(), release);
    }

    #[test]
    fn unknown_field_names_message_type() {
        let err = parse::<CToolchain>("compiler: \"gcc\"\n  bogus: \"x\"").unwrap_err();
        assert_eq!((err.line, err.column), (2, 3));
        assert!(err.message.contains("bogus"));
        assert!(err.message.contains("CToolchain"));
    }

    #[test]
    fn repeated_scalar_is_rejected() {
        let err = parse::<CToolchain>("compiler: \"gcc\" compiler: \"clang\"").unwrap_err();
        assert!(err.message.contains("multiple times"));
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        let err = parse::<LinkingModeFlags>("mode: SOMETIMES").unwrap_err();
        assert!(err.message.contains("LinkingMode"));
    }

    #[test]
    fn unterminated_block_is_rejected() {
        let err = parse::<CrosstoolRelease>("toolchain { compiler: \"gcc\"").unwrap_err();
        assert!(err.message.contains("end of input"));
    }

    #[test]
    fn mismatched_delimiter_is_rejected() {
        assert!(parse::<CrosstoolRelease>("toolchain { compiler: \"gcc\" >").is_err());
    }

    #[test]
    fn tool_lookup_returns_first_match() {
        let tc = CToolchain {
            tool_path: vec![ToolPath::new("ld", "/a/ld"), ToolPath::new("ld", "/b/ld")],
            ..Default::default()
        };
        assert_eq!(tc.tool("ld"), Some("/a/ld"));
        assert_eq!(tc.tool("nm"), None);
    }
}
