//! Toolchain construction from the baseline template.
//!
//! Every toolchain starts as a fresh parse of [`BASE_TOOLCHAIN`] and then has
//! its identity, tool paths and built-in include directories filled in from a
//! [`TargetDescriptor`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CrosstoolError, Result};
use crate::schema::{CToolchain, CrosstoolRelease, ToolPath};
use crate::text_format;

/// Fields shared by every generated toolchain. The identity fields are
/// required by the schema and always overwritten per target.
pub const BASE_TOOLCHAIN: &str = r#"
    # Overwritten per target.
    toolchain_identifier: ""
    target_system_name: ""
    target_cpu: ""
    target_libc: ""
    compiler: ""
    abi_version: ""
    abi_libc_version: ""

    builtin_sysroot: ""
    host_system_name: "host"
    needsPic: true
    supports_gold_linker: false
    supports_incremental_linker: false
    supports_fission: false
    supports_interface_shared_objects: false
    supports_normalizing_ar: false
    supports_start_end_lib: false

    objcopy_embed_flag: "-I"
    objcopy_embed_flag: "binary"

    unfiltered_cxx_flag: "-no-canonical-prefixes"
    unfiltered_cxx_flag: "-fno-canonical-system-headers"

    # Reproducible builds: no timestamps baked into objects.
    unfiltered_cxx_flag: "-Wno-builtin-macro-redefined"
    unfiltered_cxx_flag: "-D__DATE__=\"redacted\""
    unfiltered_cxx_flag: "-D__TIMESTAMP__=\"redacted\""
    unfiltered_cxx_flag: "-D__TIME__=\"redacted\""

    # Hardening. _FORTIFY_SOURCE is undefined first since some distributions
    # predefine it.
    compiler_flag: "-U_FORTIFY_SOURCE"
    compiler_flag: "-D_FORTIFY_SOURCE=1"
    compiler_flag: "-fstack-protector"
    linker_flag: "-Wl,-z,relro,-z,now"

    compiler_flag: "-Wall"
    compiler_flag: "-Wunused-but-set-parameter"
    compiler_flag: "-Wno-free-nonheap-object" # false positives
    compiler_flag: "-fno-omit-frame-pointer"

    linker_flag: "-no-canonical-prefixes"
    linker_flag: "-pass-exit-codes"

    compilation_mode_flags {
      mode: DBG
      compiler_flag: "-g"
    }
    compilation_mode_flags {
      mode: OPT
      compiler_flag: "-g0"
      compiler_flag: "-O2"
      compiler_flag: "-DNDEBUG"
      compiler_flag: "-ffunction-sections"
      compiler_flag: "-fdata-sections"
      linker_flag: "-Wl,--gc-sections"
    }
    linking_mode_flags { mode: DYNAMIC }
"#;

/// Tools registered on every toolchain, in emission order. `ld` is listed
/// twice; downstream consumers have always seen both entries.
pub const TOOL_NAMES: [&str; 11] = [
    "ar", "ld", "cpp", "dwp", "gcc", "gcov", "ld", "nm", "objcopy", "objdump", "strip",
];

/// CPU label the host toolchain always reports.
pub const HOST_CPU: &str = "k8";

/// System name of the host toolchain.
pub const HOST_SYSTEM_NAME: &str = "host";

const COMPILER: &str = "gcc";

const HOST_INCLUDE_DIRS: [&str; 3] = ["/usr/lib/gcc", "/usr/local/include", "/usr/include"];

/// One entry of the target list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    /// CPU architecture (e.g., "arm", "aarch64").
    pub cpu: String,
    /// libc or OS part of the triple (e.g., "linux-gnueabihf").
    pub libc: String,
    /// Whether tools are looked up under the target triple prefix.
    #[serde(default)]
    pub cross: bool,
}

impl TargetDescriptor {
    pub fn new(cpu: impl Into<String>, libc: impl Into<String>, cross: bool) -> Self {
        Self {
            cpu: cpu.into(),
            libc: libc.into(),
            cross,
        }
    }

    /// CPU as written into the toolchain; the host is always [`HOST_CPU`].
    pub fn effective_cpu(&self) -> &str {
        if self.cross {
            &self.cpu
        } else {
            HOST_CPU
        }
    }

    /// `<cpu>-<libc>`, used for `target_libc` and both ABI fields.
    pub fn libc_label(&self) -> String {
        format!("{}-{}", self.effective_cpu(), self.libc)
    }

    /// `cross-<cpu>-<libc>` for cross targets, `host` otherwise.
    pub fn system_name(&self) -> String {
        if self.cross {
            format!("cross-{}-{}", self.cpu, self.libc)
        } else {
            HOST_SYSTEM_NAME.to_string()
        }
    }

    fn tool_path(&self, tool: &str) -> String {
        if self.cross {
            format!("/usr/bin/{}-{tool}", self.libc_label())
        } else {
            format!("/usr/bin/{tool}")
        }
    }

    fn include_dirs(&self) -> Vec<String> {
        if self.cross {
            let libc = self.libc_label();
            vec![
                format!("/usr/{libc}/include"),
                format!("/usr/lib/gcc-cross/{libc}"),
            ]
        } else {
            HOST_INCLUDE_DIRS.iter().map(|d| d.to_string()).collect()
        }
    }
}

/// Major and minor version labels of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseLabels {
    #[serde(default = "default_major_version")]
    pub major_version: String,
    #[serde(default)]
    pub minor_version: String,
}

fn default_major_version() -> String {
    "local".to_string()
}

impl Default for ReleaseLabels {
    fn default() -> Self {
        Self {
            major_version: default_major_version(),
            minor_version: String::new(),
        }
    }
}

/// The five targets generated when no targets file is given: the host
/// followed by the ARM, AArch64, POWER and s390x cross toolchains.
pub fn default_targets() -> Vec<TargetDescriptor> {
    vec![
        TargetDescriptor::new(HOST_CPU, "local", false),
        TargetDescriptor::new("arm", "linux-gnueabihf", true),
        TargetDescriptor::new("aarch64", "linux-gnu", true),
        TargetDescriptor::new("powerpc64le", "linux-gnu", true),
        TargetDescriptor::new("s390x", "linux-gnu", true),
    ]
}

/// Parse a fresh copy of [`BASE_TOOLCHAIN`].
pub fn baseline() -> Result<CToolchain> {
    Ok(text_format::parse(BASE_TOOLCHAIN)?)
}

/// Build the toolchain for one target.
pub fn build_toolchain(target: &TargetDescriptor) -> Result<CToolchain> {
    let mut toolchain = baseline()?;

    let system = target.system_name();
    let libc = target.libc_label();
    toolchain.compiler = Some(COMPILER.to_string());
    toolchain.target_libc = Some(libc.clone());
    toolchain.target_cpu = Some(target.effective_cpu().to_string());
    toolchain.target_system_name = Some(system.clone());
    toolchain.toolchain_identifier = Some(system);
    toolchain.abi_version = Some(libc.clone());
    toolchain.abi_libc_version = Some(libc);

    toolchain.tool_path.extend(
        TOOL_NAMES
            .iter()
            .map(|tool| ToolPath::new(*tool, target.tool_path(tool))),
    );
    toolchain
        .cxx_builtin_include_directory
        .extend(target.include_dirs());

    tracing::debug!(
        toolchain = toolchain.toolchain_identifier.as_deref().unwrap_or_default(),
        cpu = target.effective_cpu(),
        cross = target.cross,
        "built toolchain"
    );
    Ok(toolchain)
}

/// Build a release holding one toolchain per target, in target order.
///
/// Fails if two targets derive the same toolchain identifier.
pub fn build_release(labels: &ReleaseLabels, targets: &[TargetDescriptor]) -> Result<CrosstoolRelease> {
    let mut release = CrosstoolRelease {
        major_version: Some(labels.major_version.clone()),
        minor_version: Some(labels.minor_version.clone()),
        ..Default::default()
    };

    let mut seen = HashSet::new();
    for target in targets {
        let identifier = target.system_name();
        if !seen.insert(identifier.clone()) {
            return Err(CrosstoolError::DuplicateToolchain { identifier });
        }
        release.toolchain.push(build_toolchain(target)?);
    }
    Ok(release)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CompilationMode, LinkingMode};

    fn tool_names(tc: &CToolchain) -> Vec<&str> {
        tc.tool_path
            .iter()
            .map(|t| t.name.as_deref().unwrap())
            .collect()
    }

    #[test]
    fn baseline_parses() {
        let tc = baseline().unwrap();
        assert_eq!(tc.host_system_name.as_deref(), Some("host"));
        assert_eq!(tc.needs_pic, Some(true));
        assert_eq!(tc.builtin_sysroot.as_deref(), Some(""));
        assert_eq!(tc.compiler_flag.len(), 7);
        assert_eq!(tc.linker_flag.len(), 3);
        assert_eq!(tc.unfiltered_cxx_flag[3], "-D__DATE__=\"redacted\"");
        assert_eq!(tc.objcopy_embed_flag, vec!["-I", "binary"]);
        assert_eq!(tc.compilation_mode_flags.len(), 2);
        assert_eq!(tc.compilation_mode_flags[0].mode, Some(CompilationMode::Dbg));
        assert_eq!(tc.compilation_mode_flags[1].mode, Some(CompilationMode::Opt));
        assert_eq!(
            tc.compilation_mode_flags[1].linker_flag,
            vec!["-Wl,--gc-sections"]
        );
        assert_eq!(tc.linking_mode_flags[0].mode, Some(LinkingMode::Dynamic));
        assert!(tc.tool_path.is_empty());
        assert!(tc.cxx_builtin_include_directory.is_empty());
    }

    #[test]
    fn host_toolchain() {
        let tc = build_toolchain(&TargetDescriptor::new(HOST_CPU, "local", false)).unwrap();
        assert_eq!(tc.toolchain_identifier.as_deref(), Some("host"));
        assert_eq!(tc.target_system_name.as_deref(), Some("host"));
        assert_eq!(tc.target_cpu.as_deref(), Some("k8"));
        assert_eq!(tc.target_libc.as_deref(), Some("k8-local"));
        assert_eq!(tc.abi_version.as_deref(), Some("k8-local"));
        assert_eq!(tc.abi_libc_version.as_deref(), Some("k8-local"));
        assert_eq!(tc.compiler.as_deref(), Some("gcc"));
        assert_eq!(tc.tool("gcc"), Some("/usr/bin/gcc"));
        assert_eq!(
            tc.cxx_builtin_include_directory,
            vec!["/usr/lib/gcc", "/usr/local/include", "/usr/include"]
        );
    }

    #[test]
    fn host_cpu_is_forced() {
        let tc = build_toolchain(&TargetDescriptor::new("riscv64", "local", false)).unwrap();
        assert_eq!(tc.target_cpu.as_deref(), Some("k8"));
        assert_eq!(tc.target_libc.as_deref(), Some("k8-local"));
        assert_eq!(tc.toolchain_identifier.as_deref(), Some("host"));
    }

    #[test]
    fn cross_toolchain() {
        let tc = build_toolchain(&TargetDescriptor::new("arm", "linux-gnueabihf", true)).unwrap();
        assert_eq!(
            tc.toolchain_identifier.as_deref(),
            Some("cross-arm-linux-gnueabihf")
        );
        assert_eq!(
            tc.target_system_name.as_deref(),
            Some("cross-arm-linux-gnueabihf")
        );
        assert_eq!(tc.target_cpu.as_deref(), Some("arm"));
        assert_eq!(tc.target_libc.as_deref(), Some("arm-linux-gnueabihf"));
        assert_eq!(tc.abi_version.as_deref(), Some("arm-linux-gnueabihf"));
        assert_eq!(tc.tool("ar"), Some("/usr/bin/arm-linux-gnueabihf-ar"));
        assert_eq!(tc.tool("strip"), Some("/usr/bin/arm-linux-gnueabihf-strip"));
        assert_eq!(
            tc.cxx_builtin_include_directory,
            vec![
                "/usr/arm-linux-gnueabihf/include",
                "/usr/lib/gcc-cross/arm-linux-gnueabihf"
            ]
        );
    }

    #[test]
    fn tool_list_keeps_duplicate_ld() {
        for target in default_targets() {
            let tc = build_toolchain(&target).unwrap();
            assert_eq!(tool_names(&tc), TOOL_NAMES.to_vec());
            let lds: Vec<_> = tc
                .tool_path
                .iter()
                .filter(|t| t.name.as_deref() == Some("ld"))
                .collect();
            assert_eq!(lds.len(), 2);
            assert_eq!(lds[0], lds[1]);
        }
    }

    #[test]
    fn toolchains_do_not_share_state() {
        let a = build_toolchain(&TargetDescriptor::new("aarch64", "linux-gnu", true)).unwrap();
        let b = build_toolchain(&TargetDescriptor::new("s390x", "linux-gnu", true)).unwrap();
        assert_eq!(a.tool_path.len(), 11);
        assert_eq!(b.tool_path.len(), 11);
        assert_eq!(b.cxx_builtin_include_directory.len(), 2);
    }

    #[test]
    fn default_release_order() {
        let release = build_release(&ReleaseLabels::default(), &default_targets()).unwrap();
        let names: Vec<_> = release
            .toolchain
            .iter()
            .map(|t| t.target_system_name.as_deref().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "host",
                "cross-arm-linux-gnueabihf",
                "cross-aarch64-linux-gnu",
                "cross-powerpc64le-linux-gnu",
                "cross-s390x-linux-gnu",
            ]
        );
        let cpus: Vec<_> = release
            .toolchain
            .iter()
            .map(|t| t.target_cpu.as_deref().unwrap())
            .collect();
        assert_eq!(cpus, vec!["k8", "arm", "aarch64", "powerpc64le", "s390x"]);
        assert_eq!(release.major_version.as_deref(), Some("local"));
        assert_eq!(release.minor_version.as_deref(), Some(""));
    }

    #[test]
    fn duplicate_system_name_is_rejected() {
        let targets = vec![
            TargetDescriptor::new("k8", "local", false),
            TargetDescriptor::new("x86_64", "linux-gnu", false),
        ];
        let err = build_release(&ReleaseLabels::default(), &targets).unwrap_err();
        assert!(matches!(
            err,
            CrosstoolError::DuplicateToolchain { ref identifier } if identifier == "host"
        ));
    }

    #[test]
    fn release_round_trips() {
        let release = build_release(&ReleaseLabels::default(), &default_targets()).unwrap();
        let text = text_format::to_string(&release);
        let parsed: CrosstoolRelease = text_format::parse(&text).unwrap();
        assert_eq!(parsed, release);
    }
}
