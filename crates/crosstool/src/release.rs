//! Writing a release to its CROSSTOOL text file.
//!
//! Output layout: optional boilerplate copied byte for byte, the
//! `# DO NOT EDIT` header, then the text-format body.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{CrosstoolError, Result};
use crate::schema::CrosstoolRelease;
use crate::text_format::{self, TextMessage};

/// Tool name recorded in the generated header.
pub const GENERATOR: &str = "generate_crosstool";

/// First line of every generated file.
pub const HEADER_MARKER: &str = "# DO NOT EDIT";

/// The comment block written between the boilerplate and the body.
pub fn header() -> String {
    format!(
        "{HEADER_MARKER}\n\
         # This file contains the text format encoding of a\n\
         # {}\n\
         # protocol buffer generated by {GENERATOR}.\n\n",
        CrosstoolRelease::FULL_NAME
    )
}

/// Write `release` to `out`, preceded by the boilerplate file if given.
pub fn write_release(
    out: &mut dyn Write,
    release: &CrosstoolRelease,
    boilerplate: Option<&Path>,
) -> Result<()> {
    if let Some(path) = boilerplate {
        copy_boilerplate(out, path)?;
    }
    out.write_all(header().as_bytes())?;
    text_format::print(release, out)?;
    out.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and write `release` into it.
pub fn write_release_file(
    release: &CrosstoolRelease,
    path: &Path,
    boilerplate: Option<&Path>,
) -> Result<()> {
    let file = File::create(path).map_err(|source| CrosstoolError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    write_release(&mut out, release, boilerplate)?;
    tracing::info!(
        path = %path.display(),
        toolchains = release.toolchain.len(),
        "wrote CROSSTOOL"
    );
    Ok(())
}

/// The boilerplate handle is closed when this returns, whether or not the
/// copy completed.
fn copy_boilerplate(out: &mut dyn Write, path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|source| CrosstoolError::OpenBoilerplate {
        path: path.to_path_buf(),
        source,
    })?;
    let copied = io::copy(&mut file, out).map_err(|source| CrosstoolError::CopyBoilerplate {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = copied, "copied boilerplate");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_release, default_targets, ReleaseLabels};

    fn default_release() -> CrosstoolRelease {
        build_release(&ReleaseLabels::default(), &default_targets()).unwrap()
    }

    #[test]
    fn header_names_release_type() {
        assert_eq!(
            header(),
            "# DO NOT EDIT\n\
             # This file contains the text format encoding of a\n\
             # com.google.devtools.build.lib.view.config.crosstool.CrosstoolRelease\n\
             # protocol buffer generated by generate_crosstool.\n\n"
        );
    }

    #[test]
    fn output_without_boilerplate() {
        let mut buf = Vec::new();
        write_release(&mut buf, &default_release(), None).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with(HEADER_MARKER));
        assert_eq!(text.matches("\ntoolchain {\n").count(), 5);
        assert!(text.contains("major_version: \"local\"\nminor_version: \"\"\n"));
        assert!(text.contains("  unfiltered_cxx_flag: \"-D__TIME__=\\\"redacted\\\"\"\n"));
        assert!(text.contains("  tool_path {\n    name: \"ar\"\n    path: \"/usr/bin/ar\"\n  }\n"));
        assert!(text.contains("  linking_mode_flags {\n    mode: DYNAMIC\n  }\n"));
    }

    #[test]
    fn body_parses_back() {
        let release = default_release();
        let mut buf = Vec::new();
        write_release(&mut buf, &release, None).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let parsed: CrosstoolRelease = text_format::parse(&text).unwrap();
        assert_eq!(parsed, release);
    }

    #[test]
    fn boilerplate_is_copied_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let bp = dir.path().join("boilerplate.txt");
        let bytes = b"# Copyright The Authors.\n#\n# Licensed under\xff raw bytes\n\n";
        std::fs::write(&bp, bytes).unwrap();

        let mut buf = Vec::new();
        write_release(&mut buf, &default_release(), Some(&bp)).unwrap();
        let marker = buf
            .windows(HEADER_MARKER.len())
            .position(|w| w == HEADER_MARKER.as_bytes())
            .unwrap();
        assert_eq!(&buf[..marker], bytes);
    }

    #[test]
    fn missing_boilerplate_is_error() {
        let mut buf = Vec::new();
        let err = write_release(
            &mut buf,
            &default_release(),
            Some(Path::new("/nonexistent/boilerplate.txt")),
        )
        .unwrap_err();
        assert!(matches!(err, CrosstoolError::OpenBoilerplate { .. }));
        assert!(err.to_string().contains("/nonexistent/boilerplate.txt"));
        assert!(buf.is_empty());
    }

    #[test]
    fn unreadable_boilerplate_is_copy_error() {
        // A directory opens fine but cannot be read.
        let dir = tempfile::tempdir().unwrap();
        let mut buf = Vec::new();
        let err = write_release(&mut buf, &default_release(), Some(dir.path())).unwrap_err();
        assert!(matches!(err, CrosstoolError::CopyBoilerplate { .. }));
        assert!(err.to_string().contains(&dir.path().display().to_string()));
        assert!(!String::from_utf8_lossy(&buf).contains(HEADER_MARKER));
    }

    #[test]
    fn io_cause_is_reported_once() {
        let err = write_release(
            &mut Vec::new(),
            &default_release(),
            Some(Path::new("/nonexistent/boilerplate.txt")),
        )
        .unwrap_err();
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(!err.to_string().contains(&source));
    }

    #[test]
    fn writes_and_truncates_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("CROSSTOOL");
        std::fs::write(&out, "stale content that is longer than nothing").unwrap();

        let release = default_release();
        write_release_file(&release, &out, None).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.starts_with(HEADER_MARKER));
        assert!(!text.contains("stale"));
        assert_eq!(text_format::parse::<CrosstoolRelease>(&text).unwrap(), release);
    }

    #[test]
    fn unwritable_output_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing-dir").join("CROSSTOOL");
        let err = write_release_file(&default_release(), &out, None).unwrap_err();
        assert!(matches!(err, CrosstoolError::Create { .. }));
    }
}
