//! Text-format output.

use std::io::{self, Write};

use super::{TextEnum, TextMessage};

const INDENT: &str = "  ";

/// Line-oriented writer used by [`TextMessage::write_fields`].
///
/// Each field goes on its own line; nested messages open a `name {` block
/// and indent their fields by two spaces.
pub struct TextWriter<'a> {
    out: &'a mut dyn Write,
    depth: usize,
}

impl<'a> TextWriter<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out, depth: 0 }
    }

    pub fn string(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.indent()?;
        write!(self.out, "{name}: \"")?;
        self.out.write_all(&escape(value.as_bytes()))?;
        self.out.write_all(b"\"\n")
    }

    pub fn optional_string(&mut self, name: &str, value: &Option<String>) -> io::Result<()> {
        match value {
            Some(v) => self.string(name, v),
            None => Ok(()),
        }
    }

    pub fn strings(&mut self, name: &str, values: &[String]) -> io::Result<()> {
        values.iter().try_for_each(|v| self.string(name, v))
    }

    pub fn optional_bool(&mut self, name: &str, value: Option<bool>) -> io::Result<()> {
        match value {
            Some(v) => {
                self.indent()?;
                writeln!(self.out, "{name}: {v}")
            }
            None => Ok(()),
        }
    }

    pub fn optional_enum<E: TextEnum>(&mut self, name: &str, value: Option<E>) -> io::Result<()> {
        match value {
            Some(v) => {
                self.indent()?;
                writeln!(self.out, "{name}: {}", v.name())
            }
            None => Ok(()),
        }
    }

    pub fn message<M: TextMessage>(&mut self, name: &str, value: &M) -> io::Result<()> {
        self.indent()?;
        writeln!(self.out, "{name} {{")?;
        self.depth += 1;
        let body = value.write_fields(self);
        self.depth -= 1;
        body?;
        self.indent()?;
        self.out.write_all(b"}\n")
    }

    pub fn messages<M: TextMessage>(&mut self, name: &str, values: &[M]) -> io::Result<()> {
        values.iter().try_for_each(|v| self.message(name, v))
    }

    fn indent(&mut self) -> io::Result<()> {
        for _ in 0..self.depth {
            self.out.write_all(INDENT.as_bytes())?;
        }
        Ok(())
    }
}

/// Escape a string body for a double-quoted literal. Bytes outside
/// printable ASCII become three-digit octal escapes.
fn escape(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            0x20..=0x7e => out.push(b),
            _ => out.extend_from_slice(format!("\\{b:03o}").as_bytes()),
        }
    }
    out
}
