//! Diagnostic output. Everything here goes to stderr.

use std::fmt::Display;
use std::io::{self, Write};

use console::style;

const ERROR_PREFIX: &str = "Error:";
const WARNING_PREFIX: &str = "Warning:";

pub struct Diag<W: Write> {
    out: W,
    styled: bool,
}

impl Diag<io::Stderr> {
    pub fn stderr() -> Self {
        Self {
            out: io::stderr(),
            styled: console::colors_enabled_stderr(),
        }
    }
}

impl<W: Write> Diag<W> {
    /// Unstyled sink.
    #[cfg(test)]
    pub fn plain(out: W) -> Self {
        Self { out, styled: false }
    }

    pub fn error(&mut self, msg: impl Display) {
        self.line(&format!("{ERROR_PREFIX} {msg}"));
    }

    pub fn warning(&mut self, msg: impl Display) {
        self.line(&format!("{WARNING_PREFIX} {msg}"));
    }

    /// Write one line; a leading `Error:`/`Warning:` is coloured when styled.
    pub fn line(&mut self, line: &str) {
        let rendered = match (self.styled, split_prefix(line)) {
            (true, Some((prefix, rest))) => {
                let prefix = if prefix == ERROR_PREFIX {
                    style(prefix).red().bold()
                } else {
                    style(prefix).yellow().bold()
                };
                format!("{}{rest}", prefix.force_styling(true))
            }
            _ => line.to_string(),
        };
        // Nowhere left to report a failing stderr.
        let _ = writeln!(self.out, "{rendered}");
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

fn split_prefix(line: &str) -> Option<(&'static str, &str)> {
    [ERROR_PREFIX, WARNING_PREFIX]
        .into_iter()
        .find_map(|p| line.strip_prefix(p).map(|rest| (p, rest)))
}
