//! Plain-text output of duplicate groups.
//!
//! One block per group, blocks separated by a blank line. Each block is an
//! optional header naming the common length followed by one absolute path
//! per line:
//!
//! ```text
//! ( Orte mit 91 Bytes Länge )
//! /data/a.txt
//! /data/b.txt
//!
//! ( Orte mit 12 Bytes Länge )
//! /data/x.bin
//! /data/y.bin
//! ```

use std::io::{self, Write};

use yansi::Paint;

use crate::duplicates::DuplicateGroup;

/// Writer for the plain-text block format.
#[derive(Debug, Clone)]
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    show_lengths: bool,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a text output with length headers and no color.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self {
            groups,
            show_lengths: true,
            color: false,
        }
    }

    /// Enable or disable the `( Orte mit N Bytes Länge )` header lines.
    #[must_use]
    pub fn with_lengths(mut self, show_lengths: bool) -> Self {
        self.show_lengths = show_lengths;
        self
    }

    /// Enable or disable ANSI styling of the header lines.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Header line for a group of `length`-byte files.
    #[must_use]
    pub fn header(length: u64) -> String {
        format!("( Orte mit {} Bytes Länge )", length)
    }

    /// Write every group to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (index, group) in self.groups.iter().enumerate() {
            if index > 0 {
                writeln!(writer)?;
            }
            if self.show_lengths {
                let header = Self::header(group.length);
                if self.color {
                    writeln!(writer, "{}", header.bold().cyan())?;
                } else {
                    writeln!(writer, "{}", header)?;
                }
            }
            for path in &group.files {
                writeln!(writer, "{}", path.display())?;
            }
        }
        Ok(())
    }

    /// Render every group into a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
