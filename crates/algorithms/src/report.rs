//! Plain-text analysis reports.
//!
//! A [`Report`] is a title, a timestamp and a list of sections; each section
//! is a heading followed by `label: value` lines. Floats print with six
//! decimals, euro deltas as whole numbers truncated toward zero.

use crate::engine::LandUseCode;
use chrono::NaiveDateTime;
use std::fmt;

/// Timestamp layout of the `Data:` line
pub const DATE_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Value(String, f64),
    Whole(String, f64),
    Text(String, String),
    Blank,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Value(label, v) => write!(f, "{}: {:.6}", label, v),
            Line::Whole(label, v) => write!(f, "{}: {}", label, v.trunc() as i64),
            Line::Text(label, text) => write!(f, "{}: {}", label, text),
            Line::Blank => Ok(()),
        }
    }
}

/// One block of a report
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    heading: String,
    lines: Vec<Line>,
}

impl Section {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            lines: Vec::new(),
        }
    }

    /// `label: 123.456789`
    pub fn value(mut self, label: impl Into<String>, value: f64) -> Self {
        self.lines.push(Line::Value(label.into(), value));
        self
    }

    /// `label: 123` (truncated toward zero)
    pub fn whole(mut self, label: impl Into<String>, value: f64) -> Self {
        self.lines.push(Line::Whole(label.into(), value));
        self
    }

    /// `label: text`
    pub fn text(mut self, label: impl Into<String>, text: impl fmt::Display) -> Self {
        self.lines.push(Line::Text(label.into(), text.to_string()));
        self
    }

    /// `label: [1 7 9]`
    pub fn codes(self, label: impl Into<String>, codes: &[LandUseCode]) -> Self {
        let list = codes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.text(label, format!("[{}]", list))
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(Line::Blank);
        self
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A complete report, rendered through `Display`.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    title: String,
    generated: NaiveDateTime,
    sections: Vec<Section>,
}

impl Report {
    pub fn new(title: impl Into<String>, generated: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            generated,
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Find the value printed after `label`, searching every section.
    pub fn lookup(&self, label: &str) -> Option<f64> {
        self.sections
            .iter()
            .flat_map(|s| s.lines.iter())
            .find_map(|line| match line {
                Line::Value(l, v) | Line::Whole(l, v) if l == label => Some(*v),
                _ => None,
            })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        write!(f, "Data: {}\n\n\n", self.generated.format(DATE_FORMAT))?;
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{}\n\n", section.heading)?;
            for line in &section.lines {
                writeln!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}
