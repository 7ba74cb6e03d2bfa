//! Rank tag palette for decorating multiplexed output.
//!
//! Each group member's output lines carry a colored `<rank>| ` prefix so
//! an operator can tell members apart on the shared console. The palette
//! is injected from configuration and validated against the actual group
//! size at startup; the default reproduces the classic four background
//! colors, which caps the default group size at 4.

use crossterm::style::{Color, ResetColor, SetBackgroundColor};
use crossterm::terminal::{Clear, ClearType};

use crate::error::{Error, Result};

/// Mapping from rank to a display color, total over `0..supported()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPalette {
    colors: Vec<Color>,
}

impl Default for TagPalette {
    fn default() -> Self {
        Self {
            colors: vec![
                Color::DarkRed,
                Color::DarkGreen,
                Color::DarkBlue,
                Color::DarkMagenta,
            ],
        }
    }
}

impl TagPalette {
    /// Build a palette from crossterm color names (e.g. `"dark_red"`).
    pub fn from_names(names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::Config(
                "tag palette must contain at least one color".to_string(),
            ));
        }
        let colors = names
            .iter()
            .map(|name| {
                Color::try_from(name.as_str())
                    .map_err(|_| Error::Config(format!("unknown tag color: {name}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { colors })
    }

    /// Number of ranks this palette can label.
    pub fn supported(&self) -> usize {
        self.colors.len()
    }

    /// Fail fast when the group has more members than the palette can
    /// label. Called before anything is spawned.
    pub fn validate(&self, group_size: u32) -> Result<()> {
        if group_size as usize > self.colors.len() {
            return Err(Error::GroupTooLarge {
                size: group_size,
                supported: self.colors.len(),
            });
        }
        Ok(())
    }

    /// Format one output line as `<rank>| <text>` with the rank's color.
    ///
    /// A single trailing line terminator (`\n` or `\r\n`) is stripped;
    /// the result carries a set-background escape up front and a
    /// clear-to-end-of-line plus color-reset at the end. Deterministic:
    /// the same (rank, line) pair always yields identical bytes.
    ///
    /// Ranks beyond the palette (only reachable when `validate` was
    /// skipped) render without a color.
    pub fn decorate(&self, rank: u32, line: &str) -> String {
        let text = line.strip_suffix('\n').unwrap_or(line);
        let text = text.strip_suffix('\r').unwrap_or(text);
        let color = self
            .colors
            .get(rank as usize)
            .copied()
            .unwrap_or(Color::Reset);
        format!(
            "{}{rank}| {text}{}{}",
            SetBackgroundColor(color),
            Clear(ClearType::UntilNewLine),
            ResetColor,
        )
    }
}
