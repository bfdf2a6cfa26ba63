//! Raw layout rows to typed cells.

use super::error::LayoutError;
use crate::data::LayoutRow;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Paragraph,
    Media,
    Link,
    Spacer,
}

impl CellKind {
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'p' => Some(Self::Paragraph),
            'm' => Some(Self::Media),
            'l' => Some(Self::Link),
            '.' => Some(Self::Spacer),
            _ => None,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Self::Paragraph => 'p',
            Self::Media => 'm',
            Self::Link => 'l',
            Self::Spacer => '.',
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Media => "media",
            Self::Link => "link",
            Self::Spacer => "spacer",
        }
    }
}

/// One token of a layout, `p`, `m2`, `.`...
///
/// `index` is zero-based; `None` means "the next one".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutCell {
    pub kind: CellKind,
    pub index: Option<usize>,
}

impl LayoutCell {
    pub const fn new(kind: CellKind, index: Option<usize>) -> Self {
        Self { kind, index }
    }
}

/// Written back in the one-based notation it was parsed from.
impl fmt::Display for LayoutCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}{}", self.kind.letter(), index + 1),
            None => write!(f, "{}", self.kind.letter()),
        }
    }
}

/// Parse one trimmed token.
pub fn parse_cell(token: &str) -> Result<LayoutCell, LayoutError> {
    let mut chars = token.chars();
    let Some(letter) = chars.next() else {
        return Err(LayoutError::malformed_cell(token, "empty cell"));
    };
    let kind = CellKind::from_letter(letter).ok_or_else(|| {
        LayoutError::malformed_cell(token, format!("unknown cell type `{letter}`"))
    })?;

    let suffix = chars.as_str();
    if suffix.is_empty() {
        return Ok(LayoutCell::new(kind, None));
    }

    match suffix.parse::<usize>() {
        Ok(0) => Err(LayoutError::malformed_cell(
            token,
            "element indices start at 1",
        )),
        Ok(n) if suffix.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(LayoutCell::new(kind, Some(n - 1)))
        }
        _ => Err(LayoutError::malformed_cell(
            token,
            format!("element index `{suffix}` is not a positive integer"),
        )),
    }
}

fn parse_token(row: usize, token: Option<&str>) -> Result<LayoutCell, LayoutError> {
    let Some(token) = token else {
        return Ok(LayoutCell::new(CellKind::Spacer, None));
    };
    let trimmed = token.trim().trim_matches(['[', ']']).trim();
    if trimmed.is_empty() {
        return Err(LayoutError::MalformedRow {
            row,
            reason: format!("cell `{token}` is empty"),
        });
    }
    parse_cell(trimmed)
}

/// Turn raw layout rows into a grid of cells.
///
/// Empty rows are dropped. Any malformed token fails the whole layout.
pub fn normalize(rows: &[LayoutRow]) -> Result<Vec<Vec<LayoutCell>>, LayoutError> {
    let mut grid = Vec::with_capacity(rows.len());
    for (row_index, row) in rows.iter().enumerate() {
        let cells = match row {
            LayoutRow::Cell(token) => vec![parse_token(row_index, token.as_deref())?],
            LayoutRow::Row(tokens) => tokens
                .iter()
                .map(|token| parse_token(row_index, token.as_deref()))
                .collect::<Result<Vec<_>, _>>()?,
        };
        if !cells.is_empty() {
            grid.push(cells);
        }
    }
    Ok(grid)
}

/// `p; m1, p; l` notation used in error messages.
pub fn describe(grid: &[Vec<LayoutCell>]) -> String {
    grid.iter()
        .map(|row| {
            row.iter()
                .map(LayoutCell::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(token: &str) -> Option<String> {
        Some(token.to_owned())
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(
            parse_cell("p").unwrap(),
            LayoutCell::new(CellKind::Paragraph, None)
        );
        assert_eq!(
            parse_cell("m2").unwrap(),
            LayoutCell::new(CellKind::Media, Some(1))
        );
        assert_eq!(
            parse_cell("l10").unwrap(),
            LayoutCell::new(CellKind::Link, Some(9))
        );
        assert_eq!(
            parse_cell(".").unwrap(),
            LayoutCell::new(CellKind::Spacer, None)
        );
    }

    #[test]
    fn test_parse_cell_malformed() {
        for token in ["x", "x2", "p0", "pa", "p-1", "p+1", "m1.5", ""] {
            assert!(
                matches!(parse_cell(token), Err(LayoutError::MalformedCell { .. })),
                "{token} should be malformed"
            );
        }
    }

    #[test]
    fn test_normalize() {
        let rows = vec![
            LayoutRow::Cell(cell("p")),
            LayoutRow::Row(vec![cell("[m1]"), None, cell(" l ")]),
            LayoutRow::Row(vec![]),
            LayoutRow::Cell(None),
        ];
        let grid = normalize(&rows).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0], vec![LayoutCell::new(CellKind::Paragraph, None)]);
        assert_eq!(
            grid[1],
            vec![
                LayoutCell::new(CellKind::Media, Some(0)),
                LayoutCell::new(CellKind::Spacer, None),
                LayoutCell::new(CellKind::Link, None),
            ]
        );
        assert_eq!(grid[2], vec![LayoutCell::new(CellKind::Spacer, None)]);
        assert_eq!(describe(&grid), "p; m1, ., l; .");
    }

    #[test]
    fn test_normalize_fails_on_any_bad_token() {
        let rows = vec![
            LayoutRow::Cell(cell("p")),
            LayoutRow::Row(vec![cell("m"), cell("q3")]),
        ];
        let err = normalize(&rows).unwrap_err();
        assert_eq!(err, LayoutError::malformed_cell("q3", "unknown cell type `q`"));

        let rows = vec![LayoutRow::Row(vec![cell("p"), cell("[]")])];
        assert!(matches!(
            normalize(&rows),
            Err(LayoutError::MalformedRow { row: 0, .. })
        ));
    }
}
