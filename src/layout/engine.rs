//! Placing a work's content on a grid.
//!
//! Every row of a layout is stretched to the same width, the least common
//! multiple of all row lengths, by repeating its cells. A cell that ends up in
//! several grid positions, on one row or across rows, becomes a single element
//! spanning all of them:
//!
//! ```text
//! p          p0 p0
//! m1, p  ──► m0 p1
//! m1, l      m0 l0
//! m          m1 m1
//! ```

use super::error::LayoutError;
use super::parser::{CellKind, LayoutCell, describe, normalize};
use crate::data::{Link, Media, Paragraph, WorkOneLang};
use crate::expr::Record;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A `(row, column)` grid position.
pub type Position = (usize, usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Paragraph(Paragraph),
    Media(Media),
    Link(Link),
    Spacer,
}

/// Smallest rectangle covering an element's positions, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionBounds {
    pub start_row: usize,
    pub end_row: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl PositionBounds {
    pub fn of(positions: &[Position]) -> Self {
        let rows = positions.iter().map(|&(row, _)| row);
        let columns = positions.iter().map(|&(_, column)| column);
        Self {
            start_row: rows.clone().min().unwrap_or_default(),
            end_row: rows.max().unwrap_or_default(),
            start_column: columns.clone().min().unwrap_or_default(),
            end_column: columns.max().unwrap_or_default(),
        }
    }

    /// CSS grid placement, with one-based lines and exclusive ends.
    pub fn css(&self) -> String {
        format!(
            "grid-column: {} / {}; grid-row: {} / {};",
            self.start_column + 1,
            self.end_column + 2,
            self.start_row + 1,
            self.end_row + 2
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaidOutElement {
    pub kind: CellKind,
    pub index: usize,
    pub positions: Vec<Position>,
    pub content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_content_type: Option<String>,
    pub bounds: PositionBounds,
}

impl LaidOutElement {
    pub fn css(&self) -> String {
        self.bounds.css()
    }

    /// ID of the underlying paragraph, media or link.
    pub fn content_id(&self) -> &str {
        match &self.content {
            Content::Paragraph(p) => &p.id,
            Content::Media(m) => &m.id,
            Content::Link(l) => &l.id,
            Content::Spacer => "",
        }
    }

    /// Expression-facing view, as exposed to templates through `layout`.
    pub fn to_record(&self) -> Record {
        let record = Record::new(format!("{}{}", self.kind.name(), self.index))
            .with("type", self.kind.name())
            .with("index", self.index)
            .with("id", self.content_id())
            .with("css", self.css());

        match &self.content {
            Content::Paragraph(p) => record.with("content", p.content.as_str()),
            Content::Media(m) => record
                .with("source", m.source.as_str())
                .with("alt", m.alt.as_str())
                .with("title", m.title.as_str())
                .with("content_type", m.content_type.as_str())
                .with("general_content_type", self.general_content_type.clone()),
            Content::Link(l) => record
                .with("url", l.url.as_str())
                .with("name", l.name.as_str())
                .with("title", l.title.as_str()),
            Content::Spacer => record,
        }
    }
}

const fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// `None` on overflow.
const fn lcm(a: usize, b: usize) -> Option<usize> {
    (a / gcd(a, b)).checked_mul(b)
}

/// Widest grid a layout may expand to: any mix of rows up to 10 cells long fits.
const MAX_WIDTH: usize = 2520;

/// Columns of the grid: the least common multiple of the row lengths.
fn grid_width(grid: &[Vec<LayoutCell>]) -> Result<usize, LayoutError> {
    grid.iter()
        .enumerate()
        .try_fold(1, |width, (row, cells)| {
            lcm(width, cells.len())
                .filter(|&width| width <= MAX_WIDTH)
                .ok_or_else(|| LayoutError::MalformedRow {
                    row,
                    reason: format!(
                        "{} cells make the grid wider than {MAX_WIDTH} columns",
                        cells.len()
                    ),
                })
        })
}

/// One cell per row: paragraphs, then media, then links.
fn auto_layout(work: &WorkOneLang) -> Vec<Vec<LayoutCell>> {
    let column = |kind: CellKind, count: usize| {
        (0..count).map(move |i| vec![LayoutCell::new(kind, Some(i))])
    };
    column(CellKind::Paragraph, work.paragraphs.len())
        .chain(column(CellKind::Media, work.media.len()))
        .chain(column(CellKind::Link, work.links.len()))
        .collect()
}

/// Give index-less cells the next index of their kind.
///
/// An explicit index moves the kind's counter past it.
fn resolve_indices(grid: &[Vec<LayoutCell>]) -> Vec<Vec<(CellKind, usize)>> {
    let mut next: FxHashMap<CellKind, usize> = FxHashMap::default();
    grid.iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    let counter = next.entry(cell.kind).or_default();
                    let index = cell.index.unwrap_or(*counter);
                    *counter = index + 1;
                    (cell.kind, index)
                })
                .collect()
        })
        .collect()
}

fn content_for(
    work: &WorkOneLang,
    kind: CellKind,
    index: usize,
    grid: &[Vec<LayoutCell>],
) -> Result<Content, LayoutError> {
    let not_enough = |what, available| LayoutError::NotEnough {
        what,
        layout: describe(grid),
        available,
    };
    match kind {
        CellKind::Paragraph => work
            .paragraphs
            .get(index)
            .cloned()
            .map(Content::Paragraph)
            .ok_or_else(|| not_enough("paragraphs", work.paragraphs.len())),
        CellKind::Media => work
            .media
            .get(index)
            .cloned()
            .map(Content::Media)
            .ok_or_else(|| not_enough("media", work.media.len())),
        CellKind::Link => work
            .links
            .get(index)
            .cloned()
            .map(Content::Link)
            .ok_or_else(|| not_enough("links", work.links.len())),
        CellKind::Spacer => Ok(Content::Spacer),
    }
}

/// Lay out a work's paragraphs, media and links.
///
/// Works without a layout get one element per row. Elements are returned
/// column by column, top to bottom.
pub fn lay_out(work: &WorkOneLang) -> Result<Vec<LaidOutElement>, LayoutError> {
    let grid = if work.metadata.layout.is_empty() {
        auto_layout(work)
    } else {
        normalize(&work.metadata.layout)?
    };

    let width = grid_width(&grid)?;
    let resolved = resolve_indices(&grid);

    let mut elements: Vec<LaidOutElement> = Vec::new();
    let mut seen: FxHashMap<(CellKind, usize), usize> = FxHashMap::default();

    for (row, cells) in resolved.iter().enumerate() {
        let repeat = width / cells.len();
        for column in 0..width {
            let (kind, index) = cells[column / repeat];

            if let Some(&existing) = seen.get(&(kind, index)) {
                elements[existing].positions.push((row, column));
                continue;
            }

            let content = content_for(work, kind, index, &grid)?;
            let general_content_type = match &content {
                Content::Media(media) => Some(media.general_content_type()),
                _ => None,
            };
            seen.insert((kind, index), elements.len());
            elements.push(LaidOutElement {
                kind,
                index,
                positions: vec![(row, column)],
                content,
                general_content_type,
                bounds: PositionBounds::of(&[(row, column)]),
            });
        }
    }

    let mut elements: Vec<LaidOutElement> = elements
        .into_iter()
        .filter(|element| element.kind != CellKind::Spacer)
        .map(|element| LaidOutElement {
            bounds: PositionBounds::of(&element.positions),
            ..element
        })
        .collect();
    elements.sort_by_key(|element| (element.bounds.start_column, element.bounds.start_row));
    Ok(elements)
}
