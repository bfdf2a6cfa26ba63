//! Dynamic template paths.
//!
//! A path segment written `:expr` or `[expr]` is evaluated against the current
//! hydration and replaced by the result:
//!
//! | Template path | Hydration | Output path |
//! |---------------|-----------|-------------|
//! | `:language/:work/player.pug` | fr, neptune | `fr/neptune/player.html` |
//! | `:work.pdf.pug` | neptune | `neptune.pdf` |
//! | `[language is "fr"]/about.pug` | en | *(skipped)* |
//! | `[work.wip]/index.pug` | wip work | `[work.wip]/index.html` |
//!
//! A `false`, `nil` or empty result skips the page entirely. `true` keeps the
//! segment text as written.

use crate::expr::{ExprError, ExpressionEngine, Value};
use crate::hydration::Hydration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("in path segment `{segment}`")]
pub struct PathError {
    pub segment: String,
    #[source]
    pub source: ExprError,
}

/// The dynamic part of a path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicSegment<'a> {
    pub expression: &'a str,
    /// Only ever non-empty on the final segment.
    pub extension: &'a str,
}

/// Split `name.ext` into `("name", ".ext")`, keeping a `.pdf` before the extension.
///
/// `:work.pdf.pug` → `(":work", ".pdf.pug")`
fn split_extension(segment: &str) -> (&str, &str) {
    let Some(dot) = segment.rfind('.') else {
        return (segment, "");
    };
    let stem = &segment[..dot];
    match stem.strip_suffix(".pdf") {
        Some(stem) => (stem, &segment[stem.len()..]),
        None => (stem, &segment[dot..]),
    }
}

/// Parse one path segment, `None` when it is a plain literal.
pub fn parse_segment(segment: &str, is_last: bool) -> Option<DynamicSegment<'_>> {
    if let Some(inner) = segment.strip_prefix('[') {
        let close = inner.rfind(']')?;
        let extension = &inner[close + 1..];
        if !is_last && !extension.is_empty() {
            return None;
        }
        return Some(DynamicSegment {
            expression: &inner[..close],
            extension,
        });
    }

    if segment.starts_with(':') {
        let (stem, extension) = if is_last {
            split_extension(segment)
        } else {
            (segment, "")
        };
        return Some(DynamicSegment {
            expression: &stem[1..],
            extension,
        });
    }

    None
}

fn segments(path: &str) -> impl Iterator<Item = (&str, bool)> {
    let count = path.split('/').count();
    path.split('/')
        .enumerate()
        .map(move |(i, segment)| (segment, i + 1 == count))
}

/// Expression text of every dynamic segment, in path order.
pub fn dynamic_path_expressions(path: &str) -> Vec<String> {
    segments(path)
        .filter_map(|(segment, is_last)| parse_segment(segment, is_last))
        .map(|dynamic| dynamic.expression.to_owned())
        .collect()
}

/// Evaluate every dynamic segment, keeping the template's extension.
///
/// Returns `None` when a segment says the page must not be rendered.
pub fn substitute(
    engine: &ExpressionEngine,
    hydration: &Hydration,
    path: &str,
) -> Result<Option<String>, PathError> {
    let context = hydration.context();
    let mut resolved = Vec::new();

    for (segment, is_last) in segments(path) {
        let Some(dynamic) = parse_segment(segment, is_last) else {
            resolved.push(segment.to_owned());
            continue;
        };

        let error = |source| PathError {
            segment: segment.to_owned(),
            source,
        };

        let value = engine.eval(dynamic.expression, &context).map_err(error)?;
        match value {
            Value::Bool(true) => resolved.push(segment.to_owned()),
            Value::Bool(false) | Value::Nil => return Ok(None),
            Value::String(ref s) if s.is_empty() => return Ok(None),
            other => {
                let text = other.stringify().ok_or_else(|| {
                    error(ExprError::evaluation(
                        dynamic.expression,
                        format!("a {} cannot be used as a path segment", other.type_name()),
                    ))
                })?;
                resolved.push(text + dynamic.extension);
            }
        }
    }

    Ok(Some(resolved.join("/")))
}

/// Map a template file name to the file it renders to.
///
/// `.pug` becomes `.html`, and `x.pdf.pug` or `x.pdf.html` becomes `x.pdf`.
pub fn output_path(path: &str) -> String {
    for suffix in [".pdf.pug", ".pdf.html"] {
        if let Some(stem) = path.strip_suffix(suffix) {
            return format!("{stem}.pdf");
        }
    }
    match path.strip_suffix(".pug") {
        Some(stem) => format!("{stem}.html"),
        None => path.to_owned(),
    }
}

/// Destination of `path` for `hydration`, or `None` to skip.
pub fn resolve(
    engine: &ExpressionEngine,
    hydration: &Hydration,
    path: &str,
) -> Result<Option<String>, PathError> {
    Ok(substitute(engine, hydration, path)?.map(|path| output_path(&path)))
}
