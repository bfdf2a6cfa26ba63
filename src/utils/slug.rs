//! URL-safe names for tags, technologies and sites.

use deunicode::deunicode;

/// Lowercase ASCII slug: non-alphanumeric runs collapse into a single `-`.
///
/// | Input | Output |
/// |-------|--------|
/// | `Motion design` | `motion-design` |
/// | `Vidéos & films` | `videos-films` |
/// | `  C++ / Rust ` | `c-rust` |
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text);
    let mut slug = String::with_capacity(ascii.len());

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Turn a slug into something usable as an expression identifier.
#[inline]
pub fn identifier(slug: &str) -> String {
    slug.replace('-', "_")
}
