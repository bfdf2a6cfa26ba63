//! Grid layout of a work's paragraphs, media and links.
//!
//! A layout is written as rows of cells in the work's metadata:
//!
//! ```json
//! "layout": ["p", ["m1", "p"], ["m1", null], "l"]
//! ```
//!
//! | Cell | Meaning |
//! |------|---------|
//! | `p` `m` `l` | next paragraph, media or link |
//! | `p2` `m1` | a specific one, counting from 1 |
//! | `.` or `null` | empty space |

mod engine;
mod error;
mod parser;

pub use engine::{LaidOutElement, lay_out};
