//! Rendering of grown plants for saving and display.
//!
//! Rendering is never part of the optimization loop; callers invoke it on
//! phenotypes they want to keep (e.g. the best of each generation).

mod svg;

pub use svg::{render_drawing, render_svg, save_svg};
