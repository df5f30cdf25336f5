//! SVG rendering of phenotype drawings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::compute::{Drawing, Phenotype};
use crate::schema::Environment;

/// Stem stroke width at the trunk; halves with every branch level.
const TRUNK_WIDTH: f64 = 2.0;
/// Thinnest stem stroke.
const MIN_STROKE: f64 = 0.25;
const STEM_COLOR: &str = "#5b3a1e";
const LEAF_COLOR: &str = "#3c8d2f";

/// Render a phenotype as a standalone SVG document.
///
/// Drawing coordinates have y pointing up; the output flips them so the
/// plant grows toward the top of the image.
pub fn render_svg(phenotype: &Phenotype, env: &Environment) -> String {
    render_drawing(&phenotype.drawing, env.leaf_size)
}

/// Render raw geometry as SVG with leaves of the given diameter.
pub fn render_drawing(drawing: &Drawing, leaf_size: f64) -> String {
    let pad = leaf_size.max(1.0);
    let b = drawing.bounds;
    let min_x = b.min_x - pad;
    let min_y = -b.max_y - pad;
    let width = b.width() + 2.0 * pad;
    let height = b.height() + 2.0 * pad;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{:.2} {:.2} {:.2} {:.2}\">\n",
        min_x, min_y, width, height
    );

    svg.push_str(&format!(
        "  <g stroke=\"{}\" stroke-linecap=\"round\">\n",
        STEM_COLOR
    ));
    for segment in &drawing.segments {
        let stroke = (TRUNK_WIDTH / (1u64 << segment.depth.min(16)) as f64).max(MIN_STROKE);
        svg.push_str(&format!(
            "    <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke-width=\"{:.2}\"/>\n",
            segment.from.x, -segment.from.y, segment.to.x, -segment.to.y, stroke
        ));
    }
    svg.push_str("  </g>\n");

    svg.push_str(&format!("  <g fill=\"{}\">\n", LEAF_COLOR));
    for leaf in &drawing.leaves {
        svg.push_str(&format!(
            "    <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\"/>\n",
            leaf.x,
            -leaf.y,
            0.5 * leaf_size
        ));
    }
    svg.push_str("  </g>\n</svg>\n");
    svg
}

/// Write `<dir>/<id>.svg`, creating `dir` if needed.
pub fn save_svg<P: AsRef<Path>>(
    phenotype: &Phenotype,
    env: &Environment,
    dir: P,
    id: &str,
) -> io::Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.svg", id));
    fs::write(&path, render_svg(phenotype, env))?;
    log::debug!("Saved {}", path.display());
    Ok(path)
}
