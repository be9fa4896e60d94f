//! Heatmap rendering (SVG via plotters)
//!
//! Presentation only: consumes a [`NormMatrix`] and never changes it.
//!
//! - Colors come from the 0.2-0.6 slice of the "Blues" ramp
//! - Each column is scaled on its own, on the negated ratios, so the fastest
//!   architecture of a dataset is the darkest cell of its column
//! - The column minimum gets a dashed border and a bold label
//! - No-data cells stay white and read "n/a"

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::matrix::Cell;
use crate::normalize::NormMatrix;
use crate::{Error, Result};

/// Colorbrewer "Blues", evenly spaced stops from 0.0 to 1.0.
const BLUES: [(u8, u8, u8); 9] = [
    (247, 251, 255),
    (222, 235, 247),
    (198, 219, 239),
    (158, 202, 225),
    (107, 174, 214),
    (66, 146, 198),
    (33, 113, 181),
    (8, 81, 156),
    (8, 48, 107),
];

/// Slice of the ramp used for cells.
const RAMP_LOW: f64 = 0.2;
const RAMP_HIGH: f64 = 0.6;

/// Inset of the best-cell border, as a fraction of the cell.
const BOX_SHIFT: f64 = 0.05;

const DASH: i32 = 6;
const GAP: i32 = 4;

fn render_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

/// Sample the "Blues" ramp at `t` in [0, 1].
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn blues(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (BLUES.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(BLUES.len() - 2);
    let frac = scaled - lower as f64;
    let (r0, g0, b0) = BLUES[lower];
    let (r1, g1, b1) = BLUES[lower + 1];
    let lerp = |a: u8, b: u8| (f64::from(b) - f64::from(a)).mul_add(frac, f64::from(a)).round() as u8;
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Color intensity of `value` within its column, 0 (slowest) to 1 (fastest).
#[must_use]
pub fn column_intensity(value: f64, column_min: f64, column_max: f64) -> f64 {
    let range = column_max - column_min;
    if range > 0.0 {
        (column_max - value) / range
    } else {
        0.0
    }
}

/// Percentage label of a normalized ratio (`1.0` -> `"100.00%"`).
#[must_use]
pub fn percent_label(cell: Cell) -> String {
    match cell {
        Cell::Value(v) => format!("{:.2}%", v * 100.0),
        Cell::NoData => "n/a".to_string(),
    }
}

/// Fill of one cell given its column's value range.
///
/// The column minimum gets the darkest slice color, the maximum the lightest;
/// no-data cells are white.
#[must_use]
pub fn cell_fill(cell: Cell, column_min: Option<f64>, column_max: Option<f64>) -> RGBColor {
    match (cell, column_min, column_max) {
        (Cell::Value(v), Some(lo), Some(hi)) => {
            let u = column_intensity(v, lo, hi);
            blues((RAMP_HIGH - RAMP_LOW).mul_add(u, RAMP_LOW))
        }
        _ => WHITE,
    }
}

/// Layout of the heatmap in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapRenderer {
    /// Width of one cell
    pub cell_width: u32,
    /// Height of one cell
    pub cell_height: u32,
    /// Space for the y-axis title and tick labels
    pub margin_left: u32,
    /// Space for the x-axis title and tick labels
    pub margin_top: u32,
    /// Label font size
    pub font_size: u32,
}

impl Default for HeatmapRenderer {
    fn default() -> Self {
        Self {
            cell_width: 110,
            cell_height: 50,
            margin_left: 130,
            margin_top: 70,
            font_size: 15,
        }
    }
}

impl HeatmapRenderer {
    /// Renderer with the default layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Image size for a matrix.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn dimensions(&self, norm: &NormMatrix) -> (u32, u32) {
        let values = norm.values();
        let columns = values.num_columns() as u32;
        let rows = values.num_rows() as u32;
        (
            self.margin_left + columns * self.cell_width + 20,
            self.margin_top + rows * self.cell_height + 10,
        )
    }

    /// Render to an SVG document in memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if drawing fails.
    pub fn render_to_string(&self, norm: &NormMatrix) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.dimensions(norm)).into_drawing_area();
            self.draw(&root, norm)?;
            root.present().map_err(render_error)?;
        }
        Ok(svg)
    }

    /// Render to an SVG file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if drawing or writing fails.
    pub fn render_svg<P: AsRef<Path>>(&self, norm: &NormMatrix, path: P) -> Result<()> {
        let root = SVGBackend::new(path.as_ref(), self.dimensions(norm)).into_drawing_area();
        self.draw(&root, norm)?;
        root.present().map_err(render_error)
    }

    #[allow(
        clippy::cast_possible_wrap,
        clippy::cast_possible_truncation,
        clippy::float_cmp
    )]
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, norm: &NormMatrix) -> Result<()> {
        let values = norm.values();
        let (cw, ch) = (self.cell_width as i32, self.cell_height as i32);
        let (left, top) = (self.margin_left as i32, self.margin_top as i32);
        let font_size = f64::from(self.font_size);

        root.fill(&WHITE).map_err(render_error)?;

        let centered = Pos::new(HPos::Center, VPos::Center);
        let regular = TextStyle::from(FontDesc::new(FontFamily::SansSerif, font_size, FontStyle::Normal))
            .pos(centered);
        let bold = TextStyle::from(FontDesc::new(FontFamily::SansSerif, font_size, FontStyle::Bold))
            .pos(centered);

        for column in 0..values.num_columns() {
            let cells = values.column(column);
            let present: Vec<f64> = cells.iter().filter_map(|c| c.value()).collect();
            let min = present.iter().copied().reduce(f64::min);
            let max = present.iter().copied().reduce(f64::max);

            for (row, cell) in cells.iter().enumerate() {
                let x0 = left + column as i32 * cw;
                let y0 = top + row as i32 * ch;

                let is_best = matches!((cell, min), (Cell::Value(v), Some(m)) if *v == m);
                let fill = cell_fill(*cell, min, max);
                root.draw(&Rectangle::new([(x0, y0), (x0 + cw, y0 + ch)], fill.filled()))
                    .map_err(render_error)?;

                if is_best {
                    let inset_x = (f64::from(cw) * BOX_SHIFT).round() as i32;
                    let inset_y = (f64::from(ch) * BOX_SHIFT).round() as i32;
                    dashed_box(
                        root,
                        (x0 + inset_x, y0 + inset_y),
                        (x0 + cw - inset_x, y0 + ch - inset_y),
                    )?;
                }

                let style = if is_best { &bold } else { &regular };
                root.draw(&Text::new(
                    percent_label(*cell),
                    (x0 + cw / 2, y0 + ch / 2),
                    style.clone(),
                ))
                .map_err(render_error)?;
            }
        }

        // Column separators
        let grid_bottom = top + values.num_rows() as i32 * ch;
        for column in 0..=values.num_columns() {
            let x = left + column as i32 * cw;
            root.draw(&PathElement::new(
                vec![(x, top), (x, grid_bottom)],
                WHITE.stroke_width(1),
            ))
            .map_err(render_error)?;
        }

        self.draw_axes(root, norm)
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    fn draw_axes<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, norm: &NormMatrix) -> Result<()> {
        let values = norm.values();
        let (cw, ch) = (self.cell_width as i32, self.cell_height as i32);
        let (left, top) = (self.margin_left as i32, self.margin_top as i32);
        let tick_size = f64::from(self.font_size) * 0.8;
        let title_size = f64::from(self.font_size) * 0.93;

        let tick = TextStyle::from(FontDesc::new(FontFamily::SansSerif, tick_size, FontStyle::Normal));
        let title = FontDesc::new(FontFamily::SansSerif, title_size, FontStyle::Bold);

        // Top x-axis
        for (column, dataset) in values.datasets().iter().enumerate() {
            root.draw(&Text::new(
                dataset.clone(),
                (left + column as i32 * cw + cw / 2, top - 12),
                tick.clone().pos(Pos::new(HPos::Center, VPos::Bottom)),
            ))
            .map_err(render_error)?;
        }
        let grid_width = values.num_columns() as i32 * cw;
        root.draw(&Text::new(
            "Dataset",
            (left + grid_width / 2, 18),
            TextStyle::from(title.clone()).pos(Pos::new(HPos::Center, VPos::Center)),
        ))
        .map_err(render_error)?;

        // Y-axis
        for (row, architecture) in values.architectures().iter().enumerate() {
            root.draw(&Text::new(
                architecture.clone(),
                (left - 8, top + row as i32 * ch + ch / 2),
                tick.clone().pos(Pos::new(HPos::Right, VPos::Center)),
            ))
            .map_err(render_error)?;
        }
        let grid_height = values.num_rows() as i32 * ch;
        root.draw(&Text::new(
            "Architecture",
            (22, top + grid_height / 2),
            TextStyle::from(title.transform(FontTransform::Rotate270))
                .pos(Pos::new(HPos::Center, VPos::Center)),
        ))
        .map_err(render_error)
    }
}

fn dashed_box<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    (x0, y0): (i32, i32),
    (x1, y1): (i32, i32),
) -> Result<()> {
    let style = BLACK.mix(0.6).stroke_width(1);
    let edges = [
        ((x0, y0), (x1, y0)),
        ((x1, y0), (x1, y1)),
        ((x1, y1), (x0, y1)),
        ((x0, y1), (x0, y0)),
    ];
    for ((ax, ay), (bx, by)) in edges {
        let length = (bx - ax).abs().max((by - ay).abs());
        let (dx, dy) = ((bx - ax).signum(), (by - ay).signum());
        let mut start = 0;
        while start < length {
            let end = (start + DASH).min(length);
            root.draw(&PathElement::new(
                vec![(ax + dx * start, ay + dy * start), (ax + dx * end, ay + dy * end)],
                style,
            ))
            .map_err(render_error)?;
            start = end + GAP;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blues_endpoints() {
        assert_eq!(blues(0.0), RGBColor(247, 251, 255));
        assert_eq!(blues(1.0), RGBColor(8, 48, 107));
        assert_eq!(blues(0.25), RGBColor(198, 219, 239));
        assert_eq!(blues(0.625), RGBColor(66, 146, 198));
    }

    #[test]
    fn test_blues_darkens_monotonically() {
        let mut previous = blues(RAMP_LOW);
        for step in 1..=10 {
            let t = (RAMP_HIGH - RAMP_LOW).mul_add(f64::from(step) / 10.0, RAMP_LOW);
            let color = blues(t);
            assert!(color.0 <= previous.0 && color.1 <= previous.1);
            previous = color;
        }
    }

    #[test]
    fn test_column_intensity() {
        assert!((column_intensity(1.0, 1.0, 3.0) - 1.0).abs() < 1e-12);
        assert!(column_intensity(3.0, 1.0, 3.0).abs() < 1e-12);
        assert!((column_intensity(2.0, 1.0, 3.0) - 0.5).abs() < 1e-12);
        assert!(column_intensity(1.0, 1.0, 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cell_fill_minimum_is_darkest() {
        let (lo, hi) = (Some(1.0), Some(3.0));
        assert_eq!(cell_fill(Cell::Value(1.0), lo, hi), blues(RAMP_HIGH));
        assert_eq!(cell_fill(Cell::Value(3.0), lo, hi), blues(RAMP_LOW));
        assert_eq!(cell_fill(Cell::Value(2.0), lo, hi), blues(0.4));
        assert_eq!(cell_fill(Cell::NoData, lo, hi), WHITE);
        // single-valued column sits at the light end
        assert_eq!(cell_fill(Cell::Value(1.0), Some(1.0), Some(1.0)), blues(RAMP_LOW));
    }

    #[test]
    fn test_percent_label() {
        assert_eq!(percent_label(Cell::Value(1.0)), "100.00%");
        assert_eq!(percent_label(Cell::Value(1.23456)), "123.46%");
        assert_eq!(percent_label(Cell::NoData), "n/a");
    }
}
