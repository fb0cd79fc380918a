//! Layout of the clustered heatmap.
//!
//! ```text
//!            +----------------------+
//!            |  column dendrogram   |  [legend]
//!            |  subtype colour bar  |
//! +---------++----------------------+
//! |  row    ||        cells         | row labels
//! |  dendro ||                      |
//! +---------++----------------------+
//!              sample labels
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;

use crate::heatmap::cluster::Dendrogram;
use crate::heatmap::subtype::{Rgb, Subtype, UNMAPPED_COLOR};
use crate::plot::{Bitmap, LABEL_FAMILY, Labels, extent, fill_rect, px, rgb};

const MARGIN: usize = 10;
const DENDRO_SPAN: usize = 80;
const BAR_HEIGHT: usize = 12;
const GAP: usize = 4;
const SWATCH: usize = 12;
const GRADIENT_STEPS: usize = 64;
const LEGEND_WIDTH: usize = SWATCH + GAP + 90;
const LEGEND_HEIGHT: usize = (SWATCH + GAP) * (Subtype::ALL.len() + 1) + GRADIENT_STEPS * 2 + 24;

// Labels are only drawn when a cell has room for the text.
const LABEL_MIN_CELL: usize = 10;
const SAMPLE_LABEL_BAND: usize = 110;
const ROW_LABEL_BAND: usize = 140;
const LABEL_SIZE: i32 = 10;

const INK: Rgb = [0x33, 0x33, 0x33];
const MISSING: Rgb = [0x80, 0x80, 0x80];
const LOW: Rgb = [49, 54, 149];
const MID: Rgb = [0xFF, 0xFF, 0xFF];
const HIGH: Rgb = [165, 0, 38];

/// Everything the renderer needs, already in display order.
pub struct HeatmapPlot<'a> {
    /// `cells[r][c]` for display row `r` and display column `c`.
    pub cells: &'a [Vec<Option<f64>>],
    pub row_tree: &'a Dendrogram,
    pub col_tree: &'a Dendrogram,
    /// Original row index per display row.
    pub row_order: &'a [usize],
    /// Original column index per display column.
    pub col_order: &'a [usize],
    /// Label per display row.
    pub row_labels: &'a [String],
    /// Sample id per display column.
    pub col_labels: &'a [String],
    /// Subtype colour per display column.
    pub col_colors: &'a [Rgb],
    pub cell_width: usize,
    pub cell_height: usize,
    pub font: Option<&'a Path>,
}

pub fn color_scale(value: f64, lo: f64, hi: f64) -> Rgb {
    let t = if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    };
    if t < 0.5 {
        lerp(LOW, MID, t * 2.0)
    } else {
        lerp(MID, HIGH, (t - 0.5) * 2.0)
    }
}

fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub grid_x: usize,
    pub grid_y: usize,
    pub bar_y: usize,
    pub grid_w: usize,
    pub grid_h: usize,
    pub legend_x: usize,
    pub width: usize,
    pub height: usize,
}

impl Layout {
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        cell: (usize, usize),
        row_band: usize,
        sample_band: usize,
    ) -> Result<Self> {
        let (cw, ch) = cell;
        let too_large = || {
            format!(
                "heatmap of {} rows x {} samples at {}x{} px cells is too large",
                n_rows, n_cols, cw, ch
            )
        };
        let grid_x = MARGIN + DENDRO_SPAN + GAP;
        let bar_y = MARGIN + DENDRO_SPAN + GAP;
        let grid_y = bar_y + BAR_HEIGHT + GAP;
        let grid_w = n_cols.checked_mul(cw).with_context(too_large)?;
        let grid_h = n_rows.checked_mul(ch).with_context(too_large)?;
        let legend_x = extent(&[grid_x, grid_w, row_band, GAP * 2]).with_context(too_large)?;
        let width = extent(&[legend_x, LEGEND_WIDTH, MARGIN]).with_context(too_large)?;
        let bottom = extent(&[grid_y, grid_h, sample_band]).with_context(too_large)?;
        let height = extent(&[bottom.max(MARGIN + LEGEND_HEIGHT), MARGIN]).with_context(too_large)?;
        Ok(Self {
            grid_x,
            grid_y,
            bar_y,
            grid_w,
            grid_h,
            legend_x,
            width,
            height,
        })
    }
}

pub fn render(plot: &HeatmapPlot<'_>) -> Result<Bitmap> {
    let n_rows = plot.row_order.len();
    let n_cols = plot.col_order.len();
    let cw = plot.cell_width.max(1);
    let ch = plot.cell_height.max(1);

    let mut labels = Labels::new(plot.font);
    let show_samples = labels.enabled() && cw >= LABEL_MIN_CELL;
    let show_rows = labels.enabled() && ch >= LABEL_MIN_CELL;
    let layout = Layout::new(
        n_rows,
        n_cols,
        (cw, ch),
        if show_rows { ROW_LABEL_BAND } else { 0 },
        if show_samples { SAMPLE_LABEL_BAND } else { 0 },
    )?;

    let present: Vec<f64> = plot.cells.iter().flatten().flatten().copied().collect();
    let (lo, hi) = crate::math::stats::min_max(&present).unwrap_or((0.0, 0.0));

    let mut bitmap = Bitmap::new(layout.width, layout.height)?;
    {
        let root = bitmap.drawing_area()?;
        root.fill(&WHITE)?;

        for (r, row) in plot.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let color = match cell {
                    Some(v) if v.is_finite() => color_scale(*v, lo, hi),
                    _ => MISSING,
                };
                let at = (layout.grid_x + c * cw, layout.grid_y + r * ch);
                fill_rect(&root, at, (cw, ch), rgb(color))?;
            }
        }

        for (c, color) in plot.col_colors.iter().enumerate() {
            let at = (layout.grid_x + c * cw, layout.bar_y);
            fill_rect(&root, at, (cw, BAR_HEIGHT), rgb(*color))?;
        }

        draw_dendrogram(
            &root,
            plot.col_tree,
            plot.col_order,
            cw,
            Orientation::Top {
                x0: layout.grid_x,
                base: MARGIN + DENDRO_SPAN,
            },
        )?;
        draw_dendrogram(
            &root,
            plot.row_tree,
            plot.row_order,
            ch,
            Orientation::Left {
                y0: layout.grid_y,
                base: MARGIN + DENDRO_SPAN,
            },
        )?;

        let label_style = (LABEL_FAMILY, LABEL_SIZE).into_font().color(&BLACK);
        if show_samples {
            let rotated = (LABEL_FAMILY, LABEL_SIZE)
                .into_font()
                .transform(FontTransform::Rotate90)
                .color(&BLACK);
            let y = layout.grid_y + layout.grid_h + GAP;
            for (c, name) in plot.col_labels.iter().enumerate() {
                let x = layout.grid_x + c * cw + cw / 2 + LABEL_SIZE as usize / 2;
                labels.draw(&root, name, (px(x), px(y)), &rotated);
            }
        }
        if show_rows {
            let x = layout.grid_x + layout.grid_w + GAP;
            for (r, name) in plot.row_labels.iter().enumerate() {
                let y = layout.grid_y + r * ch + ch.saturating_sub(LABEL_SIZE as usize) / 2;
                labels.draw(&root, name, (px(x), px(y)), &label_style);
            }
        }

        draw_legend(&root, &mut labels, &label_style, layout.legend_x, (lo, hi))?;
        root.present()?;
    }
    Ok(bitmap)
}

fn draw_legend(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    labels: &mut Labels,
    style: &TextStyle<'_>,
    x: usize,
    (lo, hi): (f64, f64),
) -> Result<()> {
    let text_x = px(x + SWATCH + GAP);
    let mut y = MARGIN;
    for subtype in Subtype::ALL {
        fill_rect(root, (x, y), (SWATCH, SWATCH), rgb(subtype.color()))?;
        labels.draw(root, subtype.label(), (text_x, px(y + 1)), style);
        y += SWATCH + GAP;
    }
    fill_rect(root, (x, y), (SWATCH, SWATCH), rgb(UNMAPPED_COLOR))?;
    labels.draw(root, "no subtype", (text_x, px(y + 1)), style);
    y += SWATCH + GAP;

    // High values on top.
    labels.draw(root, &format!("{:.2}", hi), (text_x, px(y)), style);
    for step in 0..GRADIENT_STEPS {
        let t = 1.0 - step as f64 / (GRADIENT_STEPS - 1) as f64;
        fill_rect(root, (x, y + step * 2), (SWATCH, 2), rgb(color_scale(t, 0.0, 1.0)))?;
    }
    let bottom = y + GRADIENT_STEPS * 2;
    labels.draw(root, &format!("{:.2}", lo), (text_x, px(bottom - LABEL_SIZE as usize)), style);
    Ok(())
}

#[derive(Clone, Copy)]
enum Orientation {
    Top { x0: usize, base: usize },
    Left { y0: usize, base: usize },
}

fn draw_dendrogram(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    tree: &Dendrogram,
    order: &[usize],
    step: usize,
    orient: Orientation,
) -> Result<()> {
    let n = tree.n_leaves;
    if n < 2 || order.len() != n {
        return Ok(());
    }
    let top = tree.merges.last().map_or(0.0, |m| m.height);
    let ink = rgb(INK);

    // Position along the leaf axis, in pixels.
    let mut pos = vec![0usize; n + tree.merges.len()];
    for (display, &leaf) in order.iter().enumerate() {
        pos[leaf] = display * step + step / 2;
    }
    // Distance from the base, in pixels.
    let depth = |h: f64| -> usize {
        if top > 0.0 && h.is_finite() {
            ((h / top) * (DENDRO_SPAN - 1) as f64).round() as usize
        } else if top > 0.0 {
            DENDRO_SPAN - 1
        } else {
            0
        }
    };

    for (i, m) in tree.merges.iter().enumerate() {
        let node = n + i;
        pos[node] = (pos[m.left] + pos[m.right]) / 2;
        let d_node = depth(m.height);
        let d_left = depth(tree.height(m.left));
        let d_right = depth(tree.height(m.right));
        let points: Vec<(i32, i32)> = match orient {
            Orientation::Top { x0, base } => vec![
                (px(x0 + pos[m.left]), px(base - d_left)),
                (px(x0 + pos[m.left]), px(base - d_node)),
                (px(x0 + pos[m.right]), px(base - d_node)),
                (px(x0 + pos[m.right]), px(base - d_right)),
            ],
            Orientation::Left { y0, base } => vec![
                (px(base - d_left), px(y0 + pos[m.left])),
                (px(base - d_node), px(y0 + pos[m.left])),
                (px(base - d_node), px(y0 + pos[m.right])),
                (px(base - d_right), px(y0 + pos[m.right])),
            ],
        };
        root.draw(&PathElement::new(points, &ink))?;
    }
    Ok(())
}
