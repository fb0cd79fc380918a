//! Per-sample distribution of the positive values of a normalized table,
//! every sample drawn as a translucent density histogram on shared axes.

use std::path::PathBuf;

use anyhow::{Result, bail};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{info, warn};

use crate::dataset::SampleKey;
use crate::dataset::sample_key::{BARCODE_PATTERN, BARCODE_PREFIX};
use crate::heatmap::{HeatmapMatrix, load_matrix};
use crate::plot::{Bitmap, LABEL_FAMILY, Labels, px};

const WIDTH: usize = 800;
const HEIGHT: usize = 600;
const LEFT: usize = 80;
const RIGHT: usize = 30;
const TOP: usize = 50;
const BOTTOM: usize = 60;
const TICK: usize = 5;
const Y_TICKS: usize = 4;

const BAR: RGBColor = RGBColor(0x2B, 0x54, 0x7E);
const BAR_ALPHA: f64 = 0.2;
const AXIS: RGBColor = RGBColor(0x33, 0x33, 0x33);

#[derive(Debug, Clone)]
pub struct HistogramConfig {
    pub input: PathBuf,
    /// Plot title; also names the default output file.
    pub title: String,
    pub output: Option<PathBuf>,
    pub bins: usize,
    /// Upper end of the value axis; the lower end is zero.
    pub x_max: f64,
    pub sample_regex: Option<String>,
    pub sample_prefix: Option<String>,
    pub font: Option<PathBuf>,
}

impl HistogramConfig {
    pub fn new(input: PathBuf, title: impl Into<String>) -> Self {
        Self {
            input,
            title: title.into(),
            output: None,
            bins: 100,
            x_max: 3.0,
            sample_regex: None,
            sample_prefix: None,
            font: None,
        }
    }

    pub fn sample_key(&self) -> Result<SampleKey> {
        SampleKey::new(
            self.sample_regex.as_deref().unwrap_or(BARCODE_PATTERN),
            self.sample_prefix.as_deref().unwrap_or(BARCODE_PREFIX),
            None,
        )
    }

    /// `--output`, else the title with whitespace removed plus `.png`.
    pub fn output_path(&self) -> Result<PathBuf> {
        if let Some(p) = &self.output {
            return Ok(p.clone());
        }
        let stem: String = self.title.split_whitespace().collect();
        if stem.is_empty() {
            bail!("histogram needs --output when the title is blank");
        }
        Ok(PathBuf::from(format!("{}.png", stem)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleHistogram {
    pub sample: String,
    /// Density per bin; integrates to one over the plotted range.
    pub density: Vec<f64>,
    /// Positive values inside the range.
    pub counted: usize,
    /// Positive values above the range.
    pub clipped: usize,
}

#[derive(Debug, Clone)]
pub struct HistogramSummary {
    pub output: PathBuf,
    pub samples: usize,
    pub values: usize,
    pub clipped: usize,
    pub empty_samples: usize,
    pub width: usize,
    pub height: usize,
}

/// Bins the positive values of every sample column over `(0, x_max]`.
pub fn sample_histograms(matrix: &HeatmapMatrix, bins: usize, x_max: f64) -> Vec<SampleHistogram> {
    let width = x_max / bins as f64;
    matrix
        .samples
        .iter()
        .enumerate()
        .map(|(c, sample)| {
            let mut counts = vec![0usize; bins];
            let mut clipped = 0usize;
            for v in matrix.values.iter().filter_map(|row| row[c]) {
                if v <= 0.0 {
                    continue;
                }
                if v > x_max {
                    clipped += 1;
                    continue;
                }
                let bin = ((v / width) as usize).min(bins - 1);
                counts[bin] += 1;
            }
            let counted: usize = counts.iter().sum();
            let density = counts
                .iter()
                .map(|&k| {
                    if counted == 0 {
                        0.0
                    } else {
                        k as f64 / (counted as f64 * width)
                    }
                })
                .collect();
            SampleHistogram {
                sample: sample.clone(),
                density,
                counted,
                clipped,
            }
        })
        .collect()
}

pub fn run_histogram(cfg: &HistogramConfig) -> Result<HistogramSummary> {
    if !cfg.input.is_file() {
        bail!("histogram input not found: {}", cfg.input.display());
    }
    if cfg.bins == 0 {
        bail!("--bins must be positive");
    }
    if !(cfg.x_max.is_finite() && cfg.x_max > 0.0) {
        bail!("--x-max must be a positive number, got {}", cfg.x_max);
    }
    let output = cfg.output_path()?;
    let key = cfg.sample_key()?;
    let matrix = load_matrix(&cfg.input, &key)?;
    let hists = sample_histograms(&matrix, cfg.bins, cfg.x_max);

    let empty_samples = hists.iter().filter(|h| h.counted == 0).count();
    if empty_samples > 0 {
        warn!(
            samples = empty_samples,
            "samples_without_positive_values_in_range"
        );
    }
    let values = hists.iter().map(|h| h.counted).sum();
    let clipped = hists.iter().map(|h| h.clipped).sum();

    let bitmap = render(&hists, cfg)?;
    bitmap.write_png(&output)?;

    info!(
        output = %output.display(),
        samples = hists.len(),
        values,
        clipped,
        "histogram_written"
    );
    Ok(HistogramSummary {
        output,
        samples: hists.len(),
        values,
        clipped,
        empty_samples,
        width: bitmap.width,
        height: bitmap.height,
    })
}

struct Frame {
    x_max: f64,
    y_max: f64,
}

impl Frame {
    fn x(&self, v: f64) -> i32 {
        let w = (WIDTH - LEFT - RIGHT) as f64;
        px(LEFT) + (v / self.x_max * w).round() as i32
    }

    fn y(&self, v: f64) -> i32 {
        let h = (HEIGHT - TOP - BOTTOM) as f64;
        px(HEIGHT - BOTTOM) - (v / self.y_max * h).round() as i32
    }
}

fn render(hists: &[SampleHistogram], cfg: &HistogramConfig) -> Result<Bitmap> {
    let peak = hists
        .iter()
        .flat_map(|h| h.density.iter().copied())
        .fold(0.0f64, f64::max);
    let frame = Frame {
        x_max: cfg.x_max,
        y_max: if peak > 0.0 { peak * 1.05 } else { 1.0 },
    };
    let bin_width = cfg.x_max / cfg.bins as f64;

    let mut labels = Labels::new(cfg.font.as_deref());
    let mut bitmap = Bitmap::new(WIDTH, HEIGHT)?;
    {
        let root = bitmap.drawing_area()?;
        root.fill(&WHITE)?;

        let bar = BAR.mix(BAR_ALPHA).filled();
        for h in hists {
            for (i, &d) in h.density.iter().enumerate() {
                if d <= 0.0 {
                    continue;
                }
                let x0 = frame.x(i as f64 * bin_width);
                let x1 = (frame.x((i + 1) as f64 * bin_width) - 1).max(x0);
                root.draw(&Rectangle::new([(x0, frame.y(d)), (x1, frame.y(0.0))], bar))?;
            }
        }
        draw_axes(&root, &mut labels, &frame, cfg)?;
        root.present()?;
    }
    Ok(bitmap)
}

fn draw_axes(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    labels: &mut Labels,
    frame: &Frame,
    cfg: &HistogramConfig,
) -> Result<()> {
    let origin = (frame.x(0.0), frame.y(0.0));
    root.draw(&PathElement::new(vec![origin, (frame.x(frame.x_max), origin.1)], &AXIS))?;
    root.draw(&PathElement::new(vec![origin, (origin.0, frame.y(frame.y_max))], &AXIS))?;

    let tick = px(TICK);
    let small = (LABEL_FAMILY, 12).into_font().color(&BLACK);
    let x_label = small.pos(Pos::new(HPos::Center, VPos::Top));
    let x_ticks = (cfg.x_max / 0.5).floor() as usize;
    let x_step = if (2..=10).contains(&x_ticks) {
        0.5
    } else {
        cfg.x_max / 6.0
    };
    let mut v = 0.0;
    while v <= cfg.x_max + 1e-9 {
        let x = frame.x(v);
        root.draw(&PathElement::new(vec![(x, origin.1), (x, origin.1 + tick)], &AXIS))?;
        labels.draw(root, &format!("{}", round_tick(v)), (x, origin.1 + tick + 2), &x_label);
        v += x_step;
    }

    let y_label = small.pos(Pos::new(HPos::Right, VPos::Center));
    for i in 0..=Y_TICKS {
        let d = frame.y_max * i as f64 / Y_TICKS as f64;
        let y = frame.y(d);
        root.draw(&PathElement::new(vec![(origin.0 - tick, y), (origin.0, y)], &AXIS))?;
        labels.draw(root, &format!("{:.2}", d), (origin.0 - tick - 2, y), &y_label);
    }

    let title = (LABEL_FAMILY, 18)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    labels.draw(root, &cfg.title, (px(WIDTH / 2), px(TOP / 4)), &title);
    let axis_title = (LABEL_FAMILY, 16)
        .into_font()
        .transform(FontTransform::Rotate270)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    let mid_y = px(TOP + (HEIGHT - TOP - BOTTOM) / 2);
    labels.draw(root, "Frequency", (px(LEFT / 4), mid_y), &axis_title);
    Ok(())
}

fn round_tick(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
