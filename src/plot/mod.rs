//! Raster plumbing shared by the PNG plots.
//!
//! Plots are drawn with plotters into an in-memory RGB buffer, which is then
//! encoded with `png` through the atomic writer. Text needs a TrueType font
//! registered once per process; without one, plots are drawn unlabelled.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use tracing::{debug, warn};

use crate::io::write_atomic;

pub const LABEL_FAMILY: &str = "sans-serif";

// Pixel budget for one image, about 600 MB of RGB.
const MAX_PIXELS: usize = 200_000_000;

const FONT_CANDIDATES: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static LABEL_FONT: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Sums pixel extents, failing instead of wrapping.
pub fn extent(parts: &[usize]) -> Result<usize> {
    parts
        .iter()
        .try_fold(0usize, |acc, &p| acc.checked_add(p))
        .ok_or_else(|| anyhow!("plot dimensions overflow"))
}

pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let Some(area) = width
            .checked_mul(height)
            .filter(|&a| a <= MAX_PIXELS && width > 0 && height > 0)
        else {
            return Err(anyhow!(
                "plot of {}x{} px is too large; reduce cell size or use --top-variable",
                width,
                height
            ));
        };
        Ok(Self {
            width,
            height,
            pixels: vec![0xFF; area * 3],
        })
    }

    /// Drawing area over the whole buffer. `present` must be called on it
    /// before the pixels are read back.
    pub fn drawing_area(&mut self) -> Result<DrawingArea<BitMapBackend<'_>, Shift>> {
        let width = u32::try_from(self.width).context("image width overflow")?;
        let height = u32::try_from(self.height).context("image height overflow")?;
        Ok(BitMapBackend::with_buffer(&mut self.pixels, (width, height)).into_drawing_area())
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    pub fn write_png(&self, path: &Path) -> Result<()> {
        let width = u32::try_from(self.width).context("image width overflow")?;
        let height = u32::try_from(self.height).context("image height overflow")?;
        write_atomic(path, |w| {
            let mut encoder = png::Encoder::new(&mut *w, width, height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .with_context(|| format!("failed to write PNG header {}", path.display()))?;
            writer
                .write_image_data(&self.pixels)
                .with_context(|| format!("failed to write PNG data {}", path.display()))?;
            writer.finish()?;
            Ok(())
        })
    }
}

/// Registers the label font on first use. `explicit` wins over the system
/// candidates; later calls reuse whatever the first one found.
pub fn label_font(explicit: Option<&Path>) -> Option<&'static Path> {
    LABEL_FONT
        .get_or_init(|| register_label_font(explicit))
        .as_deref()
}

fn register_label_font(explicit: Option<&Path>) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(p) => vec![p.to_path_buf()],
        None => FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };
    for path in candidates {
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                if explicit.is_some() {
                    warn!(font = %path.display(), error = %e, "label_font_unreadable");
                }
                continue;
            }
        };
        // plotters keeps registered fonts for the life of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        if register_font(LABEL_FAMILY, FontStyle::Normal, bytes).is_ok() {
            debug!(font = %path.display(), "label_font_loaded");
            return Some(path);
        }
        warn!(font = %path.display(), "label_font_invalid");
    }
    warn!("no label font available; plots are drawn without text");
    None
}

/// Text drawing that degrades to no text after the first failure.
pub struct Labels {
    enabled: bool,
}

impl Labels {
    pub fn new(font: Option<&Path>) -> Self {
        Self {
            enabled: label_font(font).is_some(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn draw(
        &mut self,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        text: &str,
        pos: (i32, i32),
        style: &TextStyle<'_>,
    ) {
        if !self.enabled {
            return;
        }
        if let Err(e) = area.draw(&Text::new(text, pos, style.clone())) {
            warn!(error = %e, "label_drawing_disabled");
            self.enabled = false;
        }
    }
}

pub fn px(v: usize) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

pub fn rgb(c: [u8; 3]) -> RGBColor {
    RGBColor(c[0], c[1], c[2])
}

/// Filled rectangle covering `w` x `h` pixels from `(x, y)`.
pub fn fill_rect(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    (x, y): (usize, usize),
    (w, h): (usize, usize),
    color: RGBColor,
) -> Result<()> {
    if w == 0 || h == 0 {
        return Ok(());
    }
    let x1 = x.saturating_add(w - 1);
    let y1 = y.saturating_add(h - 1);
    area.draw(&Rectangle::new(
        [(px(x), px(y)), (px(x1), px(y1))],
        color.filled(),
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangles_land_on_pixels() {
        let mut bitmap = Bitmap::new(6, 4).unwrap();
        {
            let area = bitmap.drawing_area().unwrap();
            fill_rect(&area, (2, 1), (3, 2), RGBColor(1, 2, 3)).unwrap();
            area.present().unwrap();
        }
        assert_eq!(bitmap.pixel(2, 1), Some([1, 2, 3]));
        assert_eq!(bitmap.pixel(4, 2), Some([1, 2, 3]));
        assert_eq!(bitmap.pixel(5, 2), Some([0xFF, 0xFF, 0xFF]));
        assert_eq!(bitmap.pixel(2, 3), Some([0xFF, 0xFF, 0xFF]));
        assert_eq!(bitmap.pixel(6, 0), None);
    }

    #[test]
    fn oversized_plots_are_refused() {
        assert!(Bitmap::new(usize::MAX, 2).is_err());
        assert!(Bitmap::new(20_000, 20_000).is_err());
        assert!(extent(&[usize::MAX, 1]).is_err());
        assert_eq!(extent(&[1, 2, 3]).unwrap(), 6);
    }
}
