//! Logo and summary figures.
//!
//! Each symbol is drawn as a block of its base color, stacked bottom to top in
//! ascending order of relative entropy term, and labelled with its letter when
//! the block is tall enough.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::{FigureStyle, OutputFormat};
use crate::error::{Error, Result};
use crate::trellis::GridCoord;
use super::{focal_slot, n_slots, LogoPanel};

const BACKGROUND: RGBColor = RGBColor(255, 255, 255);
const TEXT: RGBColor = RGBColor(0, 0, 0);
const AXIS: RGBColor = RGBColor(100, 100, 100);
const BAR: RGBColor = RGBColor(31, 119, 180);

/// Smallest letter worth drawing, in pixels.
const MIN_LETTER_PX: f64 = 5.0;

pub fn base_color(base: char) -> RGBColor {
    match base {
        'A' => RGBColor(0, 128, 0),
        'C' => RGBColor(0, 0, 255),
        'G' => RGBColor(255, 165, 0),
        'T' => RGBColor(255, 0, 0),
        _ => RGBColor(128, 128, 128),
    }
}

/// Logo panels of one analysis order arranged in a grid.
#[derive(Debug, Clone)]
pub struct LogoFigure {
    pub nrows: usize,
    pub ncols: usize,
    pub n_positions: usize,
    pub ylim: f64,
    pub panels: Vec<(GridCoord, LogoPanel)>,
}

fn plot_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

fn output_format(path: &Path) -> Result<OutputFormat> {
    let ext = path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("svg");
    OutputFormat::from_extension(ext)
        .ok_or_else(|| Error::Plot(format!("unsupported output format: {}", ext)))
}

/// Write a logo figure; the format follows the file extension.
pub fn draw_logo_figure(path: &Path, figure: &LogoFigure, style: &FigureStyle) -> Result<()> {
    match output_format(path)? {
        OutputFormat::Svg => {
            let root = SVGBackend::new(path, (style.width, style.height)).into_drawing_area();
            draw_logo_impl(&root, figure, style).map_err(plot_error)?;
            root.present().map_err(plot_error)
        },
        OutputFormat::Png => draw_logo_png(path, figure, style),
    }
}

#[cfg(feature = "png")]
fn draw_logo_png(path: &Path, figure: &LogoFigure, style: &FigureStyle) -> Result<()> {
    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    draw_logo_impl(&root, figure, style).map_err(plot_error)?;
    root.present().map_err(plot_error)
}

#[cfg(not(feature = "png"))]
fn draw_logo_png(_path: &Path, _figure: &LogoFigure, _style: &FigureStyle) -> Result<()> {
    Err(Error::Plot("PNG output requires the png feature".to_owned()))
}

/// Write the bar chart of maximum relative entropy per order.
pub fn draw_summary(path: &Path, max_re: &[f64], style: &FigureStyle) -> Result<()> {
    match output_format(path)? {
        OutputFormat::Svg => {
            let root = SVGBackend::new(path, (style.width, style.height)).into_drawing_area();
            draw_summary_impl(&root, max_re, style).map_err(plot_error)?;
            root.present().map_err(plot_error)
        },
        OutputFormat::Png => draw_summary_png(path, max_re, style),
    }
}

#[cfg(feature = "png")]
fn draw_summary_png(path: &Path, max_re: &[f64], style: &FigureStyle) -> Result<()> {
    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    draw_summary_impl(&root, max_re, style).map_err(plot_error)?;
    root.present().map_err(plot_error)
}

#[cfg(not(feature = "png"))]
fn draw_summary_png(_path: &Path, _max_re: &[f64], _style: &FigureStyle) -> Result<()> {
    Err(Error::Plot("PNG output requires the png feature".to_owned()))
}

fn draw_logo_impl<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &LogoFigure,
    style: &FigureStyle,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&BACKGROUND)?;
    let areas = root.split_evenly((figure.nrows, figure.ncols));
    for (coord, panel) in figure.panels.iter() {
        let (r, c) = *coord;
        if let Some(area) = areas.get(r * figure.ncols + c) {
            let labels = AxisDescriptions { x: r + 1 == figure.nrows, y: c == 0 };
            draw_panel(area, panel, figure.n_positions, figure.ylim, style, labels)?;
        }
    }
    Ok(())
}

struct AxisDescriptions {
    x: bool,
    y: bool,
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &LogoPanel,
    n_positions: usize,
    ylim: f64,
    style: &FigureStyle,
    labels: AxisDescriptions,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let n = n_slots(n_positions) as i32;
    let mid = focal_slot(n_positions) as i32;

    let x_area = style.xtick_fontsize * 2 + if labels.x { style.xlabel_fontsize * 2 } else { 0 };
    let y_area = style.ytick_fontsize * 4 + if labels.y { style.ylabel_fontsize * 2 } else { 0 };
    let mut chart = ChartBuilder::on(area)
        .margin(5)
        .x_label_area_size(x_area)
        .y_label_area_size(y_area)
        .build_cartesian_2d((0 .. n).into_segmented(), 0.0 .. ylim)?;

    let offset_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => format!("{}", i - mid),
        _ => String::new(),
    };
    chart.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(n as usize)
        .x_label_formatter(&offset_label)
        .x_desc(if labels.x { "Position" } else { "" })
        .y_desc(if labels.y { "RE" } else { "" })
        .x_label_style(("sans-serif", style.xtick_fontsize).into_font().color(&TEXT))
        .y_label_style(("sans-serif", style.ytick_fontsize).into_font().color(&TEXT))
        .axis_style(&AXIS)
        .draw()?;

    let (slot_px, plot_px) = {
        let (w, h) = chart.plotting_area().dim_in_pixel();
        (w as f64 / n as f64, h as f64)
    };

    let mut blocks = Vec::new();
    let mut letters = Vec::new();
    for &slot in panel.indices.iter() {
        let x = slot as i32;
        let mut y0 = 0.0;
        for row in 0 .. panel.heights.nrows() {
            let h = panel.heights[[row, slot]];
            if h.is_nan() || h <= 0.0 {
                continue;
            }
            let base = panel.characters.get(slot)
                .and_then(|c| c.get(row))
                .cloned()
                .unwrap_or(' ');
            let color = base_color(base);
            let mut block = Rectangle::new(
                [(SegmentValue::Exact(x), y0), (SegmentValue::Exact(x + 1), y0 + h)],
                color.filled(),
            );
            block.set_margin(0, 0, 2, 2);
            blocks.push(block);

            let letter_px = (h / ylim * plot_px * 0.9).min(slot_px * 0.9);
            if letter_px >= MIN_LETTER_PX {
                let font = ("sans-serif", letter_px).into_font()
                    .color(&BACKGROUND)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                letters.push(Text::new(base.to_string(), (SegmentValue::CenterOf(x), y0 + h / 2.0), font));
            }
            y0 += h;
        }
    }
    chart.draw_series(blocks)?;
    chart.draw_series(letters)?;
    Ok(())
}

fn draw_summary_impl<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    max_re: &[f64],
    style: &FigureStyle,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&BACKGROUND)?;
    let n = max_re.len() as i32;
    let ylim = super::est_ylim(max_re);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .x_label_area_size(style.xtick_fontsize * 2 + style.xlabel_fontsize * 2)
        .y_label_area_size(style.ytick_fontsize * 4 + style.ylabel_fontsize * 2)
        .build_cartesian_2d((1 .. n + 1).into_segmented(), 0.0 .. ylim)?;

    let order_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => format!("{}", i),
        _ => String::new(),
    };
    chart.configure_mesh()
        .disable_x_mesh()
        .x_labels(max_re.len())
        .x_label_formatter(&order_label)
        .x_desc("Effect Order")
        .y_desc("RE max")
        .x_label_style(("sans-serif", style.xtick_fontsize).into_font().color(&TEXT))
        .y_label_style(("sans-serif", style.ytick_fontsize).into_font().color(&TEXT))
        .axis_style(&AXIS)
        .draw()?;

    chart.draw_series(max_re.iter().enumerate().map(|(i, &re)| {
        let x = i as i32 + 1;
        let mut bar = Rectangle::new([(SegmentValue::Exact(x), 0.0), (SegmentValue::Exact(x + 1), re)], BAR.filled());
        bar.set_margin(0, 0, 10, 10);
        bar
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn panel() -> LogoPanel {
        let mut heights = Array2::zeros((4, 5));
        heights[[0, 0]] = 0.01;
        heights[[3, 0]] = 0.02;
        heights[[2, 4]] = 0.005;
        LogoPanel {
            indices: vec![0, 4],
            characters: vec![vec!['A', 'C', 'G', 'T']; 5],
            rets: heights.clone(),
            heights: heights,
        }
    }

    #[test]
    fn test_base_colors_are_distinct() {
        let colors: Vec<RGBColor> = "ACGT".chars().map(base_color).collect();
        for i in 0 .. 4 {
            for j in i + 1 .. 4 {
                assert_ne!(colors[i], colors[j]);
            }
        }
    }

    #[test]
    fn test_draw_logo_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let figure = LogoFigure {
            nrows: 1,
            ncols: 2,
            n_positions: 4,
            ylim: 0.035,
            panels: vec![((0, 0), panel()), ((0, 1), panel())],
        };
        let path = dir.path().join("2.svg");
        draw_logo_figure(&path, &figure, &FigureStyle::default()).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));

        let path = dir.path().join("summary.svg");
        draw_summary(&path, &[0.03, 0.01, 0.005, 0.001], &FigureStyle::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.pdf");
        assert!(draw_summary(&path, &[0.1], &FigureStyle::default()).is_err());
        assert!(!path.exists());
    }
}
