//! The `chart` userdata and PNG rendering.
//!
//! Scripts describe a chart through the `chart` global; nothing is drawn
//! until the execution finishes. A spec with at least one series counts as a
//! populated surface and is rendered to a fixed-size PNG; a spec nobody
//! touched produces no image. The spec is owned by one execution and dropped
//! with it.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{Table, UserData, UserDataMethods, Value as LuaValue};
use plotters::prelude::*;

/// Fixed raster width in pixels.
pub const CHART_WIDTH: u32 = 960;

/// Fixed raster height in pixels.
pub const CHART_HEIGHT: u32 = 720;

/// Default histogram bin count.
const DEFAULT_BINS: usize = 10;

#[derive(Debug, Clone)]
enum Series {
    Bar { labels: Vec<String>, values: Vec<f64> },
    Line { points: Vec<(f64, f64)> },
    Scatter { points: Vec<(f64, f64)> },
}

/// Accumulated chart description for one execution.
#[derive(Debug, Clone, Default)]
pub struct ChartSpec {
    title: Option<String>,
    x_label: Option<String>,
    y_label: Option<String>,
    series: Vec<Series>,
}

impl ChartSpec {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_x_label(&mut self, label: impl Into<String>) {
        self.x_label = Some(label.into());
    }

    pub fn set_y_label(&mut self, label: impl Into<String>) {
        self.y_label = Some(label.into());
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn x_label(&self) -> Option<&str> {
        self.x_label.as_deref()
    }

    pub fn y_label(&self) -> Option<&str> {
        self.y_label.as_deref()
    }

    /// Whether any series has been added - the "populated axis" check.
    pub fn has_series(&self) -> bool {
        !self.series.is_empty()
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn add_bar(&mut self, labels: Vec<String>, values: Vec<f64>) -> Result<(), String> {
        if labels.len() != values.len() {
            return Err(format!(
                "bar series has {} labels but {} values",
                labels.len(),
                values.len()
            ));
        }
        if values.is_empty() {
            return Err("bar series needs at least one value".to_string());
        }
        self.series.push(Series::Bar { labels, values });
        Ok(())
    }

    pub fn add_line(&mut self, xs: Vec<f64>, ys: Vec<f64>) -> Result<(), String> {
        self.series.push(Series::Line {
            points: paired(xs, ys)?,
        });
        Ok(())
    }

    pub fn add_scatter(&mut self, xs: Vec<f64>, ys: Vec<f64>) -> Result<(), String> {
        self.series.push(Series::Scatter {
            points: paired(xs, ys)?,
        });
        Ok(())
    }

    /// Bin the values and add the histogram as a bar series.
    pub fn add_histogram(&mut self, values: Vec<f64>, bins: usize) -> Result<(), String> {
        if values.is_empty() {
            return Err("histogram needs at least one numeric value".to_string());
        }
        let bins = bins.max(1);
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

        let mut counts = vec![0usize; bins];
        for v in &values {
            let idx = (((v - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let labels = (0..bins)
            .map(|i| {
                let lo = min + width * i as f64;
                format!("{:.4}..{:.4}", lo, lo + width)
            })
            .collect();
        let values = counts.iter().map(|&c| c as f64).collect();
        self.series.push(Series::Bar { labels, values });
        Ok(())
    }

    /// Render the spec to a fixed-size PNG.
    ///
    /// Only called when `has_series()` holds; an empty spec is an error
    /// rather than a blank image.
    pub fn render_png(&self) -> Result<Vec<u8>, String> {
        if !self.has_series() {
            return Err("no series to render".to_string());
        }

        let (x_range, y_range) = self.ranges();
        let mut rgb = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
        {
            let root =
                BitMapBackend::with_buffer(&mut rgb, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
            root.fill(&WHITE).map_err(|e| e.to_string())?;

            let mut chart = ChartBuilder::on(&root)
                .margin(24)
                .x_label_area_size(32)
                .y_label_area_size(48)
                .build_cartesian_2d(x_range, y_range)
                .map_err(|e| e.to_string())?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(0)
                .y_labels(0)
                .draw()
                .map_err(|e| e.to_string())?;

            for (idx, series) in self.series.iter().enumerate() {
                let color = series_color(idx);
                match series {
                    Series::Bar { values, .. } => {
                        chart
                            .draw_series(values.iter().enumerate().map(|(i, &v)| {
                                let x0 = i as f64 + 0.1;
                                let x1 = i as f64 + 0.9;
                                let (top, bottom) = if v >= 0.0 { (v, 0.0) } else { (0.0, v) };
                                Rectangle::new([(x0, bottom), (x1, top)], color.filled())
                            }))
                            .map_err(|e| e.to_string())?;
                    }
                    Series::Line { points } => {
                        chart
                            .draw_series(LineSeries::new(points.iter().cloned(), &color))
                            .map_err(|e| e.to_string())?;
                    }
                    Series::Scatter { points } => {
                        chart
                            .draw_series(
                                points
                                    .iter()
                                    .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
                            )
                            .map_err(|e| e.to_string())?;
                    }
                }
            }

            root.present().map_err(|e| e.to_string())?;
        }

        let img = image::RgbImage::from_raw(CHART_WIDTH, CHART_HEIGHT, rgb)
            .ok_or_else(|| "render buffer size mismatch".to_string())?;
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| e.to_string())?;
        Ok(png)
    }

    /// Union of the coordinate ranges of all series, padded so degenerate
    /// extents still render.
    fn ranges(&self) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
        let mut x = (f64::INFINITY, f64::NEG_INFINITY);
        let mut y = (f64::INFINITY, f64::NEG_INFINITY);

        let mut cover = |bounds: &mut (f64, f64), v: f64| {
            bounds.0 = bounds.0.min(v);
            bounds.1 = bounds.1.max(v);
        };

        for series in &self.series {
            match series {
                Series::Bar { values, .. } => {
                    cover(&mut x, 0.0);
                    cover(&mut x, values.len() as f64);
                    cover(&mut y, 0.0);
                    for &v in values {
                        cover(&mut y, v);
                    }
                }
                Series::Line { points } | Series::Scatter { points } => {
                    for &(px, py) in points {
                        cover(&mut x, px);
                        cover(&mut y, py);
                    }
                }
            }
        }

        (pad_range(x), pad_range(y))
    }
}

fn pad_range((min, max): (f64, f64)) -> std::ops::Range<f64> {
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

fn series_color(idx: usize) -> RGBColor {
    const COLORS: [RGBColor; 5] = [BLUE, RED, GREEN, MAGENTA, CYAN];
    COLORS[idx % COLORS.len()]
}

fn paired(xs: Vec<f64>, ys: Vec<f64>) -> Result<Vec<(f64, f64)>, String> {
    if xs.len() != ys.len() {
        return Err(format!(
            "series has {} x values but {} y values",
            xs.len(),
            ys.len()
        ));
    }
    if xs.is_empty() {
        return Err("series needs at least one point".to_string());
    }
    Ok(xs.into_iter().zip(ys).collect())
}

/// Collect the numeric entries of a Lua sequence, tolerating nil holes
/// (missing values drop out instead of truncating the sequence).
fn numbers_from_table(table: &Table) -> mlua::Result<Vec<f64>> {
    let mut entries: Vec<(i64, f64)> = Vec::new();
    for pair in table.clone().pairs::<LuaValue, LuaValue>() {
        let (key, value) = pair?;
        let idx = match key {
            LuaValue::Integer(i) => i,
            LuaValue::Number(n) if n.fract() == 0.0 => n as i64,
            _ => continue,
        };
        let num = match value {
            LuaValue::Integer(i) => i as f64,
            LuaValue::Number(n) => n,
            _ => continue,
        };
        if num.is_finite() {
            entries.push((idx, num));
        }
    }
    entries.sort_by_key(|&(i, _)| i);
    Ok(entries.into_iter().map(|(_, v)| v).collect())
}

/// Collect the entries of a Lua sequence as display strings.
fn strings_from_table(table: &Table) -> mlua::Result<Vec<String>> {
    let mut entries: Vec<(i64, String)> = Vec::new();
    for pair in table.clone().pairs::<LuaValue, LuaValue>() {
        let (key, value) = pair?;
        let idx = match key {
            LuaValue::Integer(i) => i,
            LuaValue::Number(n) if n.fract() == 0.0 => n as i64,
            _ => continue,
        };
        let text = match value {
            LuaValue::String(s) => s.to_str()?.to_string(),
            LuaValue::Integer(i) => i.to_string(),
            LuaValue::Number(n) => n.to_string(),
            LuaValue::Boolean(b) => b.to_string(),
            _ => continue,
        };
        entries.push((idx, text));
    }
    entries.sort_by_key(|&(i, _)| i);
    Ok(entries.into_iter().map(|(_, v)| v).collect())
}

/// The `chart` userdata handed to Lua.
#[derive(Clone)]
pub struct ChartUserData {
    spec: Rc<RefCell<ChartSpec>>,
}

impl ChartUserData {
    pub fn new(spec: Rc<RefCell<ChartSpec>>) -> Self {
        Self { spec }
    }
}

impl UserData for ChartUserData {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        // chart:title(text)
        methods.add_method("title", |_, this, text: String| {
            this.spec.borrow_mut().set_title(text);
            Ok(())
        });

        // chart:xlabel(text)
        methods.add_method("xlabel", |_, this, text: String| {
            this.spec.borrow_mut().set_x_label(text);
            Ok(())
        });

        // chart:ylabel(text)
        methods.add_method("ylabel", |_, this, text: String| {
            this.spec.borrow_mut().set_y_label(text);
            Ok(())
        });

        // chart:bar(labels, values)
        methods.add_method("bar", |_, this, (labels, values): (Table, Table)| {
            let labels = strings_from_table(&labels)?;
            let values = numbers_from_table(&values)?;
            this.spec
                .borrow_mut()
                .add_bar(labels, values)
                .map_err(mlua::Error::RuntimeError)
        });

        // chart:line(xs, ys)
        methods.add_method("line", |_, this, (xs, ys): (Table, Table)| {
            let xs = numbers_from_table(&xs)?;
            let ys = numbers_from_table(&ys)?;
            this.spec
                .borrow_mut()
                .add_line(xs, ys)
                .map_err(mlua::Error::RuntimeError)
        });

        // chart:scatter(xs, ys)
        methods.add_method("scatter", |_, this, (xs, ys): (Table, Table)| {
            let xs = numbers_from_table(&xs)?;
            let ys = numbers_from_table(&ys)?;
            this.spec
                .borrow_mut()
                .add_scatter(xs, ys)
                .map_err(mlua::Error::RuntimeError)
        });

        // chart:histogram(values, bins?)
        methods.add_method(
            "histogram",
            |_, this, (values, bins): (Table, Option<usize>)| {
                let values = numbers_from_table(&values)?;
                this.spec
                    .borrow_mut()
                    .add_histogram(values, bins.unwrap_or(DEFAULT_BINS))
                    .map_err(mlua::Error::RuntimeError)
            },
        );
    }
}
