use crate::core::aggregate::{format_price, CountBar, PriceBar};
use crate::domain::category::{ChartColor, Marker};
use crate::domain::model::ChartSpec;
use crate::utils::error::{EtlError, Result};
use image::{ImageFormat, RgbImage};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Cursor;

const FONT: &str = "sans-serif";
/// ggplot 風格的灰色繪圖區
const PANEL_BACKGROUND: RGBColor = RGBColor(229, 229, 229);
const BAR_HALF_WIDTH: f64 = 0.4;
const ANNOTATION_OFFSET: f64 = 0.1;
const MEDIAN_LABEL_OFFSET: f64 = 0.2;
const MARKER_SIZE_PT: f64 = 16.0;
const PRICE_HEADROOM: f64 = 1.0;

type BarCoord = Cartesian2d<RangedCoordf64, RangedCoordf64>;

fn chart_err<E: std::fmt::Display>(e: E) -> EtlError {
    EtlError::ChartError {
        message: e.to_string(),
    }
}

fn rgb(color: ChartColor) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

/// 自動上界：有限值最大者的 105%，全空時為 1
pub fn auto_upper_bound(values: impl IntoIterator<Item = f64>) -> f64 {
    let max = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.05
    } else {
        1.0
    }
}

/// 以多邊形近似各種標記，中心在 `center`
pub fn marker_points(marker: Marker, center: (i32, i32), radius: i32) -> Vec<(i32, i32)> {
    let (x, y) = center;
    let r = radius;
    match marker {
        Marker::TriangleLeft => vec![(x - r, y), (x + r, y - r), (x + r, y + r)],
        Marker::TriangleRight => vec![(x + r, y), (x - r, y - r), (x - r, y + r)],
        Marker::TriangleUp => vec![(x, y - r), (x - r, y + r), (x + r, y + r)],
        Marker::TriangleDown => vec![(x, y + r), (x - r, y - r), (x + r, y - r)],
        Marker::Square => vec![(x - r, y - r), (x + r, y - r), (x + r, y + r), (x - r, y + r)],
        Marker::Diamond => vec![(x, y - r), (x + r, y), (x, y + r), (x - r, y)],
        Marker::Circle => (0..24)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 24.0;
                (
                    x + (r as f64 * angle.cos()).round() as i32,
                    y + (r as f64 * angle.sin()).round() as i32,
                )
            })
            .collect(),
    }
}

pub struct ChartRenderer<'a> {
    spec: &'a ChartSpec,
}

impl<'a> ChartRenderer<'a> {
    pub fn new(spec: &'a ChartSpec) -> Self {
        Self { spec }
    }

    fn font_px(&self, points: f64) -> f64 {
        self.spec.px(points)
    }

    fn annotation_style(&self, pos: Pos) -> TextStyle<'static> {
        (FONT, self.font_px(10.0)).into_font().color(&BLACK).pos(pos)
    }

    fn build_chart<'b>(
        &self,
        root: &DrawingArea<BitMapBackend<'b>, Shift>,
        labels: &[String],
        y_max: f64,
        y_desc: &str,
    ) -> Result<ChartContext<'b, BitMapBackend<'b>, BarCoord>> {
        let n = labels.len();

        let mut chart = ChartBuilder::on(root)
            .caption(&self.spec.title, (FONT, self.font_px(12.0)))
            .margin(self.font_px(8.0))
            .x_label_area_size(self.font_px(36.0))
            .y_label_area_size(self.font_px(48.0))
            .build_cartesian_2d(-0.5..n as f64 - 0.5, 0.0..y_max)
            .map_err(chart_err)?;

        chart
            .plotting_area()
            .fill(&PANEL_BACKGROUND)
            .map_err(chart_err)?;

        // 只有整數位置才有類別名稱
        let category_label = |x: &f64| {
            let i = x.round();
            if (x - i).abs() < 1e-6 && i >= 0.0 {
                labels.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        };

        chart
            .configure_mesh()
            .bold_line_style(WHITE)
            .light_line_style(TRANSPARENT)
            // 範圍寬度為 n，最多 n 個刻度時刻度正好落在 0..n-1
            .x_labels(n.max(1))
            .x_desc(self.spec.x_label.as_str())
            .y_desc(y_desc)
            .x_label_formatter(&category_label)
            .label_style((FONT, self.font_px(10.0)))
            .axis_desc_style((FONT, self.font_px(10.0)))
            .draw()
            .map_err(chart_err)?;

        Ok(chart)
    }

    fn bar(&self, position: usize, height: f64) -> Rectangle<(f64, f64)> {
        let x = position as f64;
        Rectangle::new(
            [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, height)],
            rgb(self.spec.bar_color).filled(),
        )
    }

    fn blank_buffer(&self) -> Vec<u8> {
        vec![0u8; self.spec.width as usize * self.spec.height as usize * 3]
    }

    fn encode_png(&self, buffer: Vec<u8>) -> Result<Vec<u8>> {
        let image = RgbImage::from_raw(self.spec.width, self.spec.height, buffer).ok_or_else(|| {
            EtlError::ChartError {
                message: "bitmap buffer does not match the chart size".to_string(),
            }
        })?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    /// 每個類別一條長條，上方標示產品數
    pub fn render_counts(&self, bars: &[CountBar]) -> Result<Vec<u8>> {
        let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
        let y_max = auto_upper_bound(bars.iter().map(|b| b.count as f64));
        let centered = self.annotation_style(Pos::new(HPos::Center, VPos::Bottom));

        let mut buffer = self.blank_buffer();
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.spec.width, self.spec.height))
                .into_drawing_area();
            root.fill(&WHITE).map_err(chart_err)?;

            let mut chart = self.build_chart(&root, &labels, y_max, &self.spec.count_y_label)?;

            chart
                .draw_series(
                    bars.iter()
                        .enumerate()
                        .map(|(i, bar)| self.bar(i, bar.count as f64)),
                )
                .map_err(chart_err)?;

            chart
                .draw_series(bars.iter().enumerate().map(|(i, bar)| {
                    Text::new(
                        bar.count.to_string(),
                        (i as f64, bar.count as f64 + ANNOTATION_OFFSET),
                        centered.clone(),
                    )
                }))
                .map_err(chart_err)?;

            root.present().map_err(chart_err)?;
        }

        self.encode_png(buffer)
    }

    /// 平均價格長條加上各類別的中位數標記與圖例
    pub fn render_prices(&self, bars: &[PriceBar]) -> Result<Vec<u8>> {
        let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
        let y_max = auto_upper_bound(bars.iter().flat_map(|b| [b.mean, b.median])) + PRICE_HEADROOM;
        let currency = self.spec.currency_symbol.as_str();
        let centered = self.annotation_style(Pos::new(HPos::Center, VPos::Bottom));
        let left_aligned = self.annotation_style(Pos::new(HPos::Left, VPos::Bottom));
        let marker_radius = (self.font_px(MARKER_SIZE_PT) / 2.0).round() as i32;
        let legend_radius = (self.font_px(10.0) / 2.0).round() as i32;

        let mut buffer = self.blank_buffer();
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.spec.width, self.spec.height))
                .into_drawing_area();
            root.fill(&WHITE).map_err(chart_err)?;

            let mut chart = self.build_chart(&root, &labels, y_max, &self.spec.price_y_label)?;

            // NaN 的統計值不畫
            let means = || {
                bars.iter()
                    .enumerate()
                    .filter(|(_, bar)| bar.mean.is_finite())
            };

            chart
                .draw_series(means().map(|(i, bar)| self.bar(i, bar.mean)))
                .map_err(chart_err)?;

            chart
                .draw_series(means().map(|(i, bar)| {
                    Text::new(
                        format_price(bar.mean, currency),
                        (i as f64, bar.mean + ANNOTATION_OFFSET),
                        centered.clone(),
                    )
                }))
                .map_err(chart_err)?;

            for (i, bar) in bars.iter().enumerate() {
                if !bar.median.is_finite() {
                    continue;
                }

                let color = rgb(bar.color);
                let marker = bar.marker;
                chart
                    .draw_series(std::iter::once(
                        EmptyElement::at((i as f64, bar.median))
                            + Polygon::new(marker_points(marker, (0, 0), marker_radius), color.filled()),
                    ))
                    .map_err(chart_err)?
                    .label(format!("Median {}", bar.label))
                    .legend(move |(x, y)| {
                        Polygon::new(marker_points(marker, (x, y), legend_radius), color.filled())
                    });

                chart
                    .draw_series(std::iter::once(Text::new(
                        format_price(bar.median, currency),
                        (i as f64, bar.median + MEDIAN_LABEL_OFFSET),
                        left_aligned.clone(),
                    )))
                    .map_err(chart_err)?;
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE)
                .border_style(BLACK)
                .label_font((FONT, self.font_px(10.0)))
                .draw()
                .map_err(chart_err)?;

            root.present().map_err(chart_err)?;
        }

        self.encode_png(buffer)
    }
}
