//! Static Chart Renderer
//! Draws every dashboard view as standalone SVG markup with plotters.
//!
//! Views:
//! 1. Geographic bubble map: one bubble per department, sized by TOTAL
//! 2. Line chart: deaths per month, markers on integer months
//! 3. Vertical bars: most violent cities / deaths by age group
//! 4. Pie: share of deaths for the lowest-mortality cities
//! 5. Stacked bars: deaths by sex within each department

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

use crate::geo::DepartmentBubble;

/// Canvas size shared by every view.
pub const CHART_WIDTH: u32 = 960;
pub const CHART_HEIGHT: u32 = 540;

/// Series palette, cycled per slice or stack layer.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(99, 110, 250),  // Blue
    RGBColor(239, 85, 59),   // Red
    RGBColor(0, 204, 150),   // Green
    RGBColor(171, 99, 250),  // Purple
    RGBColor(255, 161, 90),  // Orange
    RGBColor(25, 211, 243),  // Cyan
    RGBColor(255, 102, 146), // Pink
    RGBColor(182, 232, 128), // Lime
    RGBColor(255, 151, 255), // Magenta
    RGBColor(254, 203, 82),  // Yellow
];

/// Single-series color (bars, line, map bubbles).
const SERIES_COLOR: RGBColor = PALETTE[0];
const GRID_COLOR: RGBColor = RGBColor(235, 235, 235);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("failed to draw chart: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

/// Renders the summary tables into SVG documents.
pub struct ChartRenderer;

impl ChartRenderer {
    /// Bubble map of death totals per department. Bubble area scales with
    /// TOTAL; departments without coordinates never reach this function.
    pub fn department_map(bubbles: &[DepartmentBubble]) -> Result<String, ChartError> {
        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let (lon_min, lon_max, lat_min, lat_max) = Self::map_bounds(bubbles);
            let mut chart = ChartBuilder::on(&root)
                .caption(
                    "Distribución total de muertes por departamento (2019)",
                    ("sans-serif", 22),
                )
                .margin(12)
                .x_label_area_size(36)
                .y_label_area_size(50)
                .build_cartesian_2d(lon_min..lon_max, lat_min..lat_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .x_desc("Longitud")
                .y_desc("Latitud")
                .light_line_style(&GRID_COLOR)
                .draw()
                .map_err(draw_err)?;

            let max_total = bubbles.iter().map(|b| b.total).max().unwrap_or(0).max(1) as f64;
            chart
                .draw_series(bubbles.iter().map(|b| {
                    let share = b.total as f64 / max_total;
                    let radius = 4 + (share.sqrt() * 26.0) as i32;
                    Circle::new((b.lon, b.lat), radius, SERIES_COLOR.mix(0.45).filled())
                }))
                .map_err(draw_err)?;
            chart
                .draw_series(bubbles.iter().map(|b| {
                    Text::new(b.name.clone(), (b.lon, b.lat), ("sans-serif", 11))
                }))
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    /// Death counts per month as a line with one marker per month.
    pub fn monthly_line(points: &[(i64, u64)]) -> Result<String, ChartError> {
        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let y_max = points.iter().map(|p| p.1).max().unwrap_or(0).max(1) as f64 * 1.1;
            let mut chart = ChartBuilder::on(&root)
                .caption("Total de muertes por mes (2019)", ("sans-serif", 22))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .build_cartesian_2d(0.5f64..12.5f64, 0f64..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .x_desc("MES")
                .y_desc("TOTAL")
                .x_labels(12)
                .x_label_formatter(&|v| format!("{}", v.round() as i64))
                .y_label_formatter(&|v| format!("{}", *v as u64))
                .light_line_style(&GRID_COLOR)
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(LineSeries::new(
                    points.iter().map(|&(mes, total)| (mes as f64, total as f64)),
                    SERIES_COLOR.stroke_width(2),
                ))
                .map_err(draw_err)?;
            chart
                .draw_series(points.iter().map(|&(mes, total)| {
                    Circle::new((mes as f64, total as f64), 4, SERIES_COLOR.filled())
                }))
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    /// The five cities with the most firearm assault deaths.
    pub fn violent_cities_bar(rows: &[(String, u64)]) -> Result<String, ChartError> {
        Self::vertical_bars(
            "5 ciudades más violentas (códigos X95)",
            "MUNICIPIO",
            rows,
        )
    }

    /// Death counts per age group code.
    pub fn age_group_bar(rows: &[(String, u64)]) -> Result<String, ChartError> {
        Self::vertical_bars(
            "Distribución de muertes por grupo de edad",
            "GRUPO_EDAD1",
            rows,
        )
    }

    /// Share of deaths among the lowest-mortality cities, as a pie with a
    /// legend column on the right.
    pub fn quietest_cities_pie(rows: &[(String, u64)]) -> Result<String, ChartError> {
        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;
            let root = root
                .titled(
                    "10 ciudades con menor mortalidad (total de muertes)",
                    ("sans-serif", 22),
                )
                .map_err(draw_err)?;

            let total: u64 = rows.iter().map(|r| r.1).sum();
            if total > 0 {
                let (w, h) = root.dim_in_pixel();
                let center = (w as i32 * 2 / 5, h as i32 / 2);
                let radius = (h as i32 / 2 - 40).max(40) as f64;

                let mut start = -90.0f64;
                for (i, (_, value)) in rows.iter().enumerate() {
                    let share = *value as f64 / total as f64;
                    let sweep = share * 360.0;
                    let color = PALETTE[i % PALETTE.len()];

                    let mut points = vec![center];
                    let steps = (sweep.ceil() as usize).max(2);
                    for s in 0..=steps {
                        let angle = (start + sweep * s as f64 / steps as f64).to_radians();
                        points.push((
                            center.0 + (radius * angle.cos()) as i32,
                            center.1 + (radius * angle.sin()) as i32,
                        ));
                    }
                    root.draw(&Polygon::new(points, color.filled()))
                        .map_err(draw_err)?;

                    let mid = (start + sweep / 2.0).to_radians();
                    let label_at = (
                        center.0 + (radius * 0.72 * mid.cos()) as i32,
                        center.1 + (radius * 0.72 * mid.sin()) as i32,
                    );
                    let style = ("sans-serif", 13)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(HPos::Center, VPos::Center));
                    root.draw(&Text::new(format!("{:.1}%", share * 100.0), label_at, style))
                        .map_err(draw_err)?;

                    start += sweep;
                }

                let legend_x = w as i32 * 7 / 10;
                let mut legend_y = 40;
                for (i, (name, value)) in rows.iter().enumerate() {
                    let color = PALETTE[i % PALETTE.len()];
                    root.draw(&Rectangle::new(
                        [(legend_x, legend_y), (legend_x + 14, legend_y + 14)],
                        color.filled(),
                    ))
                    .map_err(draw_err)?;
                    root.draw(&Text::new(
                        format!("{name} ({value})"),
                        (legend_x + 20, legend_y + 2),
                        ("sans-serif", 13),
                    ))
                    .map_err(draw_err)?;
                    legend_y += 22;
                }
            }

            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    /// Deaths by sex stacked within each department, departments ordered by
    /// their combined total, descending.
    pub fn sex_department_bars(rows: &[(String, String, u64)]) -> Result<String, ChartError> {
        let mut dept_totals: Vec<(String, u64)> = Vec::new();
        for (department, _, total) in rows {
            match dept_totals.iter_mut().find(|(name, _)| name == department) {
                Some((_, sum)) => *sum += total,
                None => dept_totals.push((department.clone(), *total)),
            }
        }
        dept_totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        // Stack order: the two expected labels first, then anything else.
        let mut sexes: Vec<String> = Vec::new();
        for known in ["Hombre", "Mujer"] {
            if rows.iter().any(|(_, sex, _)| sex == known) {
                sexes.push(known.to_string());
            }
        }
        let mut extras: Vec<String> = rows
            .iter()
            .map(|(_, sex, _)| sex.clone())
            .filter(|sex| !sexes.contains(sex))
            .collect();
        extras.sort();
        extras.dedup();
        sexes.extend(extras);

        let value = |department: &str, sex: &str| -> u64 {
            rows.iter()
                .find(|(d, s, _)| d.as_str() == department && s.as_str() == sex)
                .map(|(_, _, total)| *total)
                .unwrap_or(0)
        };

        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let n = dept_totals.len().max(1) as u32;
            let y_max = dept_totals
                .iter()
                .map(|(_, total)| *total)
                .max()
                .unwrap_or(0)
                .max(1) as f64
                * 1.1;
            let mut chart = ChartBuilder::on(&root)
                .caption("Muertes por sexo en cada departamento", ("sans-serif", 22))
                .margin(12)
                .x_label_area_size(130)
                .y_label_area_size(70)
                .build_cartesian_2d((0u32..n).into_segmented(), 0f64..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc("DEPARTAMENTO")
                .y_desc("TOTAL")
                .x_labels(n as usize)
                .x_label_formatter(&|seg: &SegmentValue<u32>| match seg {
                    SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => dept_totals
                        .get(*i as usize)
                        .map(|(name, _)| name.clone())
                        .unwrap_or_default(),
                    SegmentValue::Last => String::new(),
                })
                .x_label_style(
                    ("sans-serif", 11)
                        .into_font()
                        .transform(FontTransform::Rotate90),
                )
                .y_label_formatter(&|v| format!("{}", *v as u64))
                .light_line_style(&GRID_COLOR)
                .draw()
                .map_err(draw_err)?;

            let mut cumulative = vec![0.0f64; dept_totals.len()];
            for (si, sex) in sexes.iter().enumerate() {
                let color = PALETTE[si % PALETTE.len()];
                let mut segments: Vec<(u32, f64, f64)> = Vec::new();
                for (i, (department, _)) in dept_totals.iter().enumerate() {
                    let v = value(department, sex) as f64;
                    if v > 0.0 {
                        segments.push((i as u32, cumulative[i], cumulative[i] + v));
                    }
                    cumulative[i] += v;
                }

                chart
                    .draw_series(segments.iter().map(|&(i, y0, y1)| {
                        Rectangle::new(
                            [
                                (SegmentValue::Exact(i), y0),
                                (SegmentValue::Exact(i + 1), y1),
                            ],
                            color.filled(),
                        )
                    }))
                    .map_err(draw_err)?
                    .label(sex.clone())
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled())
                    });
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.85))
                .border_style(&RGBColor(180, 180, 180))
                .label_font(("sans-serif", 13))
                .draw()
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    /// Shared vertical bar layout for the city and age group views.
    fn vertical_bars(
        title: &str,
        x_desc: &str,
        rows: &[(String, u64)],
    ) -> Result<String, ChartError> {
        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let n = rows.len().max(1) as u32;
            let y_max = rows.iter().map(|r| r.1).max().unwrap_or(0).max(1) as f64 * 1.1;
            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 22))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .build_cartesian_2d((0u32..n).into_segmented(), 0f64..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc(x_desc)
                .y_desc("TOTAL")
                .x_labels(n as usize)
                .x_label_formatter(&|seg: &SegmentValue<u32>| match seg {
                    SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => rows
                        .get(*i as usize)
                        .map(|(name, _)| name.clone())
                        .unwrap_or_default(),
                    SegmentValue::Last => String::new(),
                })
                .y_label_formatter(&|v| format!("{}", *v as u64))
                .light_line_style(&GRID_COLOR)
                .draw()
                .map_err(draw_err)?;

            // Filled bar plus a white outline so adjacent bars read apart.
            chart
                .draw_series(rows.iter().enumerate().map(|(i, &(_, total))| {
                    Rectangle::new(
                        [
                            (SegmentValue::Exact(i as u32), 0.0),
                            (SegmentValue::Exact(i as u32 + 1), total as f64),
                        ],
                        SERIES_COLOR.filled(),
                    )
                }))
                .map_err(draw_err)?;
            chart
                .draw_series(rows.iter().enumerate().map(|(i, &(_, total))| {
                    Rectangle::new(
                        [
                            (SegmentValue::Exact(i as u32), 0.0),
                            (SegmentValue::Exact(i as u32 + 1), total as f64),
                        ],
                        WHITE.stroke_width(1),
                    )
                }))
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    /// Data extent with a margin, or a continental Colombia frame when no
    /// department could be geocoded.
    fn map_bounds(bubbles: &[DepartmentBubble]) -> (f64, f64, f64, f64) {
        if bubbles.is_empty() {
            return (-79.5, -66.0, -5.5, 13.5);
        }

        let mut lon_min = f64::INFINITY;
        let mut lon_max = f64::NEG_INFINITY;
        let mut lat_min = f64::INFINITY;
        let mut lat_max = f64::NEG_INFINITY;
        for b in bubbles {
            lon_min = lon_min.min(b.lon);
            lon_max = lon_max.max(b.lon);
            lat_min = lat_min.min(b.lat);
            lat_max = lat_max.max(b.lat);
        }
        (
            lon_min - 1.5,
            lon_max + 1.5,
            lat_min - 1.2,
            lat_max + 1.2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bubble(name: &str, total: u64, lat: f64, lon: f64) -> DepartmentBubble {
        DepartmentBubble {
            name: name.to_string(),
            total,
            lat,
            lon,
        }
    }

    #[test]
    fn map_renders_labelled_bubbles() {
        let bubbles = vec![
            bubble("ANTIOQUIA", 2, 7.1986, -75.3412),
            bubble("BOGOTÁ, D.C.", 1, 4.71, -74.07),
        ];
        let svg = ChartRenderer::department_map(&bubbles).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Distribución total de muertes por departamento (2019)"));
        assert!(svg.contains("ANTIOQUIA"));
    }

    #[test]
    fn map_renders_even_without_bubbles() {
        let svg = ChartRenderer::department_map(&[]).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn monthly_line_labels_both_axes() {
        let points: Vec<(i64, u64)> = (1..=12).map(|mes| (mes, 100 + mes as u64)).collect();
        let svg = ChartRenderer::monthly_line(&points).unwrap();
        assert!(svg.contains("Total de muertes por mes (2019)"));
        assert!(svg.contains("MES"));
        assert!(svg.contains("TOTAL"));
    }

    #[test]
    fn violent_bar_shows_city_names() {
        let rows = vec![
            ("CALI".to_string(), 120),
            ("BOGOTÁ, D.C.".to_string(), 90),
            ("MEDELLÍN".to_string(), 33),
        ];
        let svg = ChartRenderer::violent_cities_bar(&rows).unwrap();
        assert!(svg.contains("5 ciudades más violentas (códigos X95)"));
        assert!(svg.contains("MEDELLÍN"));
    }

    #[test]
    fn pie_shows_shares_and_legend() {
        let rows = vec![
            ("ACHÍ".to_string(), 1),
            ("BARANOA".to_string(), 1),
        ];
        let svg = ChartRenderer::quietest_cities_pie(&rows).unwrap();
        assert!(svg.contains("10 ciudades con menor mortalidad (total de muertes)"));
        assert!(svg.contains("50.0%"));
        assert!(svg.contains("ACHÍ (1)"));
    }

    #[test]
    fn pie_survives_an_empty_ranking() {
        let svg = ChartRenderer::quietest_cities_pie(&[]).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn stacked_bars_carry_a_sex_legend() {
        let rows = vec![
            ("ANTIOQUIA".to_string(), "Hombre".to_string(), 7),
            ("ANTIOQUIA".to_string(), "Mujer".to_string(), 5),
            ("SUCRE".to_string(), "Hombre".to_string(), 2),
        ];
        let svg = ChartRenderer::sex_department_bars(&rows).unwrap();
        assert!(svg.contains("Muertes por sexo en cada departamento"));
        assert!(svg.contains("Hombre"));
        assert!(svg.contains("Mujer"));
        assert!(svg.contains("ANTIOQUIA"));
    }

    #[test]
    fn age_bars_use_group_codes_as_labels() {
        let rows = vec![
            ("0".to_string(), 1),
            ("5".to_string(), 4),
            ("20".to_string(), 9),
        ];
        let svg = ChartRenderer::age_group_bar(&rows).unwrap();
        assert!(svg.contains("Distribución de muertes por grupo de edad"));
        assert!(svg.contains("GRUPO_EDAD1"));
    }
}
