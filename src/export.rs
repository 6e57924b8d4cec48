// export.rs

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::color::{Band, color};
use crate::geo::BBox;
use crate::months::MonthKey;
use crate::panel::OpenPanel;
use crate::render::Overlay;

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 768;
const OCEAN: RGBColor = RGBColor(173, 216, 230);
const OUTLINE: RGBColor = RGBColor(0x55, 0x55, 0x55);

/// Draws the choropleth for the overlay's month into
/// `<output_dir>/carte_<YYYY-MM>.png`.
pub fn export_map(overlay: &Overlay, bounds: BBox, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let path = output_dir.join(format!("carte_{}.png", overlay.month));
    draw_map(overlay, bounds, &path).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "map exported");
    Ok(path)
}

fn draw_map(overlay: &Overlay, bounds: BBox, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&OCEAN)?;

    let caption = format!("Mean temperature, {}", overlay.month);
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(&caption, ("sans-serif", 40).into_font())
        .build_cartesian_2d(bounds.min_lon..bounds.max_lon, bounds.min_lat..bounds.max_lat)?;

    chart.configure_mesh().draw()?;

    for styled in &overlay.regions {
        let fill = color(styled.temperature);
        for polygon in &overlay.geometry(styled).polygons {
            // Exterior ring only; holes are covered by whichever region fills them.
            if let Some(exterior_ring) = polygon.first() {
                chart.draw_series(std::iter::once(Polygon::new(
                    exterior_ring.clone(),
                    fill.filled(),
                )))?;
                chart.draw_series(LineSeries::new(exterior_ring.iter().copied(), &OUTLINE))?;
            }
        }
    }

    for band in Band::ALL {
        let color = band.rgb();
        chart
            .draw_series(std::iter::empty::<Polygon<(f64, f64)>>())?
            .label(band.legend())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .position(SeriesLabelPosition::LowerLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Draws the open panel's trend chart into `<output_dir>/tendance_<code>.png`.
/// Months without data leave a gap in the line.
pub fn export_chart(panel: &OpenPanel, months: &[MonthKey], output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let path = output_dir.join(format!("tendance_{}.png", panel.code));
    draw_chart(panel, months, &path).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "trend chart exported");
    Ok(path)
}

fn draw_chart(panel: &OpenPanel, months: &[MonthKey], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT / 2)).into_drawing_area();
    root.fill(&WHITE)?;

    let (lo, hi) = panel.chart.y_bounds().unwrap_or((0.0, 1.0));
    let x_max = months.len().saturating_sub(1).max(1) as f64;
    let caption = format!("{} ({}): monthly mean temperature", panel.name, panel.code);

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .caption(&caption, ("sans-serif", 28).into_font())
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0.0..x_max, (lo - 1.0)..(hi + 1.0))?;

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|v| {
            months
                .get(v.round() as usize)
                .map(|m| m.to_string())
                .unwrap_or_default()
        })
        .y_desc("°C")
        .draw()?;

    let line = RGBColor(0xE3, 0x1A, 0x1C);
    for segment in panel.chart.segments() {
        if segment.len() == 1 {
            chart.draw_series(std::iter::once(Circle::new(segment[0], 3, line.filled())))?;
        } else {
            chart.draw_series(LineSeries::new(segment, &line))?;
        }
    }

    if let Some(x) = months.iter().position(|m| *m == panel.month) {
        if let Some(t) = panel.temperature {
            chart.draw_series(std::iter::once(Circle::new(
                (x as f64, t),
                5,
                BLACK.filled(),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TemperatureTable;
    use crate::geo::RegionCode;
    use crate::geo::tests::fixture;
    use crate::months::month_index;
    use crate::panel::PanelState;
    use crate::render::render_overlay;
    use std::rc::Rc;

    fn output_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("thermocarte-{}-{}", name, std::process::id()))
    }

    fn table() -> TemperatureTable {
        let m = |s: &str| s.parse::<MonthKey>().unwrap();
        [
            (RegionCode::new("01"), m("2018-01"), 2.5),
            (RegionCode::new("01"), m("2018-02"), 4.0),
            (RegionCode::new("01"), m("2018-04"), 11.0),
            (RegionCode::new("2A"), m("2018-01"), 9.5),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn map_png_is_named_after_the_month() {
        let dir = output_dir("map");
        let boundaries = Rc::new(fixture());
        let overlay = render_overlay(&boundaries, &table(), "2018-01".parse().unwrap());
        let bounds = boundaries.bbox().unwrap().padded(0.05);

        let path = export_map(&overlay, bounds, &dir).unwrap();
        assert_eq!(path, dir.join("carte_2018-01.png"));
        assert!(fs::metadata(&path).unwrap().len() > 0);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn chart_png_is_named_after_the_region() {
        let dir = output_dir("chart");
        let months = month_index();
        let table = table();
        let mut panel = PanelState::default();
        panel.open(
            RegionCode::new("01"),
            String::from("Ain"),
            Some(2.5),
            months[0],
            &months,
            &table,
        );

        let path = export_chart(panel.current().unwrap(), &months, &dir).unwrap();
        assert_eq!(path, dir.join("tendance_01.png"));
        assert!(fs::metadata(&path).unwrap().len() > 0);
        fs::remove_dir_all(&dir).unwrap();
    }
}
