// render.rs

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::color::{self, Band};
use crate::dataset::TemperatureTable;
use crate::geo::{BBox, BoundaryCollection, Region, RegionCode};
use crate::months::MonthKey;

/// One département styled for the selected month.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRegion {
    /// Position in the boundary collection.
    pub index: usize,
    pub code: RegionCode,
    pub name: String,
    pub temperature: Option<f64>,
    pub band: Band,
}

impl StyledRegion {
    pub fn label(&self) -> String {
        match self.temperature {
            Some(t) => format!("{}: {} °C", self.name, t),
            None => format!("{}: N/A", self.name),
        }
    }
}

/// The choropleth layer for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    boundaries: Rc<BoundaryCollection>,
    pub month: MonthKey,
    pub regions: Vec<StyledRegion>,
}

pub fn render_overlay(
    boundaries: &Rc<BoundaryCollection>,
    table: &TemperatureTable,
    month: MonthKey,
) -> Overlay {
    let regions = boundaries
        .regions
        .iter()
        .enumerate()
        .map(|(index, region)| {
            let temperature = table.get(&region.code, month);
            StyledRegion {
                index,
                code: region.code.clone(),
                name: region.name.clone(),
                temperature,
                band: color::band(temperature),
            }
        })
        .collect();
    Overlay {
        boundaries: Rc::clone(boundaries),
        month,
        regions,
    }
}

impl Overlay {
    pub fn geometry(&self, styled: &StyledRegion) -> &Region {
        &self.boundaries.regions[styled.index]
    }

    pub fn find(&self, code: &RegionCode) -> Option<&StyledRegion> {
        self.regions.iter().find(|r| &r.code == code)
    }

    /// The region under a lon/lat point, if any. Later features sit on top
    /// of earlier ones.
    pub fn hit_test(&self, point: (f64, f64)) -> Option<&StyledRegion> {
        self.regions
            .iter()
            .rev()
            .find(|styled| self.geometry(styled).contains(point))
    }

    /// Samples a `cols` x `rows` grid spanning `bounds` at the centre of each
    /// cell and groups the covered cells by band. Rows count from the top.
    pub fn rasterize(&self, bounds: BBox, cols: usize, rows: usize) -> Raster {
        let mut layers: BTreeMap<Band, Vec<(usize, usize)>> = BTreeMap::new();

        let visible: Vec<&StyledRegion> = self
            .regions
            .iter()
            .filter(|s| {
                let b = self.geometry(s).bbox;
                !b.is_empty()
                    && b.max_lon >= bounds.min_lon
                    && b.min_lon <= bounds.max_lon
                    && b.max_lat >= bounds.min_lat
                    && b.min_lat <= bounds.max_lat
            })
            .collect();

        for row in 0..rows {
            for col in 0..cols {
                let point = cell_center(bounds, cols, rows, col, row);
                if let Some(styled) = visible
                    .iter()
                    .rev()
                    .find(|s| self.geometry(s).contains(point))
                {
                    layers.entry(styled.band).or_default().push((col, row));
                }
            }
        }

        Raster {
            bounds,
            cols,
            rows,
            layers: layers.into_iter().collect(),
        }
    }
}

/// Lon/lat at the centre of cell (`col`, `row`) of a `cols` x `rows` grid
/// laid over `bounds`, with row 0 at the top.
pub fn cell_center(bounds: BBox, cols: usize, rows: usize, col: usize, row: usize) -> (f64, f64) {
    let fx = (col as f64 + 0.5) / cols.max(1) as f64;
    let fy = (row as f64 + 0.5) / rows.max(1) as f64;
    (
        bounds.min_lon + fx * (bounds.max_lon - bounds.min_lon),
        bounds.max_lat - fy * (bounds.max_lat - bounds.min_lat),
    )
}

/// Covered cells of an overlay, grouped by band. Cells are `(col, row)`
/// with row 0 at the top, the same layout as a canvas grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub bounds: BBox,
    pub cols: usize,
    pub rows: usize,
    pub layers: Vec<(Band, Vec<(usize, usize)>)>,
}
