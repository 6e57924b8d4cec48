// panel.rs

use crate::dataset::TemperatureTable;
use crate::geo::RegionCode;
use crate::months::MonthKey;

/// Temperature history of one département across the whole month index.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendChart {
    pub code: RegionCode,
    /// One entry per month of the index; `None` where no data exists.
    pub values: Vec<Option<f64>>,
}

impl TrendChart {
    pub fn new(code: RegionCode, months: &[MonthKey], table: &TemperatureTable) -> TrendChart {
        let values = months.iter().map(|&m| table.get(&code, m)).collect();
        TrendChart { code, values }
    }

    /// Contiguous runs of data as `(month index, temperature)` points. A
    /// missing month ends a run; nothing is interpolated across it.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (i, value) in self.values.iter().enumerate() {
            match value {
                Some(t) => current.push((i as f64, *t)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        let mut values = self.values.iter().flatten();
        let first = *values.next()?;
        Some(values.fold((first, first), |(lo, hi), &t| (lo.min(t), hi.max(t))))
    }

    pub fn has_data(&self) -> bool {
        self.values.iter().any(Option::is_some)
    }
}

/// Contents of the open side panel.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPanel {
    pub code: RegionCode,
    pub name: String,
    pub temperature: Option<f64>,
    pub month: MonthKey,
    pub chart: TrendChart,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PanelState {
    #[default]
    Closed,
    Open(Box<OpenPanel>),
}

impl PanelState {
    /// Shows a département. An already open panel is replaced, dropping
    /// its chart before the new one is built.
    pub fn open(
        &mut self,
        code: RegionCode,
        name: String,
        temperature: Option<f64>,
        month: MonthKey,
        months: &[MonthKey],
        table: &TemperatureTable,
    ) {
        *self = PanelState::Closed;
        let chart = TrendChart::new(code.clone(), months, table);
        *self = PanelState::Open(Box::new(OpenPanel {
            code,
            name,
            temperature,
            month,
            chart,
        }));
    }

    /// Returns whether the panel was open.
    pub fn close(&mut self) -> bool {
        matches!(std::mem::take(self), PanelState::Open(_))
    }

    pub fn is_open(&self) -> bool {
        matches!(self, PanelState::Open(_))
    }

    pub fn current(&self) -> Option<&OpenPanel> {
        match self {
            PanelState::Open(panel) => Some(panel.as_ref()),
            PanelState::Closed => None,
        }
    }

    /// Follows the month slider while open.
    pub fn set_month(&mut self, month: MonthKey, table: &TemperatureTable) {
        if let PanelState::Open(panel) = self {
            panel.month = month;
            panel.temperature = table.get(&panel.code, month);
        }
    }
}
