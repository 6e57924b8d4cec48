// dataset.rs

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::geo::RegionCode;
use crate::months::MonthKey;

pub const MONTH_COLUMN: &str = "Année-Mois";
pub const TEMPERATURE_COLUMN: &str = "TMoy (°C)";
pub const DELIMITER: u8 = b';';

/// One file per département, named `<code>_<slug>.csv`.
pub const SOURCE_FILES: &[&str] = &[
    "01_ain.csv",
    "02_aisne.csv",
    "03_allier.csv",
    "04_alpes-de-haute-provence.csv",
    "05_hautes-alpes.csv",
    "06_alpes-maritimes.csv",
    "07_ardeche.csv",
    "08_ardennes.csv",
    "09_ariege.csv",
    "10_aube.csv",
    "11_aude.csv",
    "12_aveyron.csv",
    "13_bouches-du-rhone.csv",
    "14_calvados.csv",
    "15_cantal.csv",
    "16_charente.csv",
    "17_charente-maritime.csv",
    "18_cher.csv",
    "19_correze.csv",
    "21_cote-dor.csv",
    "22_cotes-darmor.csv",
    "23_creuse.csv",
    "24_dordogne.csv",
    "25_doubs.csv",
    "26_drome.csv",
    "27_eure.csv",
    "28_eure-et-loir.csv",
    "29_finistere.csv",
    "2A_corse-du-sud.csv",
    "2B_haute-corse.csv",
    "30_gard.csv",
    "31_haute-garonne.csv",
    "32_gers.csv",
    "33_gironde.csv",
    "34_herault.csv",
    "35_ille-et-vilaine.csv",
    "36_indre.csv",
    "37_indre-et-loire.csv",
    "38_isere.csv",
    "39_jura.csv",
    "40_landes.csv",
    "41_loir-et-cher.csv",
    "42_loire.csv",
    "43_haute-loire.csv",
    "44_loire-atlantique.csv",
    "45_loiret.csv",
    "46_lot.csv",
    "47_lot-et-garonne.csv",
    "48_lozere.csv",
    "49_maine-et-loire.csv",
    "50_manche.csv",
    "51_marne.csv",
    "52_haute-marne.csv",
    "53_mayenne.csv",
    "54_meurthe-et-moselle.csv",
    "55_meuse.csv",
    "56_morbihan.csv",
    "57_moselle.csv",
    "58_nievre.csv",
    "59_nord.csv",
    "60_oise.csv",
    "61_orne.csv",
    "62_pas-de-calais.csv",
    "63_puy-de-dome.csv",
    "64_pyrenees-atlantiques.csv",
    "65_hautes-pyrenees.csv",
    "66_pyrenees-orientales.csv",
    "67_bas-rhin.csv",
    "68_haut-rhin.csv",
    "69_rhone.csv",
    "70_haute-saone.csv",
    "71_saone-et-loire.csv",
    "72_sarthe.csv",
    "73_savoie.csv",
    "74_haute-savoie.csv",
    "75_paris.csv",
    "76_seine-maritime.csv",
    "77_seine-et-marne.csv",
    "78_yvelines.csv",
    "79_deux-sevres.csv",
    "80_somme.csv",
    "81_tarn.csv",
    "82_tarn-et-garonne.csv",
    "83_var.csv",
    "84_vaucluse.csv",
    "85_vendee.csv",
    "86_vienne.csv",
    "87_haute-vienne.csv",
    "88_vosges.csv",
    "89_yonne.csv",
    "90_territoire-de-belfort.csv",
    "91_essonne.csv",
    "92_hauts-de-seine.csv",
    "93_seine-saint-denis.csv",
    "94_val-de-marne.csv",
    "95_val-doise.csv",
];

/// Where one region's time series lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub code: RegionCode,
    pub location: PathBuf,
}

impl Source {
    /// The code is everything before the first `_` of the file name.
    pub fn from_file_name(data_dir: &Path, file_name: &str) -> Source {
        let code = file_name.split('_').next().unwrap_or(file_name);
        Source {
            code: RegionCode::new(code),
            location: data_dir.join(file_name),
        }
    }
}

pub fn default_sources(data_dir: &Path) -> Vec<Source> {
    SOURCE_FILES
        .iter()
        .map(|name| Source::from_file_name(data_dir, name))
        .collect()
}

/// Retrieves the raw text of a source.
pub trait Fetch {
    fn fetch(&self, location: &Path) -> Result<String, LoadError>;
}

/// Reads sources from the local filesystem.
pub struct FsFetcher;

impl Fetch for FsFetcher {
    fn fetch(&self, location: &Path) -> Result<String, LoadError> {
        fs::read_to_string(location).map_err(|source| LoadError::Io {
            path: location.to_path_buf(),
            source,
        })
    }
}

/// Monthly mean temperature per département. Missing months are absent,
/// never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemperatureTable {
    regions: HashMap<RegionCode, BTreeMap<MonthKey, f64>>,
}

impl TemperatureTable {
    pub fn get(&self, code: &RegionCode, month: MonthKey) -> Option<f64> {
        self.regions.get(code)?.get(&month).copied()
    }

    pub fn insert_region(&mut self, code: RegionCode, series: BTreeMap<MonthKey, f64>) {
        self.regions.insert(code, series);
    }

    pub fn contains_region(&self, code: &RegionCode) -> bool {
        self.regions.contains_key(code)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

impl FromIterator<(RegionCode, MonthKey, f64)> for TemperatureTable {
    fn from_iter<I: IntoIterator<Item = (RegionCode, MonthKey, f64)>>(iter: I) -> Self {
        let mut table = TemperatureTable::default();
        for (code, month, temp) in iter {
            table.regions.entry(code).or_default().insert(month, temp);
        }
        table
    }
}

/// Parses one region's CSV into month → temperature. Rows lacking a valid
/// month key or a numeric temperature are dropped.
pub fn parse_series(text: &str) -> Result<BTreeMap<MonthKey, f64>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or(LoadError::MissingColumn(name))
    };
    let month_idx = column(MONTH_COLUMN)?;
    let temp_idx = column(TEMPERATURE_COLUMN)?;

    let mut series = BTreeMap::new();
    for record in reader.records() {
        let record = record?;
        let Some(month) = record
            .get(month_idx)
            .and_then(|m| m.parse::<MonthKey>().ok())
        else {
            continue;
        };
        // French exports may write the decimal separator as a comma.
        let Some(temp) = record
            .get(temp_idx)
            .and_then(|t| t.replace(',', ".").parse::<f64>().ok())
            .filter(|t| t.is_finite())
        else {
            continue;
        };
        series.insert(month, temp);
    }
    Ok(series)
}

/// Outcome of a full load, for logging and the status line.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub rows: usize,
    pub skipped: Vec<(RegionCode, String)>,
}

impl LoadReport {
    pub fn summary(&self) -> String {
        if self.skipped.is_empty() {
            format!("Loaded {} départements ({} months of data)", self.loaded, self.rows)
        } else {
            format!(
                "Loaded {} départements ({} months of data), {} skipped",
                self.loaded,
                self.rows,
                self.skipped.len()
            )
        }
    }
}

/// Loads every source, one attempt each. A failing source is logged and
/// left out of the table; it never stops the others.
pub fn load_all(fetcher: &impl Fetch, sources: &[Source]) -> (TemperatureTable, LoadReport) {
    let mut table = TemperatureTable::default();
    let mut report = LoadReport::default();

    for source in sources {
        let result = fetcher
            .fetch(&source.location)
            .and_then(|text| parse_series(&text));
        match result {
            Ok(series) => {
                debug!(code = %source.code, rows = series.len(), "loaded series");
                report.loaded += 1;
                report.rows += series.len();
                table.insert_region(source.code.clone(), series);
            }
            Err(e) => {
                warn!(
                    code = %source.code,
                    location = %source.location.display(),
                    "skipping source: {}", e
                );
                report.skipped.push((source.code.clone(), e.to_string()));
            }
        }
    }

    info!(
        loaded = report.loaded,
        skipped = report.skipped.len(),
        rows = report.rows,
        "temperature table ready"
    );
    (table, report)
}
