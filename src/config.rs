// config.rs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::months::MonthKey;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Monthly mean temperature map of French départements",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub paths: Paths,

    /// Month shown at startup (YYYY-MM)
    #[arg(long, global = true)]
    pub month: Option<MonthKey>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone)]
pub struct Paths {
    /// GeoJSON FeatureCollection of département boundaries
    #[arg(long, default_value = "geo/departements.geojson", global = true)]
    pub geojson: PathBuf,

    /// Directory holding one `<code>_<name>.csv` file per département
    #[arg(long, default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Where exported PNG files are written
    #[arg(long, default_value = "output", global = true)]
    pub output_dir: PathBuf,

    /// Log file used while the terminal interface is running
    #[arg(long, default_value = "thermocarte.log", global = true)]
    pub log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the map (and optionally one département's trend) to PNG
    Export {
        /// Also export the trend chart of this département code
        #[arg(long)]
        region: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_data_layout() {
        let cli = Cli::try_parse_from(["thermocarte"]).unwrap();
        assert_eq!(cli.paths.geojson, PathBuf::from("geo/departements.geojson"));
        assert_eq!(cli.paths.data_dir, PathBuf::from("data"));
        assert!(cli.month.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn export_takes_month_and_region() {
        let cli = Cli::try_parse_from([
            "thermocarte",
            "export",
            "--month",
            "2022-08",
            "--region",
            "2A",
            "--output-dir",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.month.map(|m| m.to_string()).as_deref(), Some("2022-08"));
        assert_eq!(cli.paths.output_dir, PathBuf::from("out"));
        match cli.command {
            Some(Command::Export { region }) => assert_eq!(region.as_deref(), Some("2A")),
            None => panic!("expected export subcommand"),
        }
    }

    #[test]
    fn rejects_malformed_month() {
        assert!(Cli::try_parse_from(["thermocarte", "--month", "2022-8"]).is_err());
    }
}
