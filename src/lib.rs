//! Reader for SPECS Prodigy XPS text exports (`.xy`).
//!
//! An export is parsed into [DataSet] → [Group] → [Region]. Each region holds its acquisition
//! header, the shared energy axis `x`, one intensity row per sweep in `data`, and the raw
//! acquisition timestamp of every sweep in `time`.
//!
//! ```no_run
//! use specs_xps::{DataSet, LoaderConfig};
//! let ds = DataSet::open(&["scan.xy"], LoaderConfig::default()).unwrap();
//! print!("{ds}");
//! ```

use std::num::ParseFloatError;
use std::path::PathBuf;

pub mod blocks;
pub mod config;
pub mod dataset;
pub mod header;
pub mod header_defs;
pub mod io;
pub mod region;

pub use config::{GroupPolicy, LoaderConfig, MismatchPolicy};
pub use dataset::{DataSet, LoadReport, RejectedSweep};
pub use header_defs::Label;
pub use region::{Group, Region, ShapeMismatch, SweepOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = "test_data/single_region.xy";
    const MULTI: &str = "test_data/multi_group.xy";
    const DUPLICATE: &str = "test_data/duplicate_group.xy";
    const MISMATCH: &str = "test_data/shape_mismatch.xy";
    const MISSING: &str = "test_data/missing_block.xy";

    fn open(path: &str, config: LoaderConfig) -> Result<DataSet, XpsError> {
        DataSet::open(&[path], config)
    }

    #[test]
    fn one_row_per_sweep() {
        let ds = open(SINGLE, LoaderConfig::default()).unwrap();
        assert_eq!(ds.groups.len(), 1);
        let r = &ds.groups[0].regions[0];
        assert_eq!(r.name, "Au 4f");
        assert_eq!(r.n_sweeps(), 3);
        assert_eq!(r.time.len(), 3);
        assert!(r.data.iter().all(|row| row.len() == r.x.len()));
        assert_eq!(r.header_value(Label::PassEnergy), Some("20"));
        assert_eq!(r.header_value(Label::DwellTime), Some("0.1"));
        assert_eq!(r.header_value(Label::Comment), Some(""));
        assert_eq!(r.header_value(Label::Scan), Some("3"));
        assert!(ds.reports[0].is_clean());
    }

    #[test]
    fn tab_separated_values_are_exact() {
        let ds = open(SINGLE, LoaderConfig::default()).unwrap();
        let r = &ds.groups[0].regions[0];
        assert_eq!(r.x, vec![89.0, 88.9, 88.8, 88.7]);
        assert_eq!(r.data[0], vec![1204.0, 1310.0, 1422.0, 1390.0]);
        assert_eq!(r.data[2], vec![1211.0, 1301.0, 1436.0, 1385.0]);
    }

    #[test]
    fn reparse_is_identical() {
        let a = open(MULTI, LoaderConfig::default()).unwrap();
        let b = open(MULTI, LoaderConfig::default()).unwrap();
        assert_eq!(a.groups, b.groups);
        assert_eq!(a.reports, b.reports);
    }

    #[test]
    fn offsets_start_at_zero() {
        let ds = open(SINGLE, LoaderConfig::default()).unwrap();
        let offsets = ds.groups[0].regions[0].offset_axis().unwrap();
        assert_eq!(offsets.len(), 3);
        assert_eq!(offsets[0], 0.0);
        assert_eq!(offsets[1], 33.0);
        assert!((offsets[2] - 66.5).abs() < 1e-9);

        let ds = open(MULTI, LoaderConfig::default()).unwrap();
        let c1s = ds.group("Core").and_then(|g| g.region("C 1s")).unwrap();
        assert_eq!(c1s.offset_axis().unwrap(), vec![0.0, 60.0]);
    }

    #[test]
    fn blocks_follow_file_order_across_groups() {
        let ds = open(MULTI, LoaderConfig::default()).unwrap();
        assert_eq!(ds.to_string(), "0: Survey\n->0: Survey\n1: Core\n->0: C 1s\n->1: O 1s\n");
        let survey = ds.group("Survey").and_then(|g| g.region("Survey")).unwrap();
        assert_eq!(survey.x, vec![1100.0, 1099.0, 1098.0]);
        let core = ds.group("Core").unwrap();
        assert_eq!(core.regions[0].data, vec![vec![410.0, 415.5, 433.0], vec![402.0, 418.0, 441.0]]);
        assert_eq!(core.regions[1].x, vec![535.0, 534.9]);
        assert_eq!(core.regions[1].n_sweeps(), 2);
    }

    #[test]
    fn second_sweep_with_other_length_is_dropped() {
        let text = "\
# Group: G
# Region: R
# Acquisition Date: 01/01/21 10:00:00 UTC
#
# Acquisition Date: 01/01/21 10:00:00 UTC
#
1.0 10
2.0 20
#
# Acquisition Date: 01/01/21 10:00:10 UTC
#
1.0 11
";
        let mut ds = DataSet::new(LoaderConfig::default()).unwrap();
        let report = ds.load_str(text, "boundary").unwrap();
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 10);
        assert_eq!(report.rejected[0].mismatch, ShapeMismatch { expected: 2, found: 1 });
        let r = &ds.groups[0].regions[0];
        assert_eq!(r.n_sweeps(), 1);
        assert_eq!(r.time.len(), 2);
        assert!(!r.is_aligned());
    }

    #[test]
    fn mismatch_policies() {
        let ds = open(MISMATCH, LoaderConfig::default()).unwrap();
        let r = &ds.groups[0].regions[0];
        assert_eq!(r.n_sweeps(), 2);
        assert_eq!(r.time.len(), 3);
        assert_eq!(ds.reports[0].rejected[0].region, "N 1s");

        let ds = open(MISMATCH, LoaderConfig::default().with_mismatch(MismatchPolicy::Repair)).unwrap();
        let r = &ds.groups[0].regions[0];
        assert_eq!(r.n_sweeps(), 2);
        assert_eq!(r.time, vec!["05/20/21 16:40:00 UTC", "05/20/21 16:40:40 UTC"]);
        assert!(r.is_aligned());
        assert_eq!(r.offset_axis().unwrap(), vec![0.0, 40.0]);

        let err = open(MISMATCH, LoaderConfig::default().with_mismatch(MismatchPolicy::Fail)).unwrap_err();
        assert!(matches!(err, XpsError::ShapeMismatch { expected: 3, found: 2, .. }));
    }

    #[test]
    fn duplicate_group_names() {
        let ds = open(DUPLICATE, LoaderConfig::default()).unwrap();
        assert_eq!(ds.groups.len(), 1);
        let names: Vec<&str> = ds.groups[0].regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Fe 2p", "Fe 3p"]);

        let ds = open(DUPLICATE, LoaderConfig::default().with_groups(GroupPolicy::AlwaysCreate)).unwrap();
        assert_eq!(ds.groups.len(), 2);
        assert!(ds.groups.iter().all(|g| g.name == "Fe" && g.len() == 1));
        assert_eq!(ds.groups[1].regions[0].x, vec![56.0, 55.9, 55.8]);
    }

    #[test]
    fn missing_data_block_is_an_error() {
        let err = open(MISSING, LoaderConfig::default()).unwrap_err();
        match err {
            XpsError::MissingDataBlock { region, .. } => assert_eq!(region, "S 2p"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn files_load_in_order() {
        let ds = DataSet::open(&[MULTI, SINGLE], LoaderConfig::default()).unwrap();
        let names: Vec<&str> = ds.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Survey", "Core", "Au4f"]);
        assert_eq!(ds.files.len(), 2);
        assert_eq!(ds.reports[1].source, SINGLE);
    }

    #[test]
    fn failed_file_changes_nothing() {
        let mut ds = DataSet::open(&[MULTI], LoaderConfig::default()).unwrap();
        let before = ds.groups.clone();
        assert!(ds.load_file(MISSING).is_err());
        assert!(ds.load_file("test_data/does_not_exist.xy").is_err());
        assert_eq!(ds.groups, before);
        assert_eq!(ds.files.len(), 1);
        assert_eq!(ds.reports.len(), 1);
    }

    #[test]
    fn compressed_exports() {
        let text = std::fs::read_to_string(SINGLE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let gz = dir.path().join("single_region.xy.gz");
        let bz = dir.path().join("single_region.xy.bz2");
        io::write_text(&gz, &text).unwrap();
        io::write_text(&bz, &text).unwrap();
        let plain = open(SINGLE, LoaderConfig::default()).unwrap();
        let packed = DataSet::open(&[gz, bz], LoaderConfig::default()).unwrap();
        assert_eq!(packed.groups.len(), 1);
        assert_eq!(packed.groups[0].regions.len(), 2);
        assert_eq!(packed.groups[0].regions[1], plain.groups[0].regions[0]);
    }

    #[test]
    fn json_model() {
        let ds = open(SINGLE, LoaderConfig::default()).unwrap();
        let v = serde_json::to_value(&ds).unwrap();
        let region = &v["groups"][0]["regions"][0];
        assert_eq!(region["name"], "Au 4f");
        assert_eq!(region["header"]["Pass Energy"], "20");
        assert_eq!(region["data"].as_array().map(|a| a.len()), Some(3));
        assert_eq!(v["config"]["on-shape-mismatch"], "skip");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum XpsError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("line {line}: expected 2 columns in data block, found {found}")]
    MalformedDataLine { line: usize, found: usize },

    #[error("line {line}: cannot parse '{token}' as a number: {source}")]
    ParseFloat {
        line: usize,
        token: String,
        source: ParseFloatError,
    },

    #[error("line {line}: sweep of region '{region}' has no data block")]
    MissingDataBlock { region: String, line: usize },

    #[error("line {line}: region '{region}' appears before any group")]
    RegionOutsideGroup { region: String, line: usize },

    #[error("line {line}: sweep of region '{region}' has {found} points, expected {expected}")]
    ShapeMismatch {
        region: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("cannot parse timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error("timestamp '{0}' needs a date and a time field")]
    MalformedTimestamp(String),

    #[error("unknown header label '{0}'")]
    UnknownLabel(String),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}
