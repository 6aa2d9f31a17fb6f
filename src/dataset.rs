use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use log::{debug, trace, warn};
use serde::Serialize;
use crate::XpsError;
use crate::blocks::{BlockCursor, DataBlockExtractor};
use crate::config::{GroupPolicy, LoaderConfig, MismatchPolicy};
use crate::header::{HeaderLine, HeaderTokenizer};
use crate::header_defs::Label;
use crate::io;
use crate::region::{Group, Region, ShapeMismatch, SweepOutcome};


/// Walk position of the header state machine. Indices point into the staged groups of the
/// file being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    NoGroup,
    InGroup { group: usize },
    InRegion { group: usize, region: usize },
}

/// A sweep that was read but not stored because it did not fit its region's axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedSweep {
    pub group: String,
    pub region: String,
    /// line of the header entry that triggered the sweep
    pub line: usize,
    pub mismatch: ShapeMismatch,
}

/// What happened while loading one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub source: String,
    pub header_lines: usize,
    pub data_blocks: usize,
    pub groups: usize,
    pub regions: usize,
    /// sweeps stored in the data matrices
    pub sweeps: usize,
    pub rejected: Vec<RejectedSweep>,
    pub unconsumed_blocks: usize,
}

impl LoadReport {
    fn new(source: &str) -> Self {
        LoadReport { source: source.to_string(), ..Default::default() }
    }

    /// true when every sweep was stored and every data block was used
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.unconsumed_blocks == 0
    }
}

impl Display for LoadReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} groups, {} regions, {} sweeps",
               self.source, self.groups, self.regions, self.sweeps)?;
        if !self.rejected.is_empty() {
            write!(f, ", {} rejected", self.rejected.len())?;
        }
        if self.unconsumed_blocks > 0 {
            write!(f, ", {} unused data blocks", self.unconsumed_blocks)?;
        }
        Ok(())
    }
}

/// Single pass over the header lines of one file.
struct FileParser {
    config: LoaderConfig,
    state: ParseState,
    cursor: BlockCursor,
    groups: Vec<Group>,
    report: LoadReport,
}

impl FileParser {

    fn step(&mut self, line: HeaderLine) -> Result<(), XpsError> {
        match line.label {
            Label::Group => self.open_group(&line),
            Label::Region => self.open_region(&line),
            _ => match self.state {
                ParseState::InRegion { group, region } => self.accumulate(group, region, line),
                _ => {
                    trace!("ignoring {line} outside of a region");
                    Ok(())
                }
            },
        }
    }

    fn open_group(&mut self, line: &HeaderLine) -> Result<(), XpsError> {
        self.report.groups += 1;
        let existing = match self.config.groups {
            GroupPolicy::Merge => self.groups.iter().position(|g| g.name == line.value),
            GroupPolicy::AlwaysCreate => None,
        };
        let group = match existing {
            Some(idx) => {
                debug!("line {}: reopening group {}", line.line, line.value);
                idx
            }
            None => {
                debug!("line {}: new group {}", line.line, line.value);
                self.groups.push(Group::new(&line.value));
                self.groups.len() - 1
            }
        };
        self.state = ParseState::InGroup { group };
        Ok(())
    }

    fn open_region(&mut self, line: &HeaderLine) -> Result<(), XpsError> {
        let group = match self.state {
            ParseState::NoGroup => Err(XpsError::RegionOutsideGroup {
                region: line.value.clone(),
                line: line.line,
            })?,
            ParseState::InGroup { group } | ParseState::InRegion { group, .. } => group,
        };
        self.report.regions += 1;
        let region = self.groups[group].add_region(Region::new(&line.value));
        debug!("line {}: region {} in group {}", line.line, line.value, self.groups[group].name);
        self.state = ParseState::InRegion { group, region };
        Ok(())
    }

    /// A label already present in the header (other than the scan counter) marks a new sweep;
    /// anything else is stored as metadata.
    fn accumulate(&mut self, group: usize, region: usize, line: HeaderLine) -> Result<(), XpsError> {
        let g = &mut self.groups[group];
        let r = &mut g.regions[region];

        if line.label == Label::Scan || !r.has_header(line.label) {
            r.set_header(line.label, &line.value);
            return Ok(());
        }

        let block = self.cursor.next_block().ok_or_else(|| XpsError::MissingDataBlock {
            region: r.name.clone(),
            line: line.line,
        })?;
        trace!("line {}: sweep of {} from data block at line {}", line.line, r.name, block.line);
        let sweep = block.parse()?;
        r.time.push(line.value);

        match r.add_sweep(sweep) {
            SweepOutcome::Accepted { .. } => self.report.sweeps += 1,
            SweepOutcome::Rejected(mismatch) => {
                match self.config.on_shape_mismatch {
                    MismatchPolicy::Fail => Err(XpsError::ShapeMismatch {
                        region: r.name.clone(),
                        line: line.line,
                        expected: mismatch.expected,
                        found: mismatch.found,
                    })?,
                    MismatchPolicy::Repair => {
                        r.time.pop();
                    }
                    MismatchPolicy::Skip => {}
                }
                warn!("line {}: dropped sweep of region {} ({mismatch})", line.line, r.name);
                self.report.rejected.push(RejectedSweep {
                    group: g.name.clone(),
                    region: r.name.clone(),
                    line: line.line,
                    mismatch,
                });
            }
        }
        Ok(())
    }

    fn finish(mut self) -> (Vec<Group>, LoadReport) {
        self.report.unconsumed_blocks = self.cursor.remaining();
        if self.report.unconsumed_blocks > 0 {
            warn!("{}: {} data blocks were not assigned to any sweep",
                  self.report.source, self.report.unconsumed_blocks);
        }
        (self.groups, self.report)
    }
}

/// Groups and regions read from one or more export files, in load order.
#[derive(Debug, Serialize)]
pub struct DataSet {
    pub files: Vec<PathBuf>,
    pub groups: Vec<Group>,
    pub reports: Vec<LoadReport>,
    config: LoaderConfig,
    #[serde(skip)]
    tokenizer: HeaderTokenizer,
    #[serde(skip)]
    extractor: DataBlockExtractor,
}

impl DataSet {

    pub fn new(config: LoaderConfig) -> Result<Self, XpsError> {
        Ok(DataSet {
            files: vec![],
            groups: vec![],
            reports: vec![],
            config,
            tokenizer: HeaderTokenizer::new()?,
            extractor: DataBlockExtractor::new()?,
        })
    }

    /// Load every file in order into a new data set. Stops at the first file that fails.
    pub fn open<P: AsRef<Path>>(paths: &[P], config: LoaderConfig) -> Result<Self, XpsError> {
        let mut ds = DataSet::new(config)?;
        for p in paths {
            ds.load_file(p)?;
        }
        Ok(ds)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read and parse one export file (plain, `.gz` or `.bz2`).
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&LoadReport, XpsError> {
        let path = path.as_ref();
        let text = io::read_text(path)?;
        self.load_str(&text, &path.to_string_lossy())?;
        self.files.push(path.to_path_buf());
        Ok(self.last_report())
    }

    /// Parse export text. The groups of the text are only added once the whole text parsed
    /// without error; on error the data set is left as it was.
    pub fn load_str(&mut self, text: &str, source: &str) -> Result<&LoadReport, XpsError> {
        let lines = self.tokenizer.tokenize(text);
        let blocks = self.extractor.extract(text);
        debug!("{source}: {} header lines, {} data blocks", lines.len(), blocks.len());

        let mut report = LoadReport::new(source);
        report.header_lines = lines.len();
        report.data_blocks = blocks.len();

        let mut parser = FileParser {
            config: self.config,
            state: ParseState::NoGroup,
            cursor: BlockCursor::new(blocks),
            groups: vec![],
            report,
        };
        for line in lines {
            parser.step(line)?;
        }
        let (groups, report) = parser.finish();
        self.merge(groups);
        self.reports.push(report);
        Ok(self.last_report())
    }

    fn merge(&mut self, groups: Vec<Group>) {
        for group in groups {
            let existing = match self.config.groups {
                GroupPolicy::Merge => self.groups.iter_mut().find(|g| g.name == group.name),
                GroupPolicy::AlwaysCreate => None,
            };
            match existing {
                Some(g) => g.regions.extend(group.regions),
                None => self.groups.push(group),
            }
        }
    }

    fn last_report(&self) -> &LoadReport {
        // only called right after a report was pushed
        &self.reports[self.reports.len() - 1]
    }

    /// first group with the given name
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// every group with the given name, more than one only with [GroupPolicy::AlwaysCreate]
    pub fn groups_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Group> + 'a {
        self.groups.iter().filter(move |g| g.name == name)
    }

    pub fn n_regions(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Display for DataSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, group) in self.groups.iter().enumerate() {
            writeln!(f, "{i}: {}", group.name)?;
            for (j, region) in group.regions.iter().enumerate() {
                let name = region.header_value(Label::Region).unwrap_or(&region.name);
                writeln!(f, "->{j}: {name}")?;
            }
        }
        Ok(())
    }
}
