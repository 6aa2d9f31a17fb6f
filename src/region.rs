use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::io;
use std::io::Write;
use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;
use crate::XpsError;
use crate::blocks::Sweep;
use crate::header_defs::Label;


/// strptime-style layout of the date and time fields of an acquisition timestamp
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M:%S%.f";

/// A named, ordered collection of regions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub name: String,
    pub regions: Vec<Region>,
}

impl Group {

    pub fn new(name: &str) -> Self {
        Group { name: name.to_string(), regions: vec![] }
    }

    /// appends the region and returns its index in the group
    pub fn add_region(&mut self, region: Region) -> usize {
        self.regions.push(region);
        self.regions.len() - 1
    }

    /// first region with the given name
    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShapeMismatch {
    /// points on the region's energy axis
    pub expected: usize,
    /// points in the rejected sweep
    pub found: usize,
}

impl Display for ShapeMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "expected {} points, found {}", self.expected, self.found)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// sweep stored as row `row` of the data matrix
    Accepted { row: usize },
    /// sweep discarded, the data matrix is unchanged
    Rejected(ShapeMismatch),
}

impl SweepOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SweepOutcome::Accepted { .. })
    }
}

/// A scan definition with its acquisition metadata and every sweep recorded for it.
///
/// `x` is shared by all sweeps and is taken from the first one. Row `i` of `data` holds the
/// intensities of sweep `i`, and `time[i]` the raw acquisition timestamp that introduced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub name: String,
    pub header: BTreeMap<Label, String>,
    pub x: Vec<f64>,
    pub data: Vec<Vec<f64>>,
    pub time: Vec<String>,
}

impl Region {

    pub fn new(name: &str) -> Self {
        let mut header = BTreeMap::new();
        header.insert(Label::Region, name.to_string());
        Region {
            name: name.to_string(),
            header,
            x: vec![],
            data: vec![],
            time: vec![],
        }
    }

    pub fn header_value(&self, label: Label) -> Option<&str> {
        self.header.get(&label).map(|v| v.as_str())
    }

    pub fn has_header(&self, label: Label) -> bool {
        self.header.contains_key(&label)
    }

    /// stores or overwrites a header entry, returning the previous value
    pub fn set_header(&mut self, label: Label, value: &str) -> Option<String> {
        self.header.insert(label, value.to_string())
    }

    /// Add one sweep. The first sweep fixes the energy axis; later sweeps must have the same
    /// number of points or they are rejected and the region is left as it was.
    pub fn add_sweep(&mut self, sweep: Sweep) -> SweepOutcome {
        if self.x.is_empty() {
            self.x = sweep.x;
            self.data = vec![sweep.y];
            return SweepOutcome::Accepted { row: 0 };
        }
        if sweep.y.len() != self.x.len() {
            return SweepOutcome::Rejected(ShapeMismatch {
                expected: self.x.len(),
                found: sweep.y.len(),
            });
        }
        self.data.push(sweep.y);
        SweepOutcome::Accepted { row: self.data.len() - 1 }
    }

    /// rows of the data matrix
    pub fn n_sweeps(&self) -> usize {
        self.data.len()
    }

    /// points on the energy axis
    pub fn n_points(&self) -> usize {
        self.x.len()
    }

    pub fn sweep(&self, index: usize) -> Option<&[f64]> {
        self.data.get(index).map(|row| row.as_slice())
    }

    /// true when every sweep row has exactly one timestamp
    pub fn is_aligned(&self) -> bool {
        self.time.len() == self.data.len()
    }

    /// The raw timestamps parsed into absolute date-times, one per entry of `time`.
    pub fn time_axis(&self) -> Result<Vec<NaiveDateTime>, XpsError> {
        self.time.iter().map(|t| parse_timestamp(t)).collect()
    }

    /// Seconds elapsed since the first timestamp, one per entry of `time`. The first offset is
    /// always exactly zero.
    pub fn offset_axis(&self) -> Result<Vec<f64>, XpsError> {
        let times = self.time_axis()?;
        let Some(&first) = times.first() else {
            return Ok(vec![]);
        };
        let offsets = times.iter().enumerate().map(|(i, &t)| {
            if i == 0 {
                0.0
            } else {
                seconds(t - first)
            }
        }).collect();
        Ok(offsets)
    }

    /// Write the sweeps as a tab-separated table: the energy axis in the first column followed
    /// by one intensity column per sweep. `offsets`, when given, are written as a comment row.
    pub fn write_table<W: Write>(&self, w: &mut W, offsets: Option<&[f64]>) -> io::Result<()> {
        writeln!(w, "# Region: {}", self.name)?;
        if let Some(offsets) = offsets {
            let cols: Vec<String> = offsets.iter().map(|o| o.to_string()).collect();
            writeln!(w, "# offset\t{}", cols.join("\t"))?;
        }
        for (i, x) in self.x.iter().enumerate() {
            write!(w, "{x}")?;
            for row in &self.data {
                match row.get(i) {
                    Some(y) => write!(w, "\t{y}")?,
                    None => write!(w, "\t")?,
                }
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.header {
            writeln!(f, "{key}:\t{value}")?;
        }
        Ok(())
    }
}

/// Parse an acquisition timestamp of the form `<date> <time> <zone>`. Only the date and time
/// fields are used, anything after them is ignored.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, XpsError> {
    let mut fields = value.split_whitespace();
    let (Some(date), Some(time)) = (fields.next(), fields.next()) else {
        return Err(XpsError::MalformedTimestamp(value.to_string()));
    };
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), TIMESTAMP_FORMAT)
        .map_err(|source| XpsError::Timestamp { value: value.to_string(), source })
}

fn seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}
