use std::fmt::{Display, Formatter};
use std::str::FromStr;
use regex::RegexSet;
use serde::Serialize;
use crate::XpsError;


/******************************
 ********** LABELS ***********
 ****************************/

/// One of the fixed header slots of a SPECS Prodigy text export, in slot order. Slot order is
/// also match priority: when a line satisfies more than one pattern the lowest slot wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Label {
    Group,
    Region,
    #[serde(rename = "Acquisition Date")]
    AcquisitionDate,
    Cycle,
    #[serde(rename = "Analysis Method")]
    AnalysisMethod,
    Analyser,
    #[serde(rename = "Analyser Slit")]
    AnalyserSlit,
    #[serde(rename = "Analyser Lens")]
    AnalyserLens,
    #[serde(rename = "Scan Mode")]
    ScanMode,
    #[serde(rename = "Curves/Scan")]
    CurvesPerScan,
    #[serde(rename = "Values/Curve")]
    ValuesPerCurve,
    #[serde(rename = "Dwell Time")]
    DwellTime,
    #[serde(rename = "Excitation Energy")]
    ExcitationEnergy,
    #[serde(rename = "Binding Energy")]
    BindingEnergy,
    #[serde(rename = "Pass Energy")]
    PassEnergy,
    #[serde(rename = "Bias Voltage")]
    BiasVoltage,
    #[serde(rename = "Detector Voltage")]
    DetectorVoltage,
    #[serde(rename = "Eff. Workfunction")]
    EffWorkfunction,
    Source,
    Comment,
    OrdinateRange,
    #[serde(rename = "Number of Scans")]
    NumberOfScans,
    /// anonymous trailing sweep counter, e.g. `# Cycle: 0, Curve: 0, Scan: 3`
    Scan,
}

impl Label {

    pub const ALL: [Label; 23] = [
        Label::Group,
        Label::Region,
        Label::AcquisitionDate,
        Label::Cycle,
        Label::AnalysisMethod,
        Label::Analyser,
        Label::AnalyserSlit,
        Label::AnalyserLens,
        Label::ScanMode,
        Label::CurvesPerScan,
        Label::ValuesPerCurve,
        Label::DwellTime,
        Label::ExcitationEnergy,
        Label::BindingEnergy,
        Label::PassEnergy,
        Label::BiasVoltage,
        Label::DetectorVoltage,
        Label::EffWorkfunction,
        Label::Source,
        Label::Comment,
        Label::OrdinateRange,
        Label::NumberOfScans,
        Label::Scan,
    ];

    /// the header key exactly as it is written in the export
    pub fn key(&self) -> &'static str {
        use Label::*;
        match self {
            Group => "Group",
            Region => "Region",
            AcquisitionDate => "Acquisition Date",
            Cycle => "Cycle",
            AnalysisMethod => "Analysis Method",
            Analyser => "Analyser",
            AnalyserSlit => "Analyser Slit",
            AnalyserLens => "Analyser Lens",
            ScanMode => "Scan Mode",
            CurvesPerScan => "Curves/Scan",
            ValuesPerCurve => "Values/Curve",
            DwellTime => "Dwell Time",
            ExcitationEnergy => "Excitation Energy",
            BindingEnergy => "Binding Energy",
            PassEnergy => "Pass Energy",
            BiasVoltage => "Bias Voltage",
            DetectorVoltage => "Detector Voltage",
            EffWorkfunction => "Eff. Workfunction",
            Source => "Source",
            Comment => "Comment",
            OrdinateRange => "OrdinateRange",
            NumberOfScans => "Number of Scans",
            Scan => "Scan",
        }
    }

    /// position of this label in the slot table
    pub fn slot(&self) -> usize {
        *self as usize
    }

    /// false for the two structural labels (Group, Region)
    pub fn is_metadata(&self) -> bool {
        !matches!(self, Label::Group | Label::Region)
    }

    /// Regex source for a whole header line. The value is capture group 1.
    pub fn pattern(&self) -> String {
        match self {
            Label::Cycle => r"^#\s*Cycle:\s*(\d*)$".to_string(),
            // the sweep counter is not anchored to the comment marker
            Label::Scan => r"^.*Scan:\s*(\d+)$".to_string(),
            _ => {
                let words = self.key()
                    .split(' ')
                    .map(regex::escape)
                    .collect::<Vec<String>>()
                    .join(r"\s+");
                format!(r"^#\s*{words}:\s*(.*)$")
            }
        }
    }

    /// all slot patterns compiled into one set, indices follow [Label::ALL]
    pub fn regex_set() -> Result<RegexSet, regex::Error> {
        RegexSet::new(Self::ALL.iter().map(|l| l.pattern()))
    }
}

impl FromStr for Label {
    type Err = XpsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::ALL.iter()
            .find(|l| l.key() == s)
            .copied()
            .ok_or_else(|| XpsError::UnknownLabel(s.to_string()))
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
