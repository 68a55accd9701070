//! Regions covered by the per-state birth records dataset

use crate::Result;
use anyhow::Context;

/// What we know about a region of the dataset
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RegionInfo {
    /// Two-letter code, as used in data files and their names
    pub code: &'static str,

    /// Human-readable name
    pub name: &'static str,
}
//
impl RegionInfo {
    /// Name of this region's data file within the data directory
    pub fn file_name(&self) -> String {
        format!("{}.TXT", self.code)
    }
}

/// Get information about a region from its (case-insensitive) code
pub fn get(code: &str) -> Result<RegionInfo> {
    let code = code.trim();
    ALL.iter()
        .find(|region| region.code.eq_ignore_ascii_case(code))
        .copied()
        .with_context(|| format!("unknown region code {code:?}"))
}

/// Every region of the dataset, sorted by code
pub fn all() -> &'static [RegionInfo] {
    &ALL[..]
}

/// The 50 states and the District of Columbia
static ALL: [RegionInfo; 51] = [
    region("AK", "Alaska"),
    region("AL", "Alabama"),
    region("AR", "Arkansas"),
    region("AZ", "Arizona"),
    region("CA", "California"),
    region("CO", "Colorado"),
    region("CT", "Connecticut"),
    region("DC", "District of Columbia"),
    region("DE", "Delaware"),
    region("FL", "Florida"),
    region("GA", "Georgia"),
    region("HI", "Hawaii"),
    region("IA", "Iowa"),
    region("ID", "Idaho"),
    region("IL", "Illinois"),
    region("IN", "Indiana"),
    region("KS", "Kansas"),
    region("KY", "Kentucky"),
    region("LA", "Louisiana"),
    region("MA", "Massachusetts"),
    region("MD", "Maryland"),
    region("ME", "Maine"),
    region("MI", "Michigan"),
    region("MN", "Minnesota"),
    region("MO", "Missouri"),
    region("MS", "Mississippi"),
    region("MT", "Montana"),
    region("NC", "North Carolina"),
    region("ND", "North Dakota"),
    region("NE", "Nebraska"),
    region("NH", "New Hampshire"),
    region("NJ", "New Jersey"),
    region("NM", "New Mexico"),
    region("NV", "Nevada"),
    region("NY", "New York"),
    region("OH", "Ohio"),
    region("OK", "Oklahoma"),
    region("OR", "Oregon"),
    region("PA", "Pennsylvania"),
    region("RI", "Rhode Island"),
    region("SC", "South Carolina"),
    region("SD", "South Dakota"),
    region("TN", "Tennessee"),
    region("TX", "Texas"),
    region("UT", "Utah"),
    region("VA", "Virginia"),
    region("VT", "Vermont"),
    region("WA", "Washington"),
    region("WI", "Wisconsin"),
    region("WV", "West Virginia"),
    region("WY", "Wyoming"),
];

const fn region(code: &'static str, name: &'static str) -> RegionInfo {
    RegionInfo { code, name }
}
