use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::classifier::normalize_name;

pub const NAME_HEADER: &str = "Event Name";
pub const MAGNITUDE_HEADER: &str = "Magnitude";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MagnitudeEntry {
    pub event_name: String,
    pub magnitude: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    pub fn from_magnitude(m: u8) -> Self {
        match m {
            1..=3 => Severity::Low,
            4..=6 => Severity::Medium,
            7..=10 => Severity::High,
            _ => Severity::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Unknown => "Unknown",
        }
    }
}

#[derive(Default)]
pub struct MagnitudeTable {
    entries: Vec<MagnitudeEntry>,
    by_name: HashMap<String, u8>,
}

impl MagnitudeTable {
    pub fn load(path: &Path) -> Self {
        let mut reader = match csv::Reader::from_path(path) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Reference table {} unavailable: {}", path.display(), e);
                return MagnitudeTable::default();
            }
        };
        let (name_idx, mag_idx) = match reader.headers() {
            Ok(headers) => {
                let name = headers.iter().position(|h| h.trim() == NAME_HEADER);
                let mag = headers.iter().position(|h| h.trim() == MAGNITUDE_HEADER);
                match (name, mag) {
                    (Some(n), Some(m)) => (n, m),
                    _ => {
                        log::warn!("Reference table {} missing expected headers", path.display());
                        return MagnitudeTable::default();
                    }
                }
            }
            Err(e) => {
                log::warn!("Reference table {} unreadable: {}", path.display(), e);
                return MagnitudeTable::default();
            }
        };
        let mut table = MagnitudeTable::default();
        for record in reader.records() {
            let Ok(record) = record else { continue };
            let name = record.get(name_idx).unwrap_or("").trim();
            let raw_mag = record.get(mag_idx).unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            let Ok(magnitude) = raw_mag.parse::<u8>() else {
                log::debug!("Skipping reference row with non-integer magnitude: {}", name);
                continue;
            };
            table.insert(name.to_string(), magnitude);
        }
        table
    }

    fn insert(&mut self, event_name: String, magnitude: u8) {
        self.by_name.insert(normalize_name(&event_name), magnitude);
        self.entries.push(MagnitudeEntry { event_name, magnitude });
    }

    pub fn lookup(&self, name: &str) -> Option<u8> {
        self.by_name.get(&normalize_name(name)).copied()
    }

    // Reference names in file order, used as the classifier's reference list.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.event_name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub fn append_entry(path: &Path, name: &str, magnitude: u8) -> anyhow::Result<()> {
    if !(1..=10).contains(&magnitude) {
        bail!("magnitude must be between 1 and 10, got {}", magnitude);
    }
    let name = name.trim();
    if name.is_empty() {
        bail!("event name must not be empty");
    }
    let existing = MagnitudeTable::load(path);
    if existing.lookup(name).is_some() {
        bail!("'{}' is already in the reference table", name);
    }
    let fresh = !path.exists();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening reference table {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if fresh {
        writer.write_record([NAME_HEADER, MAGNITUDE_HEADER])?;
    }
    let mag = magnitude.to_string();
    writer.write_record([name, mag.as_str()])?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_bands() {
        assert_eq!(Severity::from_magnitude(1), Severity::Low);
        assert_eq!(Severity::from_magnitude(3), Severity::Low);
        assert_eq!(Severity::from_magnitude(4), Severity::Medium);
        assert_eq!(Severity::from_magnitude(6), Severity::Medium);
        assert_eq!(Severity::from_magnitude(7), Severity::High);
        assert_eq!(Severity::from_magnitude(10), Severity::High);
        assert_eq!(Severity::from_magnitude(0), Severity::Unknown);
        assert_eq!(Severity::from_magnitude(11), Severity::Unknown);
    }

    #[test]
    fn loads_reference_and_skips_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.csv");
        std::fs::write(
            &path,
            "Event Name,Magnitude\nBrute Force Login,7\nBroken Row,high\nDNS Tunneling,4\n",
        )
        .unwrap();
        let table = MagnitudeTable::load(&path);
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("brute force login"), Some(7));
        assert_eq!(table.lookup("DNS Tunneling"), Some(4));
        assert_eq!(table.lookup("Broken Row"), None);
        assert_eq!(table.names(), vec!["Brute Force Login", "DNS Tunneling"]);
    }

    #[test]
    fn missing_file_gives_empty_table() {
        let table = MagnitudeTable::load(Path::new("/nonexistent/db.csv"));
        assert!(table.is_empty());
    }

    #[test]
    fn append_creates_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.csv");
        append_entry(&path, "Port Scan", 3).unwrap();
        append_entry(&path, "Beacon", 8).unwrap();
        let table = MagnitudeTable::load(&path);
        assert_eq!(table.lookup("Port Scan"), Some(3));
        assert_eq!(table.lookup("Beacon"), Some(8));
    }

    #[test]
    fn append_rejects_out_of_range_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.csv");
        assert!(append_entry(&path, "X", 0).is_err());
        assert!(append_entry(&path, "X", 11).is_err());
        append_entry(&path, "X", 5).unwrap();
        assert!(append_entry(&path, "x", 5).is_err());
    }
}
