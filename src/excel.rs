use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::offense_xml::{OFFENSE_COLUMNS, OffenseRow};
use crate::report::ShiftInfo;

const MONTH_NAMES: [(&str, &str); 12] = [
    ("Jan", "Januari"),
    ("Feb", "Februari"),
    ("Mar", "Maret"),
    ("Apr", "April"),
    ("May", "Mei"),
    ("Jun", "Juni"),
    ("Jul", "Juli"),
    ("Aug", "Agustus"),
    ("Sep", "September"),
    ("Oct", "Oktober"),
    ("Nov", "November"),
    ("Dec", "Desember"),
];

pub const UNKNOWN_DATE: &str = "UnknownDate";

// "5 Sep 2025 09.41.39" -> "05 September 2025". Unmapped month abbreviations
// pass through unchanged.
pub fn localized_date(closed_date: &str) -> String {
    let parts: Vec<&str> = closed_date.split_whitespace().collect();
    if parts.len() < 3 {
        return UNKNOWN_DATE.to_string();
    }
    let day = format!("{:0>2}", parts[0]);
    let month = MONTH_NAMES
        .iter()
        .find(|(abbr, _)| *abbr == parts[1])
        .map(|(_, full)| *full)
        .unwrap_or(parts[1]);
    format!("{} {} {}", day, month, parts[2])
}

pub fn workbook_name(shift: &ShiftInfo, date: &str) -> String {
    format!(
        "FollowUp & Closed Offenses List - {}, {} {} Shift {}.xlsx",
        shift.greeting, shift.hours, date, shift.key
    )
}

pub fn write_xlsx(rows: &[OffenseRow], path: &Path) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let header = Format::new().set_bold();
    for (col, name) in OFFENSE_COLUMNS.iter().enumerate() {
        sheet.write_with_format(0, col as u16, *name, &header)?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, name) in OFFENSE_COLUMNS.iter().enumerate() {
            sheet.write_string((r + 1) as u32, c as u16, row.get(name))?;
        }
    }
    workbook.save(path)?;
    Ok(())
}
