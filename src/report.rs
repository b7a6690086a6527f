use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::classifier::count_by_name;
use crate::console;
use crate::magnitude::MagnitudeTable;
use crate::schema::Event;
use crate::template;

pub struct ShiftInfo {
    pub key: &'static str,
    pub greeting: &'static str,
    pub hours: &'static str,
}

pub const SHIFTS: [ShiftInfo; 3] = [
    ShiftInfo { key: "1", greeting: "Selamat Sore", hours: "08.00 - 16.00" },
    ShiftInfo { key: "2", greeting: "Selamat Malam", hours: "16.00 - 00.00" },
    ShiftInfo { key: "3", greeting: "Selamat Pagi", hours: "00.00 - 08.00" },
];

pub fn shift_info(key: &str) -> Option<&'static ShiftInfo> {
    SHIFTS.iter().find(|s| s.key == key)
}

pub fn default_shift_key(hour: u32) -> &'static str {
    if hour < 8 {
        "3"
    } else if hour < 16 {
        "1"
    } else {
        "2"
    }
}

pub fn default_shift(hour: u32) -> &'static ShiftInfo {
    match default_shift_key(hour) {
        "1" => &SHIFTS[0],
        "2" => &SHIFTS[1],
        _ => &SHIFTS[2],
    }
}

pub fn shift_dir(output_dir: &Path, shift_key: &str) -> PathBuf {
    output_dir.join(format!("shift{}", shift_key))
}

// Outputs are regenerated from the same input each run. A failed delete is
// reported and the run continues on top of whatever is left.
pub fn clean_shift_folder(output_dir: &Path, shift_key: &str) -> anyhow::Result<PathBuf> {
    let dir = shift_dir(output_dir, shift_key);
    if dir.exists()
        && let Err(e) = std::fs::remove_dir_all(&dir)
    {
        log::warn!("Could not clear shift folder {}: {}", dir.display(), e);
    }
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

pub fn write_wa(
    offenses: &[&Event],
    logs: &[&Event],
    shift: &ShiftInfo,
    wa_template: &str,
    date: &str,
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    let offense_counts = count_by_name(offenses);
    let log_counts = count_by_name(logs);
    let text = template::render_wa(
        wa_template,
        shift.greeting,
        shift.hours,
        date,
        &offense_counts,
        &log_counts,
    );
    let out_file = dir.join(format!("wa_shift{}.txt", shift.key));
    std::fs::write(&out_file, text).with_context(|| format!("writing {}", out_file.display()))?;
    console::info(&format!("WA summary written to {}", out_file.display()));
    Ok(out_file)
}

// One detail file per (event_name, ticket_id, event_type); repeats within the
// batch are skipped, re-runs overwrite.
pub fn write_event_details(
    events: &[Event],
    dir: &Path,
    template_dir: &Path,
    magnitudes: &MagnitudeTable,
) -> usize {
    let mut written: HashSet<(String, String, String)> = HashSet::new();
    let mut count = 0;
    for event in events {
        let key = (event.event_name.clone(), event.ticket_id.clone(), event.event_type.clone());
        if written.contains(&key) {
            continue;
        }
        let template_path = template_dir.join(format!("{}.txt", event.event_name));
        if !template_path.exists() {
            log::warn!("No detail template for '{}', skipped", event.event_name);
            continue;
        }
        let tpl = match std::fs::read_to_string(&template_path) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Detail template {} unreadable: {}", template_path.display(), e);
                continue;
            }
        };
        let filled = template::fill(&tpl, &event.placeholder_pairs());
        let filled = template::apply_severity(&filled, &event.event_name, magnitudes);
        let out_path = dir.join(format!(
            "{}_{}_{}.txt",
            event.event_name, event.ticket_id, event.event_type
        ));
        if let Err(e) = std::fs::write(&out_path, filled) {
            log::warn!("Could not write {}: {}", out_path.display(), e);
            continue;
        }
        console::ok(&format!(
            "Detail for '{}' (ticket {}) written to {}",
            event.event_name,
            event.ticket_id,
            out_path.display()
        ));
        written.insert(key);
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, ticket: &str, kind: &str) -> Event {
        Event {
            event_name: name.to_string(),
            ticket_id: ticket.to_string(),
            event_type: kind.to_string(),
            src_ip: "10.0.0.1<br>".to_string(),
            ..Event::default()
        }
    }

    #[test]
    fn default_shift_follows_clock() {
        assert_eq!(default_shift_key(0), "3");
        assert_eq!(default_shift_key(7), "3");
        assert_eq!(default_shift_key(8), "1");
        assert_eq!(default_shift_key(15), "1");
        assert_eq!(default_shift_key(16), "2");
        assert_eq!(default_shift_key(23), "2");
    }

    #[test]
    fn shift_table_lookup() {
        assert_eq!(shift_info("2").unwrap().greeting, "Selamat Malam");
        assert!(shift_info("4").is_none());
    }

    #[test]
    fn clean_folder_recreates_empty_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = clean_shift_folder(root.path(), "1").unwrap();
        std::fs::write(dir.join("stale.txt"), "x").unwrap();
        let dir = clean_shift_folder(root.path(), "1").unwrap();
        assert!(dir.exists());
        assert!(!dir.join("stale.txt").exists());
    }

    #[test]
    fn wa_file_contains_numbered_summary() {
        let root = tempfile::tempdir().unwrap();
        let a = event("Beacon", "T1", "Offensess");
        let b = event("Beacon", "T2", "Offensess");
        let offenses: Vec<&Event> = vec![&a, &b];
        let shift = shift_info("1").unwrap();
        let out = write_wa(
            &offenses,
            &[],
            shift,
            "{salam} {jam} {tanggal}\n{offenses}\n--\n{log_activity}",
            "06/08/2026",
            root.path(),
        )
        .unwrap();
        let text = std::fs::read_to_string(out).unwrap();
        assert!(text.contains("Selamat Sore 08.00 - 16.00 06/08/2026"));
        assert!(text.contains("1. Beacon (2 events)"));
        assert!(text.contains(template::NO_EVENTS));
    }

    #[test]
    fn details_dedup_on_composite_key() {
        let root = tempfile::tempdir().unwrap();
        let templates = root.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("Beacon.txt"), "ip {src_ip} ticket {ticket_id}").unwrap();
        let out_dir = root.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();

        let events = vec![
            event("Beacon", "T1", "Offensess"),
            event("Beacon", "T1", "Offensess"),
            event("Beacon", "T2", "Offensess"),
            event("NoTemplate", "T3", "Offensess"),
        ];
        let n = write_event_details(&events, &out_dir, &templates, &MagnitudeTable::default());
        assert_eq!(n, 2);
        assert!(out_dir.join("Beacon_T1_Offensess.txt").exists());
        assert!(out_dir.join("Beacon_T2_Offensess.txt").exists());
        assert!(!out_dir.join("NoTemplate_T3_Offensess.txt").exists());
        let text = std::fs::read_to_string(out_dir.join("Beacon_T1_Offensess.txt")).unwrap();
        assert_eq!(text, "ip 10.0.0.1<br> ticket T1");
    }

    #[test]
    fn details_inject_severity_when_known() {
        let root = tempfile::tempdir().unwrap();
        let templates = root.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("Beacon.txt"), "{severity}/{sev_magnitude}").unwrap();
        std::fs::write(root.path().join("db.csv"), "Event Name,Magnitude\nBeacon,2\n").unwrap();
        let table = MagnitudeTable::load(&root.path().join("db.csv"));
        let out_dir = root.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();
        write_event_details(&[event("Beacon", "T1", "Offensess")], &out_dir, &templates, &table);
        let text = std::fs::read_to_string(out_dir.join("Beacon_T1_Offensess.txt")).unwrap();
        assert_eq!(text, "Low/2");
    }
}
