use crate::magnitude::{MagnitudeTable, Severity};

pub const NO_EVENTS: &str = "Tidak ada event terdeteksi";

// Literal replacement only. Placeholders with no matching key stay in the
// output untouched.
pub fn fill(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in pairs {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

// Severity placeholders are only resolved when the reference table knows the
// event name; otherwise they stay literal like any other unknown placeholder.
pub fn apply_severity(text: &str, event_name: &str, table: &MagnitudeTable) -> String {
    match table.lookup(event_name) {
        Some(m) => {
            let severity = Severity::from_magnitude(m).label();
            let mag = m.to_string();
            fill(text, &[("severity", severity), ("sev_magnitude", &mag)])
        }
        None => text.to_string(),
    }
}

pub fn numbered_list(counts: &[(String, usize)]) -> String {
    if counts.is_empty() {
        return NO_EVENTS.to_string();
    }
    counts
        .iter()
        .enumerate()
        .map(|(i, (name, count))| {
            format!("{}. {} ({} event{})", i + 1, name, count, if *count > 1 { "s" } else { "" })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_wa(
    template: &str,
    greeting: &str,
    hours: &str,
    date: &str,
    offenses: &[(String, usize)],
    logs: &[(String, usize)],
) -> String {
    let offenses_str = numbered_list(offenses);
    let logs_str = numbered_list(logs);
    fill(
        template,
        &[
            ("salam", greeting),
            ("tanggal", date),
            ("jam", hours),
            ("offenses", &offenses_str),
            ("log_activity", &logs_str),
        ],
    )
}

// Starter detail template listing the standard placeholders, written by the
// generate-template mode so analysts only have to adjust the wording.
pub fn detail_skeleton(event_name: &str) -> String {
    format!(
        "*{}*\n\
         Ticket: {{ticket_id}}\n\
         Analyst: {{analyst}}\n\
         Tanggal: {{tanggal}} {{waktu}}\n\
         Severity: {{severity}} (magnitude {{sev_magnitude}})\n\
         Category: {{category}}\n\n\
         Source IP:\n{{src_ip}}\n\
         Source Country:\n{{src_country}}\n\
         Destination IP:\n{{dst_ip}}\n\
         Destination Port:\n{{dst_port}}\n\
         Asset: {{dst_asset}}\n\n\
         URL:\n{{url}}\n\
         Query:\n{{query}}\n\n\
         Catatan: {{note}}\n",
        event_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn fill_replaces_known_keys_only() {
        let out = fill("Hello {name}, severity {severity}", &[("name", "X")]);
        assert_eq!(out, "Hello X, severity {severity}");
    }

    #[test]
    fn fill_replaces_every_occurrence() {
        let out = fill("{a} and {a}", &[("a", "1")]);
        assert_eq!(out, "1 and 1");
    }

    #[test]
    fn severity_pass_requires_lookup_hit() {
        let empty = MagnitudeTable::default();
        let out = apply_severity("sev {severity}/{sev_magnitude}", "Beacon", &empty);
        assert_eq!(out, "sev {severity}/{sev_magnitude}");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.csv");
        std::fs::write(&path, "Event Name,Magnitude\nBeacon,8\n").unwrap();
        let table = MagnitudeTable::load(Path::new(&path));
        let out = apply_severity("sev {severity}/{sev_magnitude}", "Beacon", &table);
        assert_eq!(out, "sev High/8");
    }

    #[test]
    fn numbered_list_pluralizes() {
        let counts = vec![("Beacon".to_string(), 2), ("Scan".to_string(), 1)];
        assert_eq!(numbered_list(&counts), "1. Beacon (2 events)\n2. Scan (1 event)");
        assert_eq!(numbered_list(&[]), NO_EVENTS);
    }

    #[test]
    fn wa_rendering_fills_summary_placeholders() {
        let template = "{salam}, laporan {tanggal} ({jam})\nOffenses:\n{offenses}\nLogs:\n{log_activity}";
        let out = render_wa(
            template,
            "Selamat Pagi",
            "00.00 - 08.00",
            "06/08/2026",
            &[("Beacon".to_string(), 3)],
            &[],
        );
        assert!(out.starts_with("Selamat Pagi, laporan 06/08/2026 (00.00 - 08.00)"));
        assert!(out.contains("1. Beacon (3 events)"));
        assert!(out.contains(NO_EVENTS));
    }

    #[test]
    fn skeleton_keeps_placeholders_literal() {
        let s = detail_skeleton("Beacon");
        assert!(s.starts_with("*Beacon*"));
        assert!(s.contains("{ticket_id}"));
        assert!(s.contains("{src_ip}"));
        assert!(s.contains("{severity}"));
    }
}
