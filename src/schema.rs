use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::tokenizer::{logical_records, split_fields, verticalize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Legacy,
    Extended,
}

// One column table per export variant. The legacy export keeps the offense
// name in column 4 when column 7 is blank; the extended export always fills
// column 7 and adds escalation/ticket-timing/user-agent columns past 24.
pub struct LayoutSpec {
    pub min_fields: usize,
    pub event_id: usize,
    pub analyst: usize,
    pub ticket_id: usize,
    pub event_type: usize,
    pub event_name: usize,
    pub event_name_fallback: Option<usize>,
    pub category: usize,
    pub magnitude: usize,
    pub tanggal: usize,
    pub waktu: usize,
    pub src_ip: usize,
    pub src_country: usize,
    pub dst_ip: usize,
    pub dst_port: usize,
    pub dst_asset: usize,
    pub query: usize,
    pub url: usize,
    pub note: Option<usize>,
    pub escalation: Option<usize>,
    pub ticket_time: Option<usize>,
    pub user_agent: Option<usize>,
}

pub const LEGACY: LayoutSpec = LayoutSpec {
    min_fields: 4,
    event_id: 0,
    analyst: 1,
    ticket_id: 2,
    event_type: 3,
    event_name: 7,
    event_name_fallback: Some(4),
    category: 8,
    magnitude: 9,
    tanggal: 10,
    waktu: 11,
    src_ip: 20,
    src_country: 21,
    dst_ip: 22,
    dst_port: 23,
    dst_asset: 24,
    query: 29,
    url: 28,
    note: None,
    escalation: None,
    ticket_time: None,
    user_agent: None,
};

pub const EXTENDED: LayoutSpec = LayoutSpec {
    min_fields: 8,
    event_id: 0,
    analyst: 1,
    ticket_id: 2,
    event_type: 3,
    event_name: 7,
    event_name_fallback: None,
    category: 8,
    magnitude: 9,
    tanggal: 10,
    waktu: 11,
    src_ip: 20,
    src_country: 21,
    dst_ip: 22,
    dst_port: 23,
    dst_asset: 24,
    query: 27,
    url: 28,
    note: Some(29),
    escalation: Some(25),
    ticket_time: Some(26),
    user_agent: Some(30),
};

impl Layout {
    pub fn spec(self) -> &'static LayoutSpec {
        match self {
            Layout::Legacy => &LEGACY,
            Layout::Extended => &EXTENDED,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Offense,
    LogActivity,
    Other,
}

impl EventKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            // "Offensess" is the literal type label in the exports, typo included.
            "Offensess" => EventKind::Offense,
            "Log Activity" => EventKind::LogActivity,
            _ => EventKind::Other,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub analyst: String,
    pub ticket_id: String,
    pub event_type: String,
    pub event_name: String,
    pub category: String,
    pub magnitude: String,
    pub tanggal: String,
    pub waktu: String,
    pub src_ip: String,
    pub src_country: String,
    pub dst_ip: String,
    pub dst_port: String,
    pub dst_asset: String,
    pub query: String,
    pub url: String,
    pub note: String,
    pub escalation: String,
    pub ticket_time: String,
    pub user_agent: String,
}

fn field(parts: &[String], idx: usize) -> String {
    parts.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
}

fn opt_field(parts: &[String], idx: Option<usize>) -> String {
    idx.map(|i| field(parts, i)).unwrap_or_default()
}

impl Event {
    pub fn from_record(parts: &[String], spec: &LayoutSpec) -> Option<Event> {
        if parts.len() < spec.min_fields {
            return None;
        }
        let mut event_name = field(parts, spec.event_name);
        if event_name.is_empty()
            && let Some(fb) = spec.event_name_fallback
        {
            event_name = field(parts, fb);
        }
        Some(Event {
            event_id: field(parts, spec.event_id),
            analyst: field(parts, spec.analyst),
            ticket_id: field(parts, spec.ticket_id),
            event_type: field(parts, spec.event_type),
            event_name,
            category: field(parts, spec.category),
            magnitude: field(parts, spec.magnitude),
            tanggal: field(parts, spec.tanggal),
            waktu: field(parts, spec.waktu),
            src_ip: verticalize(&field(parts, spec.src_ip)),
            src_country: verticalize(&field(parts, spec.src_country)),
            dst_ip: verticalize(&field(parts, spec.dst_ip)),
            dst_port: verticalize(&field(parts, spec.dst_port)),
            dst_asset: field(parts, spec.dst_asset),
            query: verticalize(&field(parts, spec.query)),
            url: verticalize(&field(parts, spec.url)),
            note: opt_field(parts, spec.note),
            escalation: opt_field(parts, spec.escalation),
            ticket_time: opt_field(parts, spec.ticket_time),
            user_agent: opt_field(parts, spec.user_agent),
        })
    }

    pub fn kind(&self) -> EventKind {
        EventKind::parse(&self.event_type)
    }

    // Placeholder keys match the names used in the detail templates.
    pub fn placeholder_pairs(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("event_id", &self.event_id),
            ("analyst", &self.analyst),
            ("ticket_id", &self.ticket_id),
            ("event_type", &self.event_type),
            ("event_name", &self.event_name),
            ("category", &self.category),
            ("magnitude", &self.magnitude),
            ("tanggal", &self.tanggal),
            ("waktu", &self.waktu),
            ("src_ip", &self.src_ip),
            ("src_country", &self.src_country),
            ("dst_ip", &self.dst_ip),
            ("dst_port", &self.dst_port),
            ("dst_asset", &self.dst_asset),
            ("query", &self.query),
            ("url", &self.url),
            ("note", &self.note),
            ("escalation", &self.escalation),
            ("ticket_time", &self.ticket_time),
            ("user_agent", &self.user_agent),
        ]
    }
}

pub fn parse_events(text: &str, layout: Layout, progress: bool) -> Vec<Event> {
    let spec = layout.spec();
    let records = logical_records(text);
    let pb = if progress { Some(indicatif::ProgressBar::new_spinner()) } else { None };
    let mut events: Vec<Event> = vec![];
    for (i, record) in records.iter().enumerate() {
        if let Some(ref pb) = pb
            && i % 500 == 0
        {
            pb.tick();
            pb.set_message(format!("Parsed {} records", i));
        }
        let parts = split_fields(record);
        match Event::from_record(&parts, spec) {
            Some(e) => events.push(e),
            None => {
                let preview: String = record.chars().take(50).collect();
                log::warn!("Record too short ({} fields), skipped: {}...", parts.len(), preview);
            }
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    events
}
