use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event as XmlEvent;
use serde::{Deserialize, Serialize};

// Column order of the spreadsheet export; matches the child elements of each
// OffenseForm in the offense XML.
pub const OFFENSE_COLUMNS: [&str; 20] = [
    "id",
    "magnitude",
    "closeUser",
    "formattedClosedDate",
    "localizedCloseReason",
    "deviceOrderBy",
    "escapedFormattedOffenseSource",
    "formattedOffenseType",
    "description",
    "severity",
    "eventCount",
    "eventDescription",
    "startTime",
    "endTime",
    "attacker",
    "target",
    "deviceCount",
    "targetNetwork",
    "attackerNetwork",
    "usernameOrderBy",
];

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OffenseRow {
    values: HashMap<String, String>,
}

impl OffenseRow {
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    #[cfg(test)]
    fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }
}

pub fn parse_offenses(xml: &str) -> Vec<OffenseRow> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut rows: Vec<OffenseRow> = vec![];
    let mut in_offense = false;
    let mut cur: HashMap<String, String> = HashMap::new();
    let mut cur_name: Option<String> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(e)) => {
                let en = e.name();
                let name = String::from_utf8_lossy(en.as_ref()).into_owned();
                if name == "OffenseForm" {
                    in_offense = true;
                    cur.clear();
                } else if in_offense {
                    cur_name = Some(name);
                }
            }
            Ok(XmlEvent::End(e)) => {
                let en = e.name();
                let name = String::from_utf8_lossy(en.as_ref()).into_owned();
                if name == "OffenseForm" {
                    in_offense = false;
                    rows.push(OffenseRow { values: std::mem::take(&mut cur) });
                } else {
                    cur_name = None;
                }
            }
            Ok(XmlEvent::Text(t)) => {
                if in_offense && let Some(n) = cur_name.as_ref() {
                    let v = String::from_utf8_lossy(t.as_ref()).trim().to_string();
                    if !v.is_empty() {
                        cur.insert(n.clone(), v);
                    }
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => {
                log::warn!("Offense XML parse stopped: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    rows
}

// First non-empty close date in document order; names the spreadsheet file.
pub fn first_closed_date(rows: &[OffenseRow]) -> Option<&str> {
    rows.iter()
        .map(|r| r.get("formattedClosedDate"))
        .find(|d| !d.is_empty())
}
