// Analyst exports are tab-delimited, but a field wrapped in quotes may span
// several physical lines. A line with an odd number of quote characters opens
// (or closes) such a span, so records are accumulated until the span closes
// and only then split on tabs.

pub fn logical_records(text: &str) -> Vec<String> {
    let mut records: Vec<String> = vec![];
    let mut buffer = String::new();
    let mut inside_quotes = false;
    for line in text.lines() {
        let quote_count = line.matches('"').count();
        if !inside_quotes {
            buffer = line.to_string();
            if quote_count % 2 == 1 {
                inside_quotes = true;
            } else {
                records.push(std::mem::take(&mut buffer));
            }
        } else {
            buffer.push('\n');
            buffer.push_str(line);
            if quote_count % 2 == 1 {
                inside_quotes = false;
                records.push(std::mem::take(&mut buffer));
            }
        }
    }
    // A trailing unterminated quote span cannot be a complete record.
    if !buffer.is_empty() && !inside_quotes {
        records.push(buffer);
    }
    records
}

pub fn split_fields(record: &str) -> Vec<String> {
    record.split('\t').map(unquote).collect()
}

fn unquote(field: &str) -> String {
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        field[1..field.len() - 1].replace("\"\"", "\"")
    } else {
        field.to_string()
    }
}

pub fn verticalize(raw: &str) -> String {
    if raw.is_empty() || raw == "-" {
        return "-".to_string();
    }
    let lines: Vec<&str> = raw
        .lines()
        .map(|l| l.trim().trim_end_matches("<br>").trim_end())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return "-".to_string();
    }
    format!("{}<br>", lines.join("<br>\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_single_records() {
        let recs = logical_records("a\tb\tc\nd\te\tf\n");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0], "a\tb\tc");
        assert_eq!(recs[1], "d\te\tf");
    }

    #[test]
    fn quoted_span_joins_physical_lines() {
        let recs = logical_records("1\tAlice\t\"first line\nsecond line\"\tend\n2\tBob\tx\ty\n");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0], "1\tAlice\t\"first line\nsecond line\"\tend");
    }

    #[test]
    fn embedded_newline_survives_field_split() {
        let recs = logical_records("1\t\"10.0.0.1\n10.0.0.2\"\tz\n");
        let fields = split_fields(&recs[0]);
        assert_eq!(fields[1], "10.0.0.1\n10.0.0.2");
    }

    #[test]
    fn unterminated_span_is_dropped() {
        let recs = logical_records("ok\trow\n1\t\"never closed\npartial");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0], "ok\trow");
    }

    #[test]
    fn unquote_strips_wrapping_and_doubled_quotes() {
        assert_eq!(unquote("\"hello \"\"there\"\"\""), "hello \"there\"");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn verticalize_examples() {
        assert_eq!(verticalize("10.0.0.1\n10.0.0.2\n"), "10.0.0.1<br>\n10.0.0.2<br>");
        assert_eq!(verticalize(""), "-");
        assert_eq!(verticalize("-"), "-");
        assert_eq!(verticalize("   \n  \n"), "-");
    }

    #[test]
    fn verticalize_is_idempotent() {
        let once = verticalize("10.0.0.1\n10.0.0.2\n");
        assert_eq!(verticalize(&once), once);
        assert_eq!(verticalize("-"), verticalize(&verticalize("-")));
    }
}
