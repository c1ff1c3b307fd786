use crate::types::ProjectRecord;
use crate::util::format_number;

fn or_na<T: ToString>(v: Option<T>) -> String {
    v.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

/// Hover text shared by map markers and strip-chart points.
pub fn project_tooltip(location: Option<&str>, r: &ProjectRecord) -> String {
    format!(
        "<b>Location:</b> {}<br><b>Type of Work:</b> {}<br><b>Cost:</b> Php {}<br>\
         <b>Start Year:</b> {}<br><b>Completion Year:</b> {}<br><b>Contractor:</b> {}",
        escape_html(location.unwrap_or("N/A")),
        escape_html(r.type_of_work.as_deref().unwrap_or("N/A")),
        format_number(r.contract_cost, 0),
        or_na(r.start_year),
        or_na(r.completion_year),
        escape_html(r.contractor.as_deref().unwrap_or("N/A")),
    )
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_records;

    #[test]
    fn tooltip_lists_every_field() {
        let r = &sample_records()[0];
        let t = project_tooltip(r.municipality.as_deref(), r);
        assert!(t.contains("<b>Location:</b> Manila"));
        assert!(t.contains("<b>Cost:</b> Php 48,500,000"));
        assert!(t.contains("<b>Start Year:</b> 2022"));
        assert!(t.contains("<b>Completion Year:</b> 2023"));
        assert!(t.contains("<b>Contractor:</b> ACME BUILDERS"));
    }

    #[test]
    fn tooltip_marks_missing_values() {
        let mut r = sample_records()[0].clone();
        r.start_year = None;
        r.contractor = Some("A&B <Builders>".into());
        let t = project_tooltip(None, &r);
        assert!(t.contains("<b>Location:</b> N/A"));
        assert!(t.contains("<b>Start Year:</b> N/A"));
        assert!(t.contains("A&amp;B &lt;Builders&gt;"));
    }
}
