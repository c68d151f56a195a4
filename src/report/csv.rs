//! CSV reporter

use super::{cluster_label, NO_UPDATE};
use crate::review::ReviewRow;

const HEADER: [&str; 6] = ["File", "Category", "Style", "Review", "Updated", "Error"];

/// Characters of the rewrite kept in the `Updated` column
const UPDATED_PREVIEW_CHARS: usize = 100;

pub fn render(rows: &[ReviewRow]) -> String {
    let mut out = String::new();
    push_record(&mut out, HEADER.iter().map(|h| h.to_string()));
    for row in rows {
        push_record(&mut out, fields(row).into_iter());
    }
    out
}

fn fields(row: &ReviewRow) -> [String; 6] {
    let updated = match (&row.updated, &row.error) {
        (Some(code), _) => code.chars().take(UPDATED_PREVIEW_CHARS).collect(),
        // nothing was reviewed, so there is nothing to say about an update
        (None, Some(_)) if row.review.is_none() => String::new(),
        (None, _) => NO_UPDATE.to_string(),
    };

    [
        row.file.display().to_string(),
        row.category.clone().unwrap_or_default(),
        row.style.map(cluster_label).unwrap_or_default(),
        row.review.clone().unwrap_or_default(),
        updated,
        row.error.clone().unwrap_or_default(),
    ]
}

fn push_record(out: &mut String, fields: impl Iterator<Item = String>) {
    let escaped: Vec<String> = fields.map(|f| escape_field(&f)).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_rows;

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(escape_field("cr\rhere"), "\"cr\rhere\"");
    }

    #[test]
    fn test_render_rows() {
        let csv = render(&sample_rows());
        let mut lines = csv.split('\n');
        assert_eq!(lines.next(), Some("File,Category,Style,Review,Updated,Error"));

        assert!(csv.contains(
            "src/main/java/A.java,class,cluster 2,\"Fine, but \"\"final\"\" helps, really.\nUpdated Code:\nclass A {}\",class A {},\n"
        ));
        assert!(csv.contains("src/main/java/B.java,method,cluster 0,Looks good.,No update provided.,\n"));
        assert!(csv.contains("src/main/java/C.java,,,,,API error: 500 - boom\n"));
    }

    #[test]
    fn test_updated_is_truncated() {
        let mut rows = sample_rows();
        rows.truncate(1);
        rows[0].updated = Some("é".repeat(150));
        rows[0].review = Some("short".into());

        let csv = render(&rows);
        let record = csv.lines().nth(1).unwrap();
        let updated = record.split(',').nth(4).unwrap();
        assert_eq!(updated.chars().count(), 100);
    }

    #[test]
    fn test_empty_report_has_header_only() {
        assert_eq!(render(&[]), "File,Category,Style,Review,Updated,Error\n");
    }
}
