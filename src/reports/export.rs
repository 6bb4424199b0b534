use super::ReportError;
use serde::Serialize;
use serde_json::Value;

/// Serializes `rows` as CSV.
///
/// The header is the field names of the first row, in declaration order. Later
/// rows are written against that header; missing fields and nulls are empty cells.
pub fn export_csv<T: Serialize>(rows: &[T]) -> Result<String, ReportError> {
    let records = rows
        .iter()
        .map(|row| match serde_json::to_value(row)? {
            Value::Object(map) => Ok(map),
            _ => Err(ReportError::NotARecord),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let Some(first) = records.first() else {
        return Ok(String::new());
    };
    let header: Vec<String> = first.keys().cloned().collect();

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        header
            .iter()
            .map(|h| escape(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in &records {
        let cells: Vec<String> = header
            .iter()
            .map(|key| escape(&cell(record.get(key))))
            .collect();
        lines.push(cells.join(","));
    }
    Ok(lines.join("\n"))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested) => nested.to_string(),
    }
}

/// Quotes a cell containing a comma, quote or line break
fn escape(raw: &str) -> String {
    if raw.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Row {
        product: &'static str,
        quantity: u32,
        note: Option<&'static str>,
    }

    #[test]
    fn header_follows_first_row_fields() {
        let csv = export_csv(&[
            Row { product: "Sugar", quantity: 2, note: None },
            Row { product: "Rice, Pishori", quantity: 1, note: Some("said \"fresh\"") },
        ])
        .unwrap();

        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "product,quantity,note");
        assert_eq!(lines[1], "Sugar,2,");
        assert_eq!(lines[2], "\"Rice, Pishori\",1,\"said \"\"fresh\"\"\"");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let rows: Vec<Row> = Vec::new();
        assert_eq!(export_csv(&rows).unwrap(), "");
    }

    #[test]
    fn later_rows_use_first_row_header() {
        let csv = export_csv(&[json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4})]).unwrap();
        assert_eq!(csv, "a,b\n1,2\n,3");
    }

    #[test]
    fn scalars_are_rejected() {
        assert!(matches!(export_csv(&[1, 2]), Err(ReportError::NotARecord)));
    }
}
