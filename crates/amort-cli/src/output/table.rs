use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar fields and the grouped day/month/year conversions go into a
/// summary table; the repayment schedule gets a table of its own.
pub fn print_table(value: &Value) {
    let envelope = value.as_object();
    let result = envelope
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result {
        print_summary_table(map);

        if let Some(Value::Array(repayments)) = map.get("repayments") {
            println!();
            print_schedule_table(repayments);
        }
    } else {
        println!("{}", result);
    }

    if let Some(Value::String(meth)) = envelope.and_then(|m| m.get("methodology")) {
        println!("\nMethodology: {}", meth);
    }
}

fn print_summary_table(map: &serde_json::Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);

    for (key, val) in map {
        match val {
            // The repayment schedule is rendered separately
            Value::Array(_) => continue,
            Value::Object(group) => {
                for (unit, v) in group {
                    let label = format!("{}.{}", key, unit);
                    builder.push_record([label.as_str(), &format_value(v)]);
                }
            }
            _ => builder.push_record([key.as_str(), &format_value(val)]),
        }
    }

    println!("{}", Table::from(builder));
}

fn print_schedule_table(repayments: &[Value]) {
    if repayments.is_empty() {
        println!("(no repayments)");
        return;
    }

    let headers = ["period", "principal", "interest", "total"];
    let mut builder = Builder::default();
    builder.push_record(headers);

    for row in repayments {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(record);
        }
    }

    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
