//! Tab-separated output without quoting

use crate::store::Value;

pub fn format_raw(rows: &[Vec<Value>]) -> String {
    let mut out = String::new();
    for row in rows {
        let fields: Vec<String> = row.iter().map(Value::to_string).collect();
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }
    out
}
