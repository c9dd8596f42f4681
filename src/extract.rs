//!
//! Flattening of raw API records into report cells.
//!
use serde_json::Value;

/// Written for every value the API did not return
pub const NOT_AVAILABLE: &str = "N/A";

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Lookup with default on nested JSON objects
pub trait Lookup {
    /// Walk a dotted path, `"block_storage.primary.size"`
    fn lookup(&self, path: &str) -> Option<&Value>;

    /// Render the value at `path`, or `default` when it is missing or null
    fn text_or(&self, path: &str, default: &str) -> String {
        match self.lookup(path) {
            None | Some(Value::Null) => default.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(v) => {
                let mut out = String::new();
                write_literal(v, &mut out);
                out
            }
        }
    }

    /// Numeric value at `path`
    fn number(&self, path: &str) -> Option<f64> {
        self.lookup(path).and_then(Value::as_f64)
    }
}

impl Lookup for Value {
    fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |v, key| v.get(key))
    }
}

impl Lookup for serde_json::Map<String, Value> {
    fn lookup(&self, path: &str) -> Option<&Value> {
        let (first, rest) = match path.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (path, None),
        };
        let v = self.get(first)?;
        match rest {
            Some(rest) => v.lookup(rest),
            None => Some(v),
        }
    }
}

/// Non-string values as the reports have always shown them: `True`/`False`, `None`,
/// and `{'key': 'value'}` / `['a', 'b']` for nested objects and lists.
fn write_literal(v: &Value, out: &mut String) {
    match v {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_quoted(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_quoted(key, out);
                out.push_str(": ");
                write_literal(item, out);
            }
            out.push('}');
        }
    }
}

fn write_quoted(s: &str, out: &mut String) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Round to two decimals, halves to even (`0.125` gives `0.12`)
#[must_use]
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Bytes to GiB, two decimals. Missing values count as zero.
#[must_use]
pub fn bytes_to_gb(bytes: Option<f64>) -> f64 {
    match bytes {
        Some(b) if b != 0.0 => round2(b / BYTES_PER_GB),
        _ => 0.0,
    }
}

/// `part` as a percentage of `total`, two decimals. Zero when there is no total.
#[must_use]
pub fn percentage(part: Option<f64>, total: Option<f64>) -> f64 {
    match total {
        Some(total) if total != 0.0 => round2(part.unwrap_or(0.0) / total * 100.0),
        _ => 0.0,
    }
}

/// Whole numbers keep one decimal (`1.0`), everything else uses the shortest form.
#[must_use]
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn gigabytes() {
        assert_eq!(bytes_to_gb(Some(1_073_741_824.0)), 1.0);
        assert_eq!(bytes_to_gb(Some(536_870_912.0)), 0.5);
        assert_eq!(bytes_to_gb(Some(0.0)), 0.0);
        assert_eq!(bytes_to_gb(None), 0.0);

        assert_eq!(bytes_to_gb(Some(1.0)), 0.0);
        assert_eq!(bytes_to_gb(Some(1_000_000.0)), 0.0);
        assert_eq!(bytes_to_gb(Some(123_456_789_012.0)), 114.98);
        assert_eq!(bytes_to_gb(Some(5_368_709_127.0)), 5.0);
        // 300 GiB minus a little
        assert_eq!(bytes_to_gb(Some(322_122_547_199.0)), 300.0);

        // Multiples of 128 MiB land exactly on a half
        assert_eq!(bytes_to_gb(Some(134_217_728.0)), 0.12);
        assert_eq!(bytes_to_gb(Some(402_653_184.0)), 0.38);
        assert_eq!(bytes_to_gb(Some(671_088_640.0)), 0.62);
        assert_eq!(bytes_to_gb(Some(1_207_959_552.0)), 1.12);
    }

    #[test]
    fn percentages() {
        assert_eq!(percentage(Some(536_870_912.0), Some(1_073_741_824.0)), 50.0);
        assert_eq!(percentage(Some(1.0), Some(3.0)), 33.33);
        assert_eq!(percentage(Some(2.0), Some(3.0)), 66.67);
        assert_eq!(percentage(Some(10.0), Some(0.0)), 0.0);
        assert_eq!(percentage(Some(10.0), None), 0.0);
        assert_eq!(percentage(None, Some(10.0)), 0.0);
        assert_eq!(percentage(Some(1.0), Some(800.0)), 0.12);
        assert_eq!(percentage(Some(3.0), Some(800.0)), 0.38);
        assert_eq!(round2(100.0 - percentage(Some(1.0), Some(800.0))), 99.88);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(1.0), "1.0");
        assert_eq!(format_number(0.0), "0.0");
        assert_eq!(format_number(50.0), "50.0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(33.33), "33.33");
        assert_eq!(format_number(1234.56), "1234.56");
    }

    #[test]
    fn nested_lookup() {
        let aggr = json!({
            "name": "aggr1",
            "node": {"name": "node-01"},
            "block_storage": {"primary": {"size": 100, "used": null}},
            "snaplock": false,
            "tags": ["a", "b"],
        });

        assert_eq!(aggr.text_or("node.name", NOT_AVAILABLE), "node-01");
        assert_eq!(aggr.text_or("node.uuid", NOT_AVAILABLE), NOT_AVAILABLE);
        assert_eq!(aggr.text_or("name.inner", NOT_AVAILABLE), NOT_AVAILABLE);
        assert_eq!(aggr.text_or("block_storage.primary.used", "none"), "none");
        assert_eq!(aggr.text_or("block_storage.primary.size", NOT_AVAILABLE), "100");
        assert_eq!(aggr.text_or("snaplock", NOT_AVAILABLE), "False");
        assert_eq!(aggr.text_or("tags", NOT_AVAILABLE), "['a', 'b']");
        assert_eq!(aggr.number("block_storage.primary.size"), Some(100.0));
        assert_eq!(aggr.number("block_storage.primary.used"), None);
        assert_eq!(aggr.number("node.name"), None);

        let stats = json!({"days_to_full": 12, "inodes": {"used": 5}});
        let stats = stats.as_object().unwrap();
        assert_eq!(stats.text_or("days_to_full", NOT_AVAILABLE), "12");
        assert_eq!(stats.text_or("inodes.used", NOT_AVAILABLE), "5");
        assert_eq!(stats.text_or("growth_rate", NOT_AVAILABLE), NOT_AVAILABLE);
    }

    #[test]
    fn nested_values_as_literals() {
        let vol = json!({
            "efficiency": {"compression": "inline", "dedupe": true, "policy": null},
            "qos": {"max_throughput": {"iops": 5000, "mbps": 12.5}},
            "comment": ["it's", "say \"hi\"", "a\\b"],
        });

        assert_eq!(vol.text_or("efficiency.dedupe", NOT_AVAILABLE), "True");
        assert_eq!(
            vol.text_or("efficiency", NOT_AVAILABLE),
            "{'compression': 'inline', 'dedupe': True, 'policy': None}"
        );
        assert_eq!(
            vol.text_or("qos", NOT_AVAILABLE),
            "{'max_throughput': {'iops': 5000, 'mbps': 12.5}}"
        );
        assert_eq!(
            vol.text_or("comment", NOT_AVAILABLE),
            r#"["it's", 'say "hi"', 'a\\b']"#
        );
    }
}
