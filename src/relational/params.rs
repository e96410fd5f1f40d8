use serde_json::Value as JsonValue;
use tiberius::Query;

/// Bind JSON parameter values onto a query in placeholder order.
///
/// Scalars map onto native driver types; arrays and objects travel as JSON
/// text, matching how the platform backend stores them.
pub(crate) fn bind_json_params(query: &mut Query<'_>, params: &[JsonValue]) {
    for param in params {
        match param {
            JsonValue::Null => query.bind(Option::<String>::None),
            JsonValue::Bool(b) => query.bind(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query.bind(i);
                } else {
                    query.bind(n.as_f64().unwrap_or(f64::NAN));
                }
            }
            JsonValue::String(s) => query.bind(s.clone()),
            composite @ (JsonValue::Array(_) | JsonValue::Object(_)) => {
                query.bind(composite.to_string());
            }
        }
    }
}
