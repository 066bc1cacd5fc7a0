//! JSON rendering (§4.10): pretty-printed, serde-driven — any `Serialize`
//! result set can be exported this way.

use serde::Serialize;

use crate::error::ExportError;

pub fn to_json<T: Serialize>(value: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_pretty_json() {
        let out = to_json(&json!({"a": 1})).unwrap();
        assert!(out.contains('\n'));
    }
}
