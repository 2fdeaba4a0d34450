//! `ConfigSource` over `serde_json::Value` (DESIGN NOTES §9) -- the
//! alternate document format `-c config.json` selects.

use super::ConfigSource;
use crate::{Context as _, Result};

use serde_json::Value;
use std::fs;
use std::path::Path;

pub struct JsonConfigSource {
    root: Value,
}

impl JsonConfigSource {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_str(&text)
            .with_context(|| format!("failed to parse JSON config {}", path.display()))
    }

    pub fn from_str(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text).context("invalid JSON document")?;
        Ok(Self { root })
    }

    fn navigate<'a>(&'a self, path: &[&str]) -> Option<&'a Value> {
        let mut cur = &self.root;
        for key in path {
            cur = cur.as_object()?.get(*key)?;
        }
        Some(cur)
    }
}

impl ConfigSource for JsonConfigSource {
    fn get_string(&self, path: &[&str]) -> Option<String> {
        self.navigate(path).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    fn get_bool(&self, path: &[&str]) -> Option<bool> {
        self.navigate(path).and_then(Value::as_bool)
    }

    fn get_u64(&self, path: &[&str]) -> Option<u64> {
        self.navigate(path).and_then(Value::as_u64)
    }

    fn for_each_in_array(&self, path: &[&str], f: &mut dyn FnMut(&str)) {
        if let Some(Value::Array(items)) = self.navigate(path) {
            for item in items {
                if let Some(s) = item.as_str() {
                    f(s);
                }
            }
        }
    }

    fn for_each_in_mapping(&self, path: &[&str], f: &mut dyn FnMut(&str, &str)) {
        if let Some(Value::Object(map)) = self.navigate(path) {
            for (k, v) in map {
                let scalar = match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Bool(b) => Some(if *b { "on".to_string() } else { "off".to_string() }),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                };
                if let Some(s) = scalar {
                    f(k, &s);
                }
            }
        }
    }

    fn for_each_key(&self, path: &[&str], f: &mut dyn FnMut(&str)) {
        if let Some(Value::Object(map)) = self.navigate(path) {
            for k in map.keys() {
                f(k);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigates_nested_objects() {
        let src = JsonConfigSource::from_str(r#"{"a": {"b": "hello"}}"#).unwrap();
        assert_eq!(src.get_string(&["a", "b"]), Some("hello".to_string()));
    }

    #[test]
    fn array_of_strings_iterates_in_order() {
        let src = JsonConfigSource::from_str(r#"{"ignore": ["x", "y"]}"#).unwrap();
        let mut out = Vec::new();
        src.for_each_in_array(&["ignore"], &mut |s| out.push(s.to_string()));
        assert_eq!(out, vec!["x".to_string(), "y".to_string()]);
    }
}
