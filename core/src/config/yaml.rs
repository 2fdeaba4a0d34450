//! `ConfigSource` over `serde_yaml::Value` (DESIGN NOTES §9), the default
//! document format for `rpminspect.yaml` and profile overlays.

use super::ConfigSource;
use crate::{Context as _, Result};

use serde_yaml::Value;
use std::fs;
use std::path::Path;

pub struct YamlConfigSource {
    root: Value,
}

impl YamlConfigSource {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_str(&text)
            .with_context(|| format!("failed to parse YAML config {}", path.display()))
    }

    pub fn from_str(text: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(text).context("invalid YAML document")?;
        Ok(Self { root })
    }

    fn navigate<'a>(&'a self, path: &[&str]) -> Option<&'a Value> {
        let mut cur = &self.root;
        for key in path {
            cur = cur.as_mapping()?.get(Value::String(key.to_string()))?;
        }
        Some(cur)
    }
}

impl ConfigSource for YamlConfigSource {
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
        if let Some(Value::Sequence(items)) = self.navigate(path) {
            for item in items {
                if let Some(s) = item.as_str() {
                    f(s);
                } else if let Value::Number(n) = item {
                    f(&n.to_string());
                }
            }
        }
    }

    fn for_each_in_mapping(&self, path: &[&str], f: &mut dyn FnMut(&str, &str)) {
        if let Some(Value::Mapping(map)) = self.navigate(path) {
            for (k, v) in map {
                if let (Some(k), Some(v)) = (k.as_str(), scalar_str(v)) {
                    f(k, &v);
                }
            }
        }
    }

    fn for_each_key(&self, path: &[&str], f: &mut dyn FnMut(&str)) {
        if let Some(Value::Mapping(map)) = self.navigate(path) {
            for k in map.keys() {
                if let Some(k) = k.as_str() {
                    f(k);
                }
            }
        }
    }
}

fn scalar_str(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "on".to_string() } else { "off".to_string() }),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigates_nested_mappings() {
        let src = YamlConfigSource::from_str("a:\n  b: hello\n").unwrap();
        assert_eq!(src.get_string(&["a", "b"]), Some("hello".to_string()));
    }

    #[test]
    fn for_each_in_mapping_visits_on_off_values() {
        let src = YamlConfigSource::from_str("inspections:\n  addedfiles: on\n  symlinks: off\n").unwrap();
        let mut seen = Vec::new();
        src.for_each_in_mapping(&["inspections"], &mut |k, v| seen.push((k.to_string(), v.to_string())));
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("addedfiles".to_string(), "on".to_string()),
                ("symlinks".to_string(), "off".to_string())
            ]
        );
    }

    #[test]
    fn missing_path_yields_none() {
        let src = YamlConfigSource::from_str("a: 1\n").unwrap();
        assert_eq!(src.get_string(&["nonexistent", "path"]), None);
    }
}
