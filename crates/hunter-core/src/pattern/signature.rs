use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// A named pattern as written by hand, before compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSignature {
    pub name: String,
    pub pattern: String,
}

impl PatternSignature {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSet {
    pub patterns: Vec<PatternSignature>,
}

impl PatternSet {
    pub fn get(&self, name: &str) -> Option<&PatternSignature> {
        self.patterns
            .iter()
            .find(|sig| sig.name.eq_ignore_ascii_case(name))
    }
}

pub fn load_patterns<P: AsRef<Path>>(path: P) -> Result<PatternSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_patterns<P: AsRef<Path>>(path: P, patterns: &PatternSet) -> Result<()> {
    let content = serde_json::to_string_pretty(patterns)?;
    fs::write(path, content)?;
    Ok(())
}
