// Copyright (c) Contributors to the sv project.
// SPDX-License-Identifier: Apache-2.0

//! Reading and writing `.sv_cfg` documents.
//!
//! The format is a flat INI dialect: `[section]` headers, `key = value`
//! entries (`:` also accepted), bare keys with no value, and values that
//! continue across indented lines. Keys are folded to lower case on both
//! read and write; section names keep their case because the registry
//! distinguishes lower-case environment sections from the `SCRIPTS` table.

use indexmap::IndexMap;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./cfgfile_test.rs"]
mod cfgfile_test;

/// An ordered, mutable view of one configuration file.
///
/// Declaration order is preserved so that a read, modify, write cycle
/// (as performed by registration) keeps unrelated sections intact.
#[derive(Debug, Clone, Default)]
pub struct CfgDocument {
    sections: IndexMap<String, IndexMap<String, Option<String>>>,
}

impl CfgDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document text. `origin` names the source for error reporting.
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let mut doc = Self::new();
        let mut current: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim_end();
            let trimmed = line.trim_start();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if line.starts_with(char::is_whitespace) {
                // Continuation of the previous value
                let (Some(section), Some(key)) = (&current, &last_key) else {
                    return Err(invalid(origin, idx + 1, "continuation without a key"));
                };
                let entry = doc
                    .sections
                    .get_mut(section)
                    .and_then(|s| s.get_mut(key))
                    .expect("section and key recorded during parse");
                *entry = match entry.take() {
                    Some(value) => Some(format!("{value}\n{trimmed}")),
                    None => Some(trimmed.to_string()),
                };
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let Some(name) = rest.strip_suffix(']') else {
                    return Err(invalid(origin, idx + 1, "unterminated section header"));
                };
                if name.is_empty() {
                    return Err(invalid(origin, idx + 1, "empty section name"));
                }
                doc.sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                last_key = None;
                continue;
            }

            let Some(section) = &current else {
                return Err(invalid(origin, idx + 1, "entry outside of any section"));
            };

            let (key, value) = match line.find(['=', ':']) {
                Some(pos) => (
                    line[..pos].trim().to_lowercase(),
                    Some(line[pos + 1..].trim().to_string()),
                ),
                None => (line.trim().to_lowercase(), None),
            };
            if key.is_empty() {
                return Err(invalid(origin, idx + 1, "entry without a key"));
            }
            doc.sections
                .get_mut(section)
                .expect("current section recorded during parse")
                .insert(key.clone(), value);
            last_key = Some(key);
        }

        Ok(doc)
    }

    /// Section names in declaration order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Add an empty section if not already present.
    pub fn add_section(&mut self, name: &str) {
        self.sections.entry(name.to_string()).or_default();
    }

    /// Value for `key` in `section`, or None when absent or value-less.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)?
            .get(&key.to_lowercase())?
            .as_deref()
    }

    /// All entries of a section in declaration order.
    pub fn items(&self, section: &str) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.sections
            .get(section)
            .into_iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Set `key` in `section`, creating the section as needed.
    pub fn set(&mut self, section: &str, key: &str, value: Option<&str>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_lowercase(), value.map(str::to_string));
    }
}

impl std::fmt::Display for CfgDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, entries) in &self.sections {
            writeln!(f, "[{name}]")?;
            for (key, value) in entries {
                match value {
                    Some(value) => writeln!(f, "{key} = {}", value.replace('\n', "\n\t"))?,
                    None => writeln!(f, "{key}")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn invalid(origin: &str, line: usize, message: &str) -> Error {
    Error::InvalidConfig {
        path: origin.to_string(),
        line,
        message: message.to_string(),
    }
}
