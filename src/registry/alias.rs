// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Source id aliases (device MAC -> display name)

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use super::DeviceIdentity;
use crate::error::ConfigError;

/// Static mapping from raw source ids to display ids.
///
/// Applied to every identity entering the registry, both at discovery and at
/// ingestion, so one physical device always lands on one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (raw, alias) pairs. Empty aliases are skipped; two raw ids
    /// sharing one alias is an error.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut aliases = HashMap::new();
        let mut owners: HashMap<String, String> = HashMap::new();

        for (raw, alias) in pairs {
            let raw = raw.into().trim().to_string();
            let alias = alias.into().trim().to_string();
            if raw.is_empty() || alias.is_empty() {
                continue;
            }
            if let Some(first) = owners.get(&alias) {
                if first != &raw {
                    return Err(ConfigError::DuplicateAlias {
                        alias,
                        first: first.clone(),
                        second: raw,
                    });
                }
            }
            owners.insert(alias.clone(), raw.clone());
            aliases.insert(raw, alias);
        }

        Ok(Self { aliases })
    }

    /// Load from a device sheet with a header row. `key_column` holds the raw
    /// source id (usually `MAC`), `alias_column` the display id.
    pub fn load_csv(path: &Path, key_column: &str, alias_column: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let pairs = parse_csv(&content, key_column, alias_column).map_err(|reason| {
            ConfigError::DeviceTable {
                path: path.display().to_string(),
                reason,
            }
        })?;
        let table = Self::from_pairs(pairs)?;
        info!("Loaded {} device aliases from {:?}", table.len(), path);
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Display id for a raw source id
    pub fn resolve<'a>(&'a self, raw: &'a str) -> &'a str {
        self.aliases.get(raw).map(String::as_str).unwrap_or(raw)
    }

    /// Remap the source part of an identity
    pub fn apply(&self, identity: &DeviceIdentity) -> DeviceIdentity {
        DeviceIdentity::new(
            identity.subject_id.clone(),
            self.resolve(&identity.source_id).to_string(),
        )
    }
}

/// Extract (key, alias) pairs from a device sheet
fn parse_csv(content: &str, key_column: &str, alias_column: &str) -> Result<Vec<(String, String)>, String> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or_else(|| "file is empty".to_string())?;
    let header = split_csv_line(header);

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| format!("no '{}' column in header {:?}", name, header))
    };
    let key_idx = column(key_column)?;
    let alias_idx = column(alias_column)?;

    let mut pairs = Vec::new();
    for (n, line) in lines.enumerate() {
        let row = split_csv_line(line);
        match (row.get(key_idx), row.get(alias_idx)) {
            (Some(key), Some(alias)) => pairs.push((key.clone(), alias.clone())),
            _ => debug!("Skipping short device row {}: {:?}", n + 2, row),
        }
    }
    Ok(pairs)
}

/// Split one CSV record, honouring double-quoted fields
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}
