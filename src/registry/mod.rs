// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Device registry - every device seen during this session

mod alias;
mod record;

pub use alias::AliasTable;
pub use record::{DeviceIdentity, DeviceRecord, IngestMode};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::sensors::{Sample, SensorType};
use crate::status::StatusTable;

/// Buffer length statistics across all devices and sensors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferStats {
    pub min: usize,
    pub avg: f64,
    pub max: usize,
}

/// Insertion-ordered set of [`DeviceRecord`]s keyed by (aliased) identity.
///
/// Records are never removed: a device that stops reporting ages out to
/// DISCONNECTED instead of disappearing.
#[derive(Debug, Clone)]
pub struct Registry {
    records: Vec<DeviceRecord>,
    index: HashMap<DeviceIdentity, usize>,
    aliases: AliasTable,
    table: StatusTable,
    buffer_len: Option<usize>,
}

impl Registry {
    pub fn new(table: StatusTable, aliases: AliasTable, buffer_len: Option<usize>) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            aliases,
            table,
            buffer_len,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    /// Create records for identities not seen before. Identities are raw
    /// upstream ids; aliases are applied here. Returns how many were added.
    pub fn discover<I>(&mut self, identities: I) -> usize
    where
        I: IntoIterator<Item = DeviceIdentity>,
    {
        let mut added = 0;
        for raw in identities {
            let identity = self.aliases.apply(&raw);
            if self.index.contains_key(&identity) {
                continue;
            }
            info!("Discovered device {} (upstream source {})", identity, raw.source_id);
            self.index.insert(identity.clone(), self.records.len());
            self.records
                .push(DeviceRecord::new(identity, raw.source_id, self.buffer_len));
            added += 1;
        }
        added
    }

    pub fn contains(&self, identity: &DeviceIdentity) -> bool {
        self.index.contains_key(identity)
    }

    /// Look up a record by its display identity
    pub fn find(&self, identity: &DeviceIdentity) -> Option<&DeviceRecord> {
        self.index.get(identity).map(|&i| &self.records[i])
    }

    /// Apply a fetched batch. `identity` is the raw upstream identity from
    /// the response header.
    pub fn ingest(
        &mut self,
        identity: &DeviceIdentity,
        sensor: SensorType,
        samples: Vec<Sample>,
        mode: IngestMode,
        now: DateTime<Utc>,
    ) -> Result<usize, IngestError> {
        let resolved = self.aliases.apply(identity);
        let Some(&i) = self.index.get(&resolved) else {
            warn!("Dropping {} batch for undiscovered device {}", sensor, resolved);
            return Err(IngestError::UnknownIdentity {
                subject_id: resolved.subject_id,
                source_id: resolved.source_id,
            });
        };

        let record = &mut self.records[i];
        let stored = record.ingest(sensor, samples, mode, now, &self.table);
        debug!(
            "Status of {} @ {}: {} ({} stored, {} buffered)",
            sensor,
            resolved,
            record.status(sensor),
            stored,
            record.buffer(sensor).len()
        );
        Ok(stored)
    }

    /// Recompute every device's metadata against `now`
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        for record in self.records.iter_mut() {
            record.refresh(now, &self.table);
        }
    }

    /// Raw identities to address the upstream API with, in registry order
    pub fn upstream_identities(&self) -> Vec<DeviceIdentity> {
        self.records.iter().map(|r| r.upstream_identity()).collect()
    }

    pub fn buffer_stats(&self) -> Option<BufferStats> {
        let lengths: Vec<usize> = self
            .records
            .iter()
            .flat_map(|r| r.buffer_lengths())
            .collect();
        let min = *lengths.iter().min()?;
        let max = *lengths.iter().max()?;
        let avg = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        Some(BufferStats { min, avg, max })
    }
}
