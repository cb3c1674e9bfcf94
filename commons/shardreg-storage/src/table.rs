use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RecordVisitor;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct Record {
    pub id: u64,
    pub key: Vec<String>,
    pub value: Value,
}

/// Ordered record map shared by the in-process backends.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordTable {
    records: BTreeMap<Vec<String>, (u64, Value)>,
    next_id: u64,
}

impl RecordTable {
    pub fn from_records(records: Vec<Record>, next_id: u64) -> Self {
        let mut table = RecordTable {
            records: BTreeMap::new(),
            next_id,
        };
        for record in records {
            table.next_id = table.next_id.max(record.id + 1);
            table.records.insert(record.key, (record.id, record.value));
        }
        table
    }

    pub fn to_records(&self) -> Vec<Record> {
        self.records
            .iter()
            .map(|(key, (id, value))| Record {
                id: *id,
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn put(&mut self, key: Vec<String>, value: Value) {
        if let Some(entry) = self.records.get_mut(&key) {
            entry.1 = value;
            return;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(key, (id, value));
    }

    pub fn scan(&self, prefix: &[&str], visitor: &mut RecordVisitor<'_>) {
        let start: Vec<String> = prefix.iter().map(|p| p.to_string()).collect();
        for (key, (id, value)) in self.records.range(start..) {
            if !has_prefix(key, prefix) {
                break;
            }
            if !visitor(*id, key.as_slice(), value) {
                break;
            }
        }
    }

    pub fn remove(&mut self, key: &[String]) -> bool {
        self.records.remove(key).is_some()
    }

    pub fn remove_prefix(&mut self, prefix: &[&str]) -> usize {
        let before = self.records.len();
        self.records.retain(|key, _| !has_prefix(key, prefix));
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

fn has_prefix(key: &[String], prefix: &[&str]) -> bool {
    key.len() >= prefix.len()
        && key.iter().zip(prefix.iter()).all(|(k, p)| k == p)
}
