//! Domain record store.
//!
//! # Responsibilities
//! - Hold the registered domain records
//! - Exact lookup by hostname, default lookup, sorted listing
//! - Enforce unique hostnames/ids and the single-default invariant
//!
//! # Design Decisions
//! - Readers load an immutable `Arc<Vec<DomainRecord>>` snapshot (no locks)
//! - Writers serialize on one mutex, mutate a copy, re-check, then swap
//! - Records keep insertion order; sorting happens on demand

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::domain::hostname::{host_key, machine_name};
use crate::domain::types::{
    DomainError, DomainPatch, DomainRecord, DomainResult, DomainValues, Scheme,
};

/// Total order for domain records: weight ascending, then label bytes.
pub fn sort(a: &DomainRecord, b: &DomainRecord) -> Ordering {
    a.weight
        .cmp(&b.weight)
        .then_with(|| a.name.as_bytes().cmp(b.name.as_bytes()))
}

/// Concurrent-read registry of domain records.
#[derive(Debug, Default)]
pub struct DomainStore {
    records: ArcSwap<Vec<DomainRecord>>,
    writer: Mutex<()>,
}

impl DomainStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current immutable snapshot of all records, in insertion order.
    pub fn snapshot(&self) -> Arc<Vec<DomainRecord>> {
        self.records.load_full()
    }

    pub fn count(&self) -> usize {
        self.records.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Load a record by machine id.
    pub fn get(&self, id: &str) -> Option<DomainRecord> {
        self.records.load().iter().find(|r| r.id == id).cloned()
    }

    /// Exact match on an already-normalized hostname.
    ///
    /// Comparison ignores ASCII case and any port suffix.
    pub fn find_by_hostname(&self, hostname: &str) -> Option<DomainRecord> {
        let key = host_key(hostname);
        if key.is_empty() {
            return None;
        }
        self.records
            .load()
            .iter()
            .find(|r| host_key(&r.hostname) == key)
            .cloned()
    }

    /// The record flagged as default, if any.
    pub fn find_default(&self) -> Option<DomainRecord> {
        self.records.load().iter().find(|r| r.is_default).cloned()
    }

    pub fn find_default_id(&self) -> Option<String> {
        self.find_default().map(|d| d.id)
    }

    /// All records ordered by weight, then label.
    pub fn list_sorted(&self) -> Vec<DomainRecord> {
        let mut list: Vec<DomainRecord> = self.records.load().iter().cloned().collect();
        // stable: equal keys keep insertion order
        list.sort_by(sort);
        list
    }

    /// Sorted `(id, label)` pairs, e.g. for condition summaries.
    pub fn load_options_list(&self) -> Vec<(String, String)> {
        self.list_sorted()
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect()
    }

    /// Register a new domain record.
    ///
    /// Missing values are filled in: `weight = count + 1`, `status = true`,
    /// `scheme` from the ambient request (else `http`), `name = hostname`,
    /// and the id is derived from the hostname. The record becomes default
    /// when explicitly asked to, or when no default exists yet.
    pub fn create(
        &self,
        values: DomainValues,
        ambient_scheme: Option<Scheme>,
    ) -> DomainResult<DomainRecord> {
        let hostname = validate_hostname(&values.hostname)?;

        self.write(|records| {
            let key = host_key(&hostname);
            if records.iter().any(|r| host_key(&r.hostname) == key) {
                return Err(DomainError::DuplicateHostname(hostname.clone()));
            }

            let id = match values.id {
                Some(ref id) if !id.trim().is_empty() => id.trim().to_string(),
                _ => machine_name(&hostname),
            };
            if records.iter().any(|r| r.id == id) {
                return Err(DomainError::DuplicateId(id));
            }

            let has_default = records.iter().any(|r| r.is_default);
            let is_default = match values.is_default {
                Some(true) => true,
                _ => !has_default,
            };
            if is_default {
                for r in records.iter_mut() {
                    r.is_default = false;
                }
            }

            let record = DomainRecord {
                id,
                name: values.name.clone().unwrap_or_else(|| hostname.clone()),
                hostname: hostname.clone(),
                scheme: values.scheme.or(ambient_scheme).unwrap_or_default(),
                weight: values.weight.unwrap_or(records.len() as i32 + 1),
                is_default,
                status: values.status.unwrap_or(true),
                redirect: values.redirect.filter(|code| *code > 0),
            };
            records.push(record.clone());

            tracing::debug!(
                domain_id = %record.id,
                hostname = %record.hostname,
                is_default = record.is_default,
                "Domain record created"
            );
            Ok(record)
        })
    }

    /// Apply a partial update to an existing record.
    pub fn update(&self, id: &str, patch: DomainPatch) -> DomainResult<DomainRecord> {
        let hostname = match patch.hostname {
            Some(ref h) => Some(validate_hostname(h)?),
            None => None,
        };

        self.write(|records| {
            let index = records
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| DomainError::NotFound(id.to_string()))?;

            if let Some(ref hostname) = hostname {
                let key = host_key(hostname);
                if records
                    .iter()
                    .any(|r| r.id != id && host_key(&r.hostname) == key)
                {
                    return Err(DomainError::DuplicateHostname(hostname.clone()));
                }
            }

            match patch.is_default {
                Some(true) => {
                    for r in records.iter_mut() {
                        r.is_default = false;
                    }
                    records[index].is_default = true;
                }
                Some(false) if records[index].is_default => {
                    return Err(DomainError::DefaultRequired(id.to_string()));
                }
                _ => {}
            }

            let record = &mut records[index];
            if let Some(hostname) = hostname {
                record.hostname = hostname;
            }
            if let Some(name) = patch.name {
                record.name = name;
            }
            if let Some(scheme) = patch.scheme {
                record.scheme = scheme;
            }
            if let Some(weight) = patch.weight {
                record.weight = weight;
            }
            if let Some(status) = patch.status {
                record.status = status;
            }
            if let Some(redirect) = patch.redirect {
                record.redirect = (redirect > 0).then_some(redirect);
            }

            Ok(record.clone())
        })
    }

    /// Promote a record to default, demoting the previous holder.
    pub fn set_default(&self, id: &str) -> DomainResult<DomainRecord> {
        self.update(
            id,
            DomainPatch {
                is_default: Some(true),
                ..Default::default()
            },
        )
    }

    /// Delete a record.
    ///
    /// The default record can only be deleted when it is the last one.
    pub fn delete(&self, id: &str) -> DomainResult<DomainRecord> {
        self.write(|records| {
            let index = records
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| DomainError::NotFound(id.to_string()))?;
            if records[index].is_default && records.len() > 1 {
                return Err(DomainError::DefaultRequired(id.to_string()));
            }
            let removed = records.remove(index);
            tracing::debug!(domain_id = %removed.id, "Domain record deleted");
            Ok(removed)
        })
    }

    /// Single writer path: copy, mutate, re-check the default invariant, swap.
    fn write<T>(
        &self,
        f: impl FnOnce(&mut Vec<DomainRecord>) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let mut records: Vec<DomainRecord> = self.records.load().as_ref().clone();
        let out = f(&mut records)?;
        reconcile_default(&mut records);
        self.records.store(Arc::new(records));
        Ok(out)
    }
}

/// Ensure exactly one default when records exist.
fn reconcile_default(records: &mut [DomainRecord]) {
    let defaults = records.iter().filter(|r| r.is_default).count();
    if records.is_empty() || defaults == 1 {
        return;
    }
    tracing::warn!(defaults, "Default domain invariant violated, reconciling");
    // keep the first flagged record, or promote the first record by sort order
    let keep = records
        .iter()
        .position(|r| r.is_default)
        .or_else(|| {
            records
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| sort(a, b))
                .map(|(i, _)| i)
        })
        .unwrap_or(0);
    for (i, r) in records.iter_mut().enumerate() {
        r.is_default = i == keep;
    }
}

fn validate_hostname(hostname: &str) -> DomainResult<String> {
    let trimmed = hostname.trim();
    if trimmed.is_empty()
        || trimmed.contains(['/', '*', ' ', '\t'])
        || trimmed.contains("://")
    {
        return Err(DomainError::InvalidHostname(hostname.to_string()));
    }
    Ok(trimmed.to_string())
}
