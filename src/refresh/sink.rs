use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A division assignment to persist for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub code: Option<String>,
    pub name: String,
}

/// Storage collaborator that persists resolved assignments.
///
/// Implementations own all I/O; a returned error fails that record only.
pub trait AssignmentSink {
    fn write_assignment(&mut self, record_id: &str, assignment: &Assignment) -> Result<()>;
}

impl<F> AssignmentSink for F
where
    F: FnMut(&str, &Assignment) -> Result<()>,
{
    fn write_assignment(&mut self, record_id: &str, assignment: &Assignment) -> Result<()> {
        self(record_id, assignment)
    }
}

/// Keeps assignments in memory, keyed by record id. Rewrites are idempotent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemorySink {
    assignments: BTreeMap<String, Assignment>,
}

impl MemorySink {
    #[inline] pub fn new() -> Self { Self::default() }

    #[inline] pub fn get(&self, record_id: &str) -> Option<&Assignment> { self.assignments.get(record_id) }

    #[inline] pub fn len(&self) -> usize { self.assignments.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.assignments.is_empty() }

    #[inline] pub fn assignments(&self) -> &BTreeMap<String, Assignment> { &self.assignments }
}

impl AssignmentSink for MemorySink {
    fn write_assignment(&mut self, record_id: &str, assignment: &Assignment) -> Result<()> {
        self.assignments.insert(record_id.to_string(), assignment.clone());
        Ok(())
    }
}
