//! Format calibration
//!
//! Registers declared with open bounds start out tentative. While tentative,
//! every value written into such a register is recorded by shape. Once the
//! required number of calibration runs has been committed, `finalize` fixes
//! each open format from its observations, or reports every register whose
//! observations disagree.

use crate::design::{Design, Field, ModuleId};
use crate::error::{SimulationError, SimulationResult};
use crate::register::FieldFormat;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Minimum number of calibration runs before formats may be finalized
pub const MIN_CALIBRATION_RUNS: usize = 2;

/// Whether register formats can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readiness {
    /// Some formats are still open; `runs` calibration runs committed so far
    Tentative { runs: usize },
    Final,
}

impl Readiness {
    pub fn is_final(&self) -> bool {
        matches!(self, Readiness::Final)
    }
}

impl Design {
    pub(crate) fn record_run(&mut self) {
        if let Readiness::Tentative { runs } = &mut self.readiness {
            *runs += 1;
        }
    }

    /// Fix every open format from the calibration observations, requantize
    /// initial values into the resolved formats and reset the tree.
    pub(crate) fn finalize(&mut self, root: ModuleId, required: usize) -> SimulationResult<()> {
        let runs = match self.readiness {
            Readiness::Final => return Ok(()),
            Readiness::Tentative { runs } => runs,
        };
        if runs < required {
            return Err(SimulationError::InsufficientCalibration { runs, required });
        }

        let mut unstable = Vec::new();
        let mut unresolved = Vec::new();
        let mut resolved = Vec::new();

        for (name, members) in self.lazy_fields() {
            let mut candidates = IndexSet::new();
            for &index in &members {
                let slot = &self.slots[index];
                for shape in &slot.observed {
                    candidates.insert(slot.format.complete(shape, &slot.path)?);
                }
            }
            match candidates.len() {
                0 => {
                    warn!("Register '{}' was never written during calibration", name);
                    unresolved.push(name);
                }
                1 => resolved.push((members, candidates[0])),
                _ => {
                    let formats: Vec<String> = candidates.iter().map(|f| f.to_string()).collect();
                    warn!(
                        "Register '{}' observed unstable formats: {}",
                        name,
                        formats.join(", ")
                    );
                    unstable.push(name);
                }
            }
        }

        if !unstable.is_empty() {
            return Err(SimulationError::UnstableFormats(unstable));
        }
        if let Some(register) = unresolved.into_iter().next() {
            return Err(SimulationError::UnresolvedFormat { register });
        }

        let count = resolved.len();
        for (members, format) in resolved {
            for index in members {
                let slot = &mut self.slots[index];
                slot.initial = format.conform(slot.initial, true, &slot.path)?;
                slot.format = format;
                slot.observed.clear();
            }
        }
        self.readiness = Readiness::Final;
        self.reset_all(root);

        info!("Finalized {} register formats after {} calibration runs", count, runs);
        Ok(())
    }

    /// Register fields with open formats and their slots. A register array
    /// is one field, so all of its elements resolve to a single format.
    fn lazy_fields(&self) -> Vec<(String, Vec<usize>)> {
        let mut fields = Vec::new();
        for node in &self.modules {
            for field in node.fields.values() {
                let (name, slots) = match field {
                    Field::Register(slot) => match self.slots.get(slot.0) {
                        Some(s) => (s.path.clone(), slot.0..slot.0 + 1),
                        None => continue,
                    },
                    Field::RegisterArray { first, len } => {
                        (self.array_path(*first), first.0..first.0 + len)
                    }
                    _ => continue,
                };
                if self.slots.get(slots.start).is_some_and(|s| s.is_lazy()) {
                    fields.push((name, slots.collect()));
                }
            }
        }
        fields
    }
}
