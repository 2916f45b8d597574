//! Design arena
//!
//! All modules and register slots of one simulated design live in two flat
//! vectors and are addressed by index (`ModuleId`, `SlotId`). The module tree
//! is recorded through each module's ordered field list; commit and reset walk
//! that tree depth-first.

use crate::calibration::Readiness;
use crate::error::{SimulationError, SimulationResult};
use crate::register::{FieldFormat, Reg, RegArray, RegisterSlot, SlotId};
use crate::value::{Signal, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Module identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub(crate) usize);

impl ModuleId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Field descriptor of a module
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Fixed at construction, excluded from commit and reset
    Constant(Value),
    Register(SlotId),
    /// Homogeneous sequence of registers in contiguous slots
    RegisterArray { first: SlotId, len: usize },
    Submodule(ModuleId),
    SubmoduleArray(Vec<ModuleId>),
}

#[derive(Debug, Clone)]
pub(crate) struct ModuleNode {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) parent: Option<ModuleId>,
    pub(crate) fields: IndexMap<String, Field>,
}

/// Module tree plus register storage of one design
#[derive(Debug, Clone)]
pub struct Design {
    pub(crate) modules: Vec<ModuleNode>,
    pub(crate) slots: Vec<RegisterSlot>,
    pub(crate) readiness: Readiness,
}

impl Default for Design {
    fn default() -> Self {
        Self::new()
    }
}

impl Design {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            slots: Vec::new(),
            readiness: Readiness::Final,
        }
    }

    pub(crate) fn add_module(
        &mut self,
        name: &str,
        path: String,
        parent: Option<ModuleId>,
    ) -> ModuleId {
        let id = ModuleId(self.modules.len());
        self.modules.push(ModuleNode {
            name: name.to_string(),
            path,
            parent,
            fields: IndexMap::new(),
        });
        id
    }

    pub(crate) fn check_field_free(&self, module: ModuleId, name: &str) -> SimulationResult<()> {
        let node = &self.modules[module.0];
        if node.fields.contains_key(name) {
            return Err(SimulationError::DuplicateField {
                module: node.path.clone(),
                field: name.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn add_field(
        &mut self,
        module: ModuleId,
        name: &str,
        field: Field,
    ) -> SimulationResult<()> {
        self.check_field_free(module, name)?;
        self.modules[module.0].fields.insert(name.to_string(), field);
        Ok(())
    }

    /// Allocate a slot. An open format makes the whole design tentative.
    pub(crate) fn add_slot(&mut self, slot: RegisterSlot) -> SlotId {
        if slot.is_lazy() && self.readiness == Readiness::Final {
            self.readiness = Readiness::Tentative { runs: 0 };
        }
        let id = SlotId(self.slots.len());
        self.slots.push(slot);
        id
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn register_count(&self) -> usize {
        self.slots.len()
    }

    pub fn module_name(&self, id: ModuleId) -> Option<&str> {
        self.modules.get(id.0).map(|m| m.name.as_str())
    }

    /// Hierarchical path such as `top.filter.stages[2]`
    pub fn module_path(&self, id: ModuleId) -> Option<&str> {
        self.modules.get(id.0).map(|m| m.path.as_str())
    }

    pub fn parent(&self, id: ModuleId) -> Option<ModuleId> {
        self.modules.get(id.0).and_then(|m| m.parent)
    }

    /// Ordered fields of a module
    pub fn fields(&self, id: ModuleId) -> impl Iterator<Item = (&str, &Field)> {
        self.modules
            .get(id.0)
            .into_iter()
            .flat_map(|m| m.fields.iter().map(|(name, field)| (name.as_str(), field)))
    }

    pub fn register_path(&self, slot: SlotId) -> Option<&str> {
        self.slots.get(slot.0).map(|s| s.path.as_str())
    }

    pub fn register_owner(&self, slot: SlotId) -> Option<ModuleId> {
        self.slots.get(slot.0).map(|s| s.owner)
    }

    pub fn register_format(&self, slot: SlotId) -> Option<FieldFormat> {
        self.slots.get(slot.0).map(|s| s.format)
    }

    /// True when `module` is `scope` or lies below it
    pub fn is_within(&self, module: ModuleId, scope: ModuleId) -> bool {
        let mut cursor = Some(module);
        while let Some(id) = cursor {
            if id == scope {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    pub(crate) fn slot(&self, id: SlotId) -> SimulationResult<&RegisterSlot> {
        self.slots
            .get(id.0)
            .ok_or_else(|| SimulationError::UnknownRegister(format!("#{}", id.0)))
    }

    pub(crate) fn slot_mut(&mut self, id: SlotId) -> SimulationResult<&mut RegisterSlot> {
        self.slots
            .get_mut(id.0)
            .ok_or_else(|| SimulationError::UnknownRegister(format!("#{}", id.0)))
    }

    /// Name of a register array, taken from its first element
    pub(crate) fn array_path(&self, first: SlotId) -> String {
        match self.register_path(first) {
            Some(path) => path.strip_suffix("[0]").unwrap_or(path).to_string(),
            None => format!("#{}", first.0),
        }
    }

    /// Committed value of a register
    pub fn current<T: Signal>(&self, reg: Reg<T>) -> SimulationResult<T> {
        let slot = self.slot(reg.slot())?;
        decode(slot, slot.current)
    }

    /// Pending value written this cycle (equal to `current` after a commit)
    pub fn pending<T: Signal>(&self, reg: Reg<T>) -> SimulationResult<T> {
        let slot = self.slot(reg.slot())?;
        decode(slot, slot.next)
    }

    pub fn current_all<T: Signal>(&self, reg: RegArray<T>) -> SimulationResult<Vec<T>> {
        reg.slots()
            .map(|id| {
                let slot = self.slot(id)?;
                decode(slot, slot.current)
            })
            .collect()
    }

    /// Committed value of a register by path
    pub fn lookup(&self, path: &str) -> SimulationResult<Value> {
        self.slots
            .iter()
            .find(|s| s.path == path)
            .map(|s| s.current)
            .ok_or_else(|| SimulationError::UnknownRegister(path.to_string()))
    }

    /// Every register's committed value, keyed by path
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.slots
            .iter()
            .map(|s| (s.path.clone(), s.current))
            .collect()
    }

    /// Submodules and own register slots of a module, in field order
    fn members(&self, id: ModuleId) -> (Vec<ModuleId>, Vec<SlotId>) {
        let mut children = Vec::new();
        let mut slots = Vec::new();
        if let Some(node) = self.modules.get(id.0) {
            for field in node.fields.values() {
                match field {
                    Field::Constant(_) => {}
                    Field::Register(slot) => slots.push(*slot),
                    Field::RegisterArray { first, len } => {
                        slots.extend((first.0..first.0 + len).map(SlotId));
                    }
                    Field::Submodule(child) => children.push(*child),
                    Field::SubmoduleArray(list) => children.extend(list.iter().copied()),
                }
            }
        }
        (children, slots)
    }

    /// Copy `next` into `current` for every register under `root`, children
    /// before their parent. Returns the number of registers committed.
    pub fn commit_all(&mut self, root: ModuleId) -> usize {
        let count = self.walk(root, &mut RegisterSlot::commit);
        debug!("Committed {} registers under '{}'", count, self.path_or_unknown(root));
        count
    }

    /// Restore `current = next = initial` for every register under `root`
    pub fn reset_all(&mut self, root: ModuleId) -> usize {
        let count = self.walk(root, &mut RegisterSlot::reset);
        debug!("Reset {} registers under '{}'", count, self.path_or_unknown(root));
        count
    }

    fn walk(&mut self, id: ModuleId, visit: &mut impl FnMut(&mut RegisterSlot)) -> usize {
        let (children, slots) = self.members(id);
        let mut count = 0;
        for child in children {
            count += self.walk(child, visit);
        }
        for slot in slots {
            if let Some(slot) = self.slots.get_mut(slot.0) {
                visit(slot);
                count += 1;
            }
        }
        count
    }

    fn path_or_unknown(&self, id: ModuleId) -> &str {
        self.module_path(id).unwrap_or("<unknown>")
    }
}

fn decode<T: Signal>(slot: &RegisterSlot, value: Value) -> SimulationResult<T> {
    T::from_value(value).ok_or_else(|| SimulationError::KindMismatch {
        field: slot.path.clone(),
        expected: T::KIND,
        actual: value.kind(),
    })
}
