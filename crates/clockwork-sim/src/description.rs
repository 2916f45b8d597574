//! Structural description of a design for hardware generators
//!
//! Lists, per module, the ordered fields with their resolved formats and the
//! nested module paths. The description is a plain serializable value; the
//! simulator never writes it anywhere itself.

use crate::calibration::Readiness;
use crate::design::{Design, Field, ModuleId};
use crate::register::FieldFormat;
use crate::value::{Value, ValueKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignDescription {
    pub top: String,
    pub readiness: Readiness,
    /// Modules in pre-order, top first
    pub modules: Vec<ModuleDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDescription {
    pub name: String,
    pub path: String,
    pub fields: Vec<FieldDescription>,
    pub submodules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum FieldDescription {
    Constant {
        name: String,
        value: Value,
    },
    Register {
        name: String,
        kind: ValueKind,
        format: FieldFormat,
    },
    RegisterArray {
        name: String,
        kind: ValueKind,
        format: FieldFormat,
        len: usize,
    },
    Submodule {
        name: String,
        path: String,
    },
    SubmoduleArray {
        name: String,
        paths: Vec<String>,
    },
}

impl FieldDescription {
    pub fn name(&self) -> &str {
        match self {
            FieldDescription::Constant { name, .. }
            | FieldDescription::Register { name, .. }
            | FieldDescription::RegisterArray { name, .. }
            | FieldDescription::Submodule { name, .. }
            | FieldDescription::SubmoduleArray { name, .. } => name,
        }
    }
}

impl Design {
    /// Describe the tree rooted at `root`
    pub fn describe(&self, root: ModuleId) -> DesignDescription {
        let mut modules = Vec::new();
        self.describe_module(root, &mut modules);
        DesignDescription {
            top: self.module_path(root).unwrap_or_default().to_string(),
            readiness: self.readiness,
            modules,
        }
    }

    fn describe_module(&self, id: ModuleId, out: &mut Vec<ModuleDescription>) {
        let Some(node) = self.modules.get(id.0) else {
            return;
        };
        let mut fields = Vec::with_capacity(node.fields.len());
        let mut children = Vec::new();

        for (name, field) in &node.fields {
            let name = name.clone();
            let description = match field {
                Field::Constant(value) => FieldDescription::Constant {
                    name,
                    value: *value,
                },
                Field::Register(slot) => {
                    let slot = &self.slots[slot.0];
                    FieldDescription::Register {
                        name,
                        kind: slot.kind,
                        format: slot.format,
                    }
                }
                Field::RegisterArray { first, len } => {
                    let slot = &self.slots[first.0];
                    FieldDescription::RegisterArray {
                        name,
                        kind: slot.kind,
                        format: slot.format,
                        len: *len,
                    }
                }
                Field::Submodule(child) => {
                    children.push(*child);
                    FieldDescription::Submodule {
                        name,
                        path: self.path_of(*child),
                    }
                }
                Field::SubmoduleArray(list) => {
                    children.extend(list.iter().copied());
                    FieldDescription::SubmoduleArray {
                        name,
                        paths: list.iter().map(|c| self.path_of(*c)).collect(),
                    }
                }
            };
            fields.push(description);
        }

        out.push(ModuleDescription {
            name: node.name.clone(),
            path: node.path.clone(),
            fields,
            submodules: children.iter().map(|c| self.path_of(*c)).collect(),
        });
        for child in children {
            self.describe_module(child, out);
        }
    }

    fn path_of(&self, id: ModuleId) -> String {
        self.module_path(id).unwrap_or_default().to_string()
    }
}
