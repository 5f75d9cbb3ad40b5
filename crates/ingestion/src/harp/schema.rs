//! Device schema (`device.yml`)
//!
//! Only the fields needed to name registers and type their payloads are
//! modelled; everything else in the file is ignored.

use std::collections::BTreeMap;
use std::path::Path;

use contracts::{ContractError, Value};
use serde::Deserialize;
use tracing::debug;

use super::frame::PayloadType;

/// Parsed device schema
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSchema {
    pub device: String,
    pub who_am_i: u16,
    #[serde(default)]
    pub registers: BTreeMap<String, RegisterSchema>,
}

/// One register entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSchema {
    pub address: u8,
    #[serde(rename = "type")]
    pub register_type: String,
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub payload_spec: BTreeMap<String, PayloadMember>,
}

/// Named member of a register payload
///
/// `offset` selects the payload element; `mask` selects bits within it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayloadMember {
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub mask: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Value column derived from a payload member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberColumn {
    pub name: String,
    pub offset: usize,
    pub mask: Option<u64>,
}

impl MemberColumn {
    /// Plain column over one element, no mask
    pub fn element(name: impl Into<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            offset,
            mask: None,
        }
    }

    /// Extract this column's value from the decoded payload elements
    ///
    /// Single-bit masks yield a flag, wider masks the bits shifted down to
    /// bit 0. Masks only apply to integer elements.
    pub fn extract(&self, elements: &[Value]) -> Value {
        let Some(element) = elements.get(self.offset) else {
            return Value::Null;
        };
        let Some(mask) = self.mask.filter(|m| *m != 0) else {
            return element.clone();
        };
        let bits = match element {
            Value::UInt(v) => *v,
            Value::Int(v) => *v as u64,
            other => return other.clone(),
        };
        let masked = bits & mask;
        if mask.count_ones() == 1 {
            Value::Bool(masked != 0)
        } else {
            Value::UInt(masked >> mask.trailing_zeros())
        }
    }
}

impl RegisterSchema {
    /// Element type declared by the schema
    pub fn payload_type(&self) -> Result<PayloadType, String> {
        self.register_type.parse()
    }

    /// Payload member columns ordered by offset, then mask
    ///
    /// Members without an explicit offset take offset 0.
    pub fn member_columns(&self) -> Vec<MemberColumn> {
        let mut members: Vec<MemberColumn> = self
            .payload_spec
            .iter()
            .map(|(name, member)| MemberColumn {
                name: name.clone(),
                offset: member.offset.unwrap_or(0),
                mask: member.mask,
            })
            .collect();
        members.sort_by(|a, b| {
            (a.offset, a.mask, &a.name).cmp(&(b.offset, b.mask, &b.name))
        });
        members
    }
}

impl DeviceSchema {
    /// Parse a schema from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ContractError> {
        serde_yaml::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("device schema parse error: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Load a schema file
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ContractError::from_io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Find the schema in `dir` whose `whoAmI` equals `who_am_i`
    ///
    /// Files that fail to parse are skipped.
    pub fn find_by_who_am_i(dir: &Path, who_am_i: u16) -> Result<Self, ContractError> {
        let entries = std::fs::read_dir(dir).map_err(|e| ContractError::from_io(dir, e))?;
        let mut candidates: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yml") | Some("yaml")
                )
            })
            .collect();
        candidates.sort();

        for candidate in candidates {
            match Self::from_path(&candidate) {
                Ok(schema) if schema.who_am_i == who_am_i => {
                    debug!(path = %candidate.display(), device = %schema.device, "schema resolved");
                    return Ok(schema);
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(path = %candidate.display(), error = %e, "skipping unreadable schema");
                }
            }
        }

        Err(ContractError::missing_source(
            dir,
            format!("no device schema with whoAmI {who_am_i}"),
        ))
    }

    /// Register name and schema by address
    pub fn register(&self, address: u8) -> Option<(&str, &RegisterSchema)> {
        self.registers
            .iter()
            .find(|(_, reg)| reg.address == address)
            .map(|(name, reg)| (name.as_str(), reg))
    }
}
