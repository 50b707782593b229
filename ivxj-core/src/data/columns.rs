//! Column roles and their resolution against a table's header.
//!
//! Each of the four roles is either named explicitly or defaults to a fixed
//! position (identity 0, time 1, dependent 2, independent 3). The column spec is
//! resolved once, before any data is extracted.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DataError;

/// The four columns a panel table must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Identity,
    Time,
    Dependent,
    Independent,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 4] = [
        ColumnRole::Identity,
        ColumnRole::Time,
        ColumnRole::Dependent,
        ColumnRole::Independent,
    ];

    /// Position used when the role is not named.
    pub fn default_position(self) -> usize {
        match self {
            ColumnRole::Identity => 0,
            ColumnRole::Time => 1,
            ColumnRole::Dependent => 2,
            ColumnRole::Independent => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColumnRole::Identity => "identity",
            ColumnRole::Time => "time",
            ColumnRole::Dependent => "dependent",
            ColumnRole::Independent => "independent",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A column given by name or by zero-based position.
///
/// Deserializes from either a TOML/JSON integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Position(usize),
    Name(String),
}

impl ColumnRef {
    /// Parse a command-line value: all-digit strings are positions.
    pub fn parse(value: &str) -> Self {
        match value.parse::<usize>() {
            Ok(position) => ColumnRef::Position(position),
            Err(_) => ColumnRef::Name(value.to_string()),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Position(p) => write!(f, "#{p}"),
            ColumnRef::Name(name) => f.write_str(name),
        }
    }
}

/// Which table column plays each role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    pub identity: ColumnRef,
    pub time: ColumnRef,
    pub dependent: ColumnRef,
    pub independent: ColumnRef,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            identity: ColumnRef::Position(ColumnRole::Identity.default_position()),
            time: ColumnRef::Position(ColumnRole::Time.default_position()),
            dependent: ColumnRef::Position(ColumnRole::Dependent.default_position()),
            independent: ColumnRef::Position(ColumnRole::Independent.default_position()),
        }
    }
}

impl ColumnSpec {
    /// All four roles by name.
    pub fn named(identity: &str, time: &str, dependent: &str, independent: &str) -> Self {
        Self {
            identity: ColumnRef::Name(identity.into()),
            time: ColumnRef::Name(time.into()),
            dependent: ColumnRef::Name(dependent.into()),
            independent: ColumnRef::Name(independent.into()),
        }
    }

    pub fn get(&self, role: ColumnRole) -> &ColumnRef {
        match role {
            ColumnRole::Identity => &self.identity,
            ColumnRole::Time => &self.time,
            ColumnRole::Dependent => &self.dependent,
            ColumnRole::Independent => &self.independent,
        }
    }

    /// Replace the column for one role.
    pub fn with(mut self, role: ColumnRole, column: ColumnRef) -> Self {
        match role {
            ColumnRole::Identity => self.identity = column,
            ColumnRole::Time => self.time = column,
            ColumnRole::Dependent => self.dependent = column,
            ColumnRole::Independent => self.independent = column,
        }
        self
    }

    /// Map every role to a concrete column name of `header`.
    pub fn resolve(&self, header: &[String]) -> Result<ResolvedColumns, DataError> {
        let mut names: Vec<String> = Vec::with_capacity(4);
        for role in ColumnRole::ALL {
            let name = match self.get(role) {
                ColumnRef::Position(p) => header.get(*p).cloned().ok_or_else(|| {
                    DataError::InvalidColumnSpec(format!(
                        "{role} column position {p} is out of range: table has {} columns",
                        header.len()
                    ))
                })?,
                ColumnRef::Name(name) => {
                    if !header.iter().any(|h| h == name) {
                        return Err(DataError::MissingColumn {
                            role,
                            name: name.clone(),
                        });
                    }
                    name.clone()
                }
            };
            if let Some(other) = names.iter().position(|n| *n == name) {
                return Err(DataError::InvalidColumnSpec(format!(
                    "column '{name}' assigned to both {} and {role}",
                    ColumnRole::ALL[other]
                )));
            }
            names.push(name);
        }

        let [identity, time, dependent, independent]: [String; 4] = names
            .try_into()
            .map_err(|_| DataError::InvalidColumnSpec("expected four columns".into()))?;
        Ok(ResolvedColumns {
            identity,
            time,
            dependent,
            independent,
        })
    }
}

/// Column names after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumns {
    pub identity: String,
    pub time: String,
    pub dependent: String,
    pub independent: String,
}
