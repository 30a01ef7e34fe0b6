//! Typed output variables and per-year variable sets

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{FrsError, Result};
use crate::models::entity::Entity;

/// Storage kind of a variable, fixed when the variable is defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Floating point amounts and counts
    Float,
    /// Integer identifiers
    Int,
    /// Flags
    Bool,
    /// String labels
    Category,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => write!(f, "Float"),
            Self::Int => write!(f, "Int"),
            Self::Bool => write!(f, "Bool"),
            Self::Category => write!(f, "Category"),
        }
    }
}

/// The values of one variable for one year
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValues {
    /// Floating point values
    Float(Vec<f64>),
    /// Integer values
    Int(Vec<i64>),
    /// Boolean values
    Bool(Vec<bool>),
    /// String labels
    Category(Vec<String>),
}

impl VariableValues {
    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Category(v) => v.len(),
        }
    }

    /// Whether there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind of the stored values
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Float(_) => ValueKind::Float,
            Self::Int(_) => ValueKind::Int,
            Self::Bool(_) => ValueKind::Bool,
            Self::Category(_) => ValueKind::Category,
        }
    }

    /// Numeric view of the values; labels have none
    #[must_use]
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Self::Float(v) => Some(v.clone()),
            Self::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Self::Bool(v) => Some(v.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect()),
            Self::Category(_) => None,
        }
    }

    /// Number of NaN entries
    #[must_use]
    pub fn nan_count(&self) -> usize {
        match self {
            Self::Float(v) => v.iter().filter(|x| x.is_nan()).count(),
            _ => 0,
        }
    }

    /// Append another array of the same kind
    pub fn concat(&self, other: &Self) -> Result<Self> {
        Ok(match (self, other) {
            (Self::Float(a), Self::Float(b)) => Self::Float(a.iter().chain(b).copied().collect()),
            (Self::Int(a), Self::Int(b)) => Self::Int(a.iter().chain(b).copied().collect()),
            (Self::Bool(a), Self::Bool(b)) => Self::Bool(a.iter().chain(b).copied().collect()),
            (Self::Category(a), Self::Category(b)) => {
                Self::Category(a.iter().chain(b).cloned().collect())
            }
            (a, b) => {
                return Err(FrsError::Shape(format!(
                    "Cannot concatenate {} values with {} values",
                    a.kind(),
                    b.kind()
                )));
            }
        })
    }
}

/// A named array belonging to one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Variable name
    pub name: String,
    /// Entity the array is indexed by
    pub entity: Entity,
    /// The values
    pub values: VariableValues,
}

/// All variables of one dataset for one year
///
/// Variables keep their insertion order. Every variable of an entity has the
/// same length.
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    year: i32,
    variables: Vec<Variable>,
    lookup: FxHashMap<String, usize>,
    lengths: BTreeMap<Entity, usize>,
}

impl VariableSet {
    /// Create an empty set for a year
    #[must_use]
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Default::default()
        }
    }

    /// Survey year
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Add a variable
    ///
    /// Fails when the name is taken or the length disagrees with earlier
    /// variables of the same entity.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        entity: Entity,
        values: VariableValues,
    ) -> Result<()> {
        let name = name.into();
        if self.lookup.contains_key(&name) {
            return Err(FrsError::Shape(format!("Variable {name} defined twice")));
        }

        match self.lengths.get(&entity) {
            Some(&len) if len != values.len() => {
                return Err(FrsError::Shape(format!(
                    "Variable {name} has {} {entity} entries, expected {len}",
                    values.len()
                )));
            }
            Some(_) => {}
            None => {
                self.lengths.insert(entity, values.len());
            }
        }

        self.lookup.insert(name.clone(), self.variables.len());
        self.variables.push(Variable {
            name,
            entity,
            values,
        });
        Ok(())
    }

    /// Add a floating point variable
    pub fn insert_float(&mut self, name: &str, entity: Entity, values: Vec<f64>) -> Result<()> {
        self.insert(name, entity, VariableValues::Float(values))
    }

    /// Replace the values of an existing variable, keeping its position
    pub fn replace(&mut self, name: &str, values: VariableValues) -> Result<()> {
        let idx = *self
            .lookup
            .get(name)
            .ok_or_else(|| FrsError::Store(format!("No variable named {name}")))?;
        let variable = &mut self.variables[idx];
        if variable.values.len() != values.len() {
            return Err(FrsError::Shape(format!(
                "Replacement for {name} has {} entries, expected {}",
                values.len(),
                variable.values.len()
            )));
        }
        variable.values = values;
        Ok(())
    }

    /// Look up a variable
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.lookup.get(name).map(|&idx| &self.variables[idx])
    }

    /// Look up a variable, failing if it is absent
    pub fn require(&self, name: &str) -> Result<&Variable> {
        self.get(name)
            .ok_or_else(|| FrsError::Store(format!("No variable named {name}")))
    }

    /// Numeric values of a variable
    pub fn f64_values(&self, name: &str) -> Result<Vec<f64>> {
        self.require(name)?
            .values
            .to_f64()
            .ok_or_else(|| FrsError::Shape(format!("Variable {name} is not numeric")))
    }

    /// Integer identifiers of a variable
    pub fn ids(&self, name: &str) -> Result<Vec<i64>> {
        match &self.require(name)?.values {
            VariableValues::Int(v) => Ok(v.clone()),
            VariableValues::Float(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            other => Err(FrsError::Shape(format!(
                "Variable {name} holds {} values, not identifiers",
                other.kind()
            ))),
        }
    }

    /// Whether a variable exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    /// Number of rows of an entity, if any variable has been added for it
    #[must_use]
    pub fn entity_len(&self, entity: Entity) -> Option<usize> {
        self.lengths.get(&entity).copied()
    }

    /// Variables in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    /// Variable names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    /// Number of variables
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the set holds no variables
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Names of variables containing NaN
    #[must_use]
    pub fn variables_with_missing_values(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter(|v| v.values.nan_count() > 0)
            .map(|v| v.name.clone())
            .collect()
    }

    /// Fail if any variable contains NaN
    pub fn ensure_complete(&self) -> Result<()> {
        let variables = self.variables_with_missing_values();
        if variables.is_empty() {
            Ok(())
        } else {
            Err(FrsError::MissingValues { variables })
        }
    }
}
