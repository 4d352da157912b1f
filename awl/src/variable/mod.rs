pub mod name;

use std::fmt;

use crate::token::Token;

/// Maximum number of array dimensions in a declaration or subscript.
pub const MAX_DIMENSIONS: usize = 6;

/// A variable reference: a name plus optional array subscripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub indices: Option<Vec<i32>>,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Ident {
            name: name.into(),
            indices: None,
        }
    }

    pub fn indexed(name: impl Into<String>, indices: Vec<i32>) -> Self {
        Ident {
            name: name.into(),
            indices: Some(indices),
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(indices) = &self.indices {
            let parts: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
            write!(f, "[{}]", parts.join(","))?;
        }
        Ok(())
    }
}

/// Inclusive bounds of one array dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    pub start: i32,
    pub end: i32,
}

impl Dimension {
    /// Number of elements. Computed in `i64` so full-range `i32` bounds
    /// cannot overflow.
    pub fn len(&self) -> u64 {
        (i64::from(self.end) - i64::from(self.start) + 1) as u64
    }
}

/// A default value for one variable (or one array element).
/// The value is kept as raw tokens; evaluating it is left to later stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataInit {
    pub ident: Ident,
    pub value: Vec<Token>,
}

impl DataInit {
    /// Value tokens joined by single spaces.
    pub fn value_text(&self) -> String {
        crate::token::join(&self.value)
    }
}

/// One declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataField {
    pub ident: Ident,
    /// Element type tokens (for arrays: the type after `OF`).
    pub type_tokens: Vec<Token>,
    /// Array dimensions, or `None` for a scalar.
    pub dimensions: Option<Vec<Dimension>>,
    /// Default values declared with `:=`.
    pub inits: Vec<DataInit>,
}

impl DataField {
    pub fn is_array(&self) -> bool {
        self.dimensions.is_some()
    }

    /// Total number of array elements, 1 for scalars. Saturates at
    /// `usize::MAX` for arrays too large to address.
    pub fn element_count(&self) -> usize {
        let Some(dims) = &self.dimensions else {
            return 1;
        };
        dims.iter()
            .try_fold(1u64, |total, dim| total.checked_mul(dim.len()))
            .and_then(|total| usize::try_from(total).ok())
            .unwrap_or(usize::MAX)
    }
}
