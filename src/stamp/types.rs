//! Minimal class model used by object stamps.

use std::fmt;
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Hash)]
struct TypeInfo {
    name: String,
    superclass: Option<TypeRef>,
}

/// Shared handle to a resolved class.
///
/// Equality is structural on name and superclass chain, so two handles
/// created for the same class compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef(Arc<TypeInfo>);

impl TypeRef {
    /// A root class with no superclass.
    pub fn root(name: &str) -> Self {
        Self(Arc::new(TypeInfo {
            name: name.to_string(),
            superclass: None,
        }))
    }

    /// A class extending `superclass`.
    pub fn subclass(name: &str, superclass: &TypeRef) -> Self {
        Self(Arc::new(TypeInfo {
            name: name.to_string(),
            superclass: Some(superclass.clone()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn superclass(&self) -> Option<&TypeRef> {
        self.0.superclass.as_ref()
    }

    /// Whether `self` is `other` or one of its superclasses.
    pub fn is_assignable_from(&self, other: &TypeRef) -> bool {
        let mut current = Some(other);
        while let Some(ty) = current {
            if ty == self {
                return true;
            }
            current = ty.superclass();
        }
        false
    }

    /// Most specific class both types extend, if they share a root.
    pub fn least_common_ancestor(&self, other: &TypeRef) -> Option<TypeRef> {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.is_assignable_from(other) {
                return Some(ty.clone());
            }
            current = ty.superclass();
        }
        None
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
