//! Reference stamps in full-width and compressed representation.
//!
//! [`ObjectStamp`] holds the type and nullness facts. [`NarrowStamp`] carries
//! exactly the same facts plus the [`CompressEncoding`] of its representation,
//! so optimizations reasoning about nullness see identical information on
//! both sides of a compression.

use std::fmt;

use super::types::TypeRef;
use crate::compress::CompressEncoding;
use crate::constant::Constant;
use crate::core::error::CompileResult;
use crate::memory::{ConstantReflectionProvider, MemoryAccessProvider};

/// Facts about a reference value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectStamp {
    /// Declared type; `None` means any object.
    ty: Option<TypeRef>,
    /// The runtime class is exactly `ty`, never a subclass.
    exact: bool,
    non_null: bool,
    always_null: bool,
}

impl ObjectStamp {
    pub fn new(ty: Option<TypeRef>, exact: bool, non_null: bool, always_null: bool) -> Self {
        Self {
            ty,
            exact,
            non_null,
            always_null,
        }
    }

    /// Any reference, possibly null.
    pub fn unrestricted() -> Self {
        Self::new(None, false, false, false)
    }

    /// The constant null.
    pub fn null() -> Self {
        Self::new(None, false, false, true)
    }

    /// A non-null reference of (a subclass of) `ty`.
    pub fn non_null_of(ty: TypeRef) -> Self {
        Self::new(Some(ty), false, true, false)
    }

    /// A non-null reference whose class is exactly `ty`.
    pub fn exact_non_null(ty: TypeRef) -> Self {
        Self::new(Some(ty), true, true, false)
    }

    pub fn ty(&self) -> Option<&TypeRef> {
        self.ty.as_ref()
    }

    pub fn is_exact_type(&self) -> bool {
        self.exact
    }

    pub fn non_null(&self) -> bool {
        self.non_null
    }

    pub fn always_null(&self) -> bool {
        self.always_null
    }

    /// No value satisfies both non-null and always-null.
    pub fn is_empty(&self) -> bool {
        self.non_null && self.always_null
    }

    /// Merge of the facts holding on two incoming paths.
    pub fn meet(&self, other: &ObjectStamp) -> ObjectStamp {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        if self == other {
            return self.clone();
        }

        // Null carries no type information, so the other side decides the type.
        if self.always_null {
            return ObjectStamp::new(other.ty.clone(), other.exact, false, other.always_null);
        }
        if other.always_null {
            return ObjectStamp::new(self.ty.clone(), self.exact, false, self.always_null);
        }

        let ty = match (&self.ty, &other.ty) {
            (Some(a), Some(b)) if a == b => Some(a.clone()),
            (Some(a), Some(b)) => a.least_common_ancestor(b),
            _ => None,
        };
        let exact = self.exact && other.exact && ty.is_some() && self.ty == other.ty;
        ObjectStamp::new(ty, exact, self.non_null && other.non_null, false)
    }

    /// `Null` when the stamp only admits null.
    pub fn as_constant(&self) -> Option<Constant> {
        if self.always_null {
            Some(Constant::Null)
        } else {
            None
        }
    }

    /// Fold a full-width reference load from a constant object.
    pub fn read_constant(
        &self,
        provider: &dyn MemoryAccessProvider,
        base: &Constant,
        displacement: i64,
    ) -> CompileResult<Option<Constant>> {
        provider.read_object_constant(base, displacement)
    }

    /// Fold a reference load from a constant array.
    pub fn read_array_element_constant(
        &self,
        reflection: &dyn ConstantReflectionProvider,
        array: &Constant,
        displacement: i64,
    ) -> Option<Constant> {
        reflection.read_array_element_for_offset(array, displacement)
    }

    /// Full-width stamps accept only uncompressed reference constants.
    pub fn is_compatible_constant(&self, constant: &Constant) -> bool {
        !constant.is_reference() || !constant.is_compressed()
    }

    /// The same facts in compressed representation.
    pub fn compressed(&self, encoding: CompressEncoding) -> NarrowStamp {
        NarrowStamp {
            facts: self.clone(),
            encoding,
        }
    }

    fn append_facts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a{}{} {}{}",
            if self.non_null { "!" } else { "" },
            if self.exact { "#" } else { "" },
            self.ty.as_ref().map_or("-", |ty| ty.name()),
            if self.always_null { " NULL" } else { "" },
        )
    }
}

impl fmt::Display for ObjectStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.append_facts(f)
    }
}

/// Facts about a compressed reference value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NarrowStamp {
    facts: ObjectStamp,
    encoding: CompressEncoding,
}

impl NarrowStamp {
    pub fn new(facts: ObjectStamp, encoding: CompressEncoding) -> Self {
        Self { facts, encoding }
    }

    pub fn encoding(&self) -> &CompressEncoding {
        &self.encoding
    }

    /// Type and nullness facts, independent of representation.
    pub fn facts(&self) -> &ObjectStamp {
        &self.facts
    }

    /// The same facts in full-width representation.
    pub fn uncompressed(&self) -> ObjectStamp {
        self.facts.clone()
    }

    /// Narrow stamps only mix with narrow stamps of the same encoding.
    pub fn is_compatible(&self, other: &NarrowStamp) -> bool {
        self.encoding == other.encoding
    }

    /// Caller must have checked [`NarrowStamp::is_compatible`].
    pub(crate) fn meet_facts(&self, other: &NarrowStamp) -> NarrowStamp {
        debug_assert!(self.is_compatible(other));
        NarrowStamp {
            facts: self.facts.meet(&other.facts),
            encoding: self.encoding,
        }
    }

    /// `CompressedNull` when the stamp only admits null.
    pub fn as_constant(&self) -> Option<Constant> {
        if self.facts.always_null {
            Some(Constant::CompressedNull)
        } else {
            None
        }
    }

    /// Fold a compressed reference load; the provider must understand narrow reads.
    pub fn read_constant(
        &self,
        provider: &dyn MemoryAccessProvider,
        base: &Constant,
        displacement: i64,
    ) -> CompileResult<Option<Constant>> {
        provider.read_narrow_object_constant(base, displacement, &self.encoding)
    }

    /// Fold an array element load; the generic read is re-compressed because
    /// the element is stored narrow at run time.
    pub fn read_array_element_constant(
        &self,
        reflection: &dyn ConstantReflectionProvider,
        array: &Constant,
        displacement: i64,
    ) -> Option<Constant> {
        reflection
            .read_array_element_for_offset(array, displacement)
            .map(Constant::compress)
    }

    /// Reference constants must already be compressed; other constants pass.
    pub fn is_compatible_constant(&self, constant: &Constant) -> bool {
        !constant.is_reference() || constant.is_compressed()
    }
}

impl fmt::Display for NarrowStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("n")?;
        self.facts.append_facts(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> (TypeRef, TypeRef, TypeRef) {
        let object = TypeRef::root("Object");
        let a = TypeRef::subclass("A", &object);
        let b = TypeRef::subclass("B", &object);
        (object, a, b)
    }

    #[test]
    fn test_meet_of_distinct_types() {
        let (object, a, b) = hierarchy();
        let merged = ObjectStamp::exact_non_null(a).meet(&ObjectStamp::exact_non_null(b));
        assert_eq!(merged.ty(), Some(&object));
        assert!(!merged.is_exact_type());
        assert!(merged.non_null());
        assert!(!merged.always_null());
    }

    #[test]
    fn test_meet_with_null_keeps_type() {
        let (_, a, _) = hierarchy();
        let merged = ObjectStamp::exact_non_null(a.clone()).meet(&ObjectStamp::null());
        assert_eq!(merged.ty(), Some(&a));
        assert!(merged.is_exact_type());
        assert!(!merged.non_null());
        assert!(!merged.always_null());

        let both_null = ObjectStamp::null().meet(&ObjectStamp::null());
        assert!(both_null.always_null());
    }

    #[test]
    fn test_empty_is_identity() {
        let (_, a, _) = hierarchy();
        let empty = ObjectStamp::new(None, false, true, true);
        let stamp = ObjectStamp::non_null_of(a);
        assert_eq!(empty.meet(&stamp), stamp);
        assert_eq!(stamp.meet(&empty), stamp);
    }

    #[test]
    fn test_meet_with_unrestricted_type() {
        let (_, a, _) = hierarchy();
        let merged = ObjectStamp::exact_non_null(a).meet(&ObjectStamp::unrestricted());
        assert_eq!(merged.ty(), None);
        assert!(!merged.is_exact_type());
        assert!(!merged.non_null());
    }

    #[test]
    fn test_display() {
        let (_, a, _) = hierarchy();
        let stamp = ObjectStamp::exact_non_null(a);
        assert_eq!(stamp.to_string(), "a!# A");
        assert_eq!(
            stamp.compressed(CompressEncoding::with_shift(3)).to_string(),
            "na!# A"
        );
        assert_eq!(ObjectStamp::null().to_string(), "a - NULL");
    }

    #[test]
    fn test_constant_compatibility() {
        let narrow = ObjectStamp::unrestricted().compressed(CompressEncoding::with_shift(3));
        let wide = ObjectStamp::unrestricted();
        let obj = Constant::object(0x1000);

        assert!(narrow.is_compatible_constant(&obj.compress()));
        assert!(!narrow.is_compatible_constant(&obj));
        assert!(narrow.is_compatible_constant(&Constant::int(32, 1)));
        assert!(wide.is_compatible_constant(&obj));
        assert!(!wide.is_compatible_constant(&Constant::CompressedNull));
    }
}
