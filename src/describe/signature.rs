use std::fmt::Display;

use crate::types::TypeRef;

/// The shape of a callable unit: its ordered parameter types and its return
/// type.
///
/// Signatures are compared structurally, so units declared by unrelated
/// types or modules share one callable type descriptor whenever their shapes
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    params: Vec<TypeRef>,
    ret: TypeRef,
}

impl Signature {
    /// Creates a signature.
    pub fn new(params: impl Into<Vec<TypeRef>>, ret: TypeRef) -> Self {
        Self {
            params: params.into(),
            ret,
        }
    }

    /// Parameter types in declaration order.
    #[must_use]
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Return type.
    #[must_use]
    pub fn ret(&self) -> &TypeRef {
        &self.ret
    }

    /// Number of parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Deterministic name of the signature: the normalized return type name
    /// followed by `_` and the normalized name of each parameter.
    #[must_use]
    pub fn mangled_name(&self) -> String {
        let mut name = self.ret.normalized_name();
        for param in &self.params {
            name.push('_');
            name.push_str(&param.normalized_name());
        }
        name
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangled_name() {
        assert_eq!(Signature::new(Vec::new(), TypeRef::Void).mangled_name(), "void");
        assert_eq!(
            Signature::new([TypeRef::Handle], TypeRef::Bool).mangled_name(),
            "bool_ue4ssObjectHandle"
        );
        assert_eq!(
            Signature::new([TypeRef::I32, TypeRef::named("a::B")], TypeRef::I64).mangled_name(),
            "i64_i32_aB"
        );
    }

    #[test]
    fn test_structural_equality() {
        let a = Signature::new([TypeRef::I32], TypeRef::Bool);
        let b = Signature::new(vec![TypeRef::I32], TypeRef::Bool);
        assert_eq!(a, b);
        assert_ne!(a, Signature::new([TypeRef::U32], TypeRef::Bool));
        assert_eq!(a.to_string(), "fn(i32) -> bool");
    }
}
