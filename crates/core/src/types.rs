//! Type expressions referenced by generated source.
//!
//! A `TypeExpr` is a closed description of a Python type annotation:
//! - Builtin: `str`, `int`, `None`, ...
//! - Named: a nominal type identified by `(module, qualified name)`
//! - Generic: `base[arg, ...]`
//! - Union: `A | B`
//! - Literal: `Literal["a"]`, `Literal[HTTPStatus.OK]`
//! - SequenceOf: a lazily produced sequence of items (streaming responses)
//!
//! The structural value doubles as the identity key inside the import registry.

use serde::{Deserialize, Serialize};

/// Python builtin types that never need an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Builtin {
    /// `str`
    Str,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `bool`
    Bool,
    /// `bytes`
    Bytes,
    /// `None`
    None,
    /// `object`
    Object,
    /// `list`
    List,
    /// `dict`
    Dict,
    /// `tuple`
    Tuple,
    /// `set`
    Set,
    /// `frozenset`
    Frozenset,
    /// `type`
    Type,
}

impl Builtin {
    /// Python spelling of the builtin.
    pub fn as_str(self) -> &'static str {
        match self {
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::Bytes => "bytes",
            Builtin::None => "None",
            Builtin::Object => "object",
            Builtin::List => "list",
            Builtin::Dict => "dict",
            Builtin::Tuple => "tuple",
            Builtin::Set => "set",
            Builtin::Frozenset => "frozenset",
            Builtin::Type => "type",
        }
    }

    /// Whether a parameter or other local binding can shadow this name.
    pub fn is_shadowable(self) -> bool {
        !matches!(self, Builtin::None)
    }
}

/// A nominal type: `module.QualifiedName`.
///
/// An empty module marks a definition local to the generated module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedType {
    /// Dotted module path, empty for local definitions
    #[serde(default)]
    pub module: String,
    /// Qualified name inside the module, e.g. `Outer.Inner`
    pub name: String,
}

impl NamedType {
    /// Create a nominal type reference.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Reference to a definition emitted into the generated module itself.
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(String::new(), name)
    }

    /// True when the type is defined in the generated module.
    pub fn is_local(&self) -> bool {
        self.module.is_empty()
    }

    /// First segment of the qualified name (the importable symbol).
    pub fn head(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// Remaining segments after the head, if any (`Inner` for `Outer.Inner`).
    pub fn tail(&self) -> Option<&str> {
        self.name.split_once('.').map(|(_, rest)| rest)
    }
}

/// Value carried by a `Literal[...]` type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// `Literal[True]`
    Bool(bool),
    /// `Literal[3]`
    Int(i64),
    /// `Literal["foo"]`
    Str(String),
    /// `Literal[Color.RED]`
    EnumMember {
        /// The enum class
        #[serde(rename = "enum")]
        enum_type: NamedType,
        /// Member name
        member: String,
    },
    /// `Literal[None]`
    None,
}

/// A Python type annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    /// Builtin type
    Builtin {
        /// Which builtin
        name: Builtin,
    },
    /// Nominal type
    Named(NamedType),
    /// Generic application `base[args...]`
    Generic {
        /// Generic base, e.g. `list` or `typing.Sequence`
        base: Box<TypeExpr>,
        /// Type arguments
        args: Vec<TypeExpr>,
    },
    /// Union `A | B | ...`
    Union {
        /// Union members in declaration order
        members: Vec<TypeExpr>,
    },
    /// Literal type
    Literal {
        /// Literal value
        value: LiteralValue,
    },
    /// Lazily produced sequence of `item`, rendered with the registry's stream container
    SequenceOf {
        /// Element type
        item: Box<TypeExpr>,
    },
}

impl TypeExpr {
    /// Builtin type.
    pub fn builtin(name: Builtin) -> Self {
        TypeExpr::Builtin { name }
    }

    /// Nominal type from `module` and `name`.
    pub fn named(module: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Named(NamedType::new(module, name))
    }

    /// Local definition of the generated module.
    pub fn local(name: impl Into<String>) -> Self {
        TypeExpr::Named(NamedType::local(name))
    }

    /// `typing.Any`
    pub fn any() -> Self {
        Self::named("typing", "Any")
    }

    /// `base[args...]`
    pub fn generic(base: TypeExpr, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic {
            base: Box::new(base),
            args,
        }
    }

    /// `A | B | ...`
    pub fn union(members: Vec<TypeExpr>) -> Self {
        TypeExpr::Union { members }
    }

    /// `Literal[value]`
    pub fn literal(value: LiteralValue) -> Self {
        TypeExpr::Literal { value }
    }

    /// Streamed sequence of `item`.
    pub fn sequence_of(item: TypeExpr) -> Self {
        TypeExpr::SequenceOf {
            item: Box::new(item),
        }
    }

    /// `X | None`
    pub fn optional(inner: TypeExpr) -> Self {
        Self::union(vec![inner, Self::builtin(Builtin::None)])
    }

    /// Whether `None` is already a valid value of this type.
    pub fn accepts_none(&self) -> bool {
        match self {
            TypeExpr::Builtin { name } => matches!(name, Builtin::None | Builtin::Object),
            TypeExpr::Named(named) => {
                named.module == "typing" && matches!(named.name.as_str(), "Any" | "Optional")
            }
            TypeExpr::Generic { base, .. } => matches!(
                base.as_ref(),
                TypeExpr::Named(named) if named.module == "typing" && named.name == "Optional"
            ),
            TypeExpr::Union { members } => members.iter().any(TypeExpr::accepts_none),
            TypeExpr::Literal { value } => matches!(value, LiteralValue::None),
            TypeExpr::SequenceOf { .. } => false,
        }
    }

    /// `self | None` unless `None` is already accepted.
    pub fn or_none(self) -> Self {
        if self.accepts_none() {
            self
        } else {
            Self::optional(self)
        }
    }

    /// If this is a one-argument sequence generic (`list[T]`, `Sequence[T]`, ...),
    /// return the element type.
    pub fn sequence_item(&self) -> Option<&TypeExpr> {
        let TypeExpr::Generic { base, args } = self else {
            return None;
        };
        let [item] = args.as_slice() else {
            return None;
        };
        let is_sequence = match base.as_ref() {
            TypeExpr::Builtin { name } => matches!(name, Builtin::List | Builtin::Tuple),
            TypeExpr::Named(named) => {
                matches!(named.module.as_str(), "typing" | "collections.abc")
                    && matches!(
                        named.name.as_str(),
                        "List"
                            | "Sequence"
                            | "Iterable"
                            | "Iterator"
                            | "AsyncIterable"
                            | "AsyncIterator"
                            | "Generator"
                            | "AsyncGenerator"
                    )
            }
            _ => false,
        };
        is_sequence.then_some(item)
    }

    /// Direct children, in rendering order.
    pub fn children(&self) -> Vec<&TypeExpr> {
        match self {
            TypeExpr::Builtin { .. } | TypeExpr::Named(_) | TypeExpr::Literal { .. } => Vec::new(),
            TypeExpr::Generic { base, args } => {
                let mut children = vec![base.as_ref()];
                children.extend(args.iter());
                children
            }
            TypeExpr::Union { members } => members.iter().collect(),
            TypeExpr::SequenceOf { item } => vec![item.as_ref()],
        }
    }
}
