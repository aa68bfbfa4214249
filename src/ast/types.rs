use std::fmt::Display;

/// A type as written in source. The checker resolves it to a `Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnnotation {
    Int,
    Boolean,
    String,
    /// Inferred from use.
    Var,
    Void,
    Array(Box<TypeAnnotation>, u32),
    Sum(Vec<TypeAnnotation>),
}

impl Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeAnnotation::Int => write!(f, "int"),
            TypeAnnotation::Boolean => write!(f, "boolean"),
            TypeAnnotation::String => write!(f, "string"),
            TypeAnnotation::Var => write!(f, "var"),
            TypeAnnotation::Void => write!(f, "void"),
            TypeAnnotation::Array(element, length) => write!(f, "{}[{}]", element, length),
            TypeAnnotation::Sum(cases) => {
                let cases = cases
                    .iter()
                    .map(|case| case.to_string())
                    .collect::<Vec<String>>();
                write!(f, "{}", cases.join(" | "))
            }
        }
    }
}
