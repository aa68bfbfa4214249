//! The type model: type values, inference variables and the subtype relation.
//!
//! Leaf types carry no data. Composite types live behind an `Rc`, which gives
//! every composite value an identity; equality on `Type` is that identity.
//! Inference variables are indices into a [`TypeTable`] owned by one
//! compilation unit.

use std::{cell::Cell, fmt::Display, rc::Rc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InferId(pub u32);

#[derive(Debug)]
pub struct ArrayType {
    pub element: Type,
    pub length: u32,
}

/// A callable signature. `defined` is false for a forward declaration and
/// flips once a matching definition is seen, for every holder of the value.
#[derive(Debug)]
pub struct InvokeType {
    pub params: Vec<Type>,
    pub ret: Type,
    pub variadic: bool,
    pub defined: Cell<bool>,
}

impl InvokeType {
    pub fn is_defined(&self) -> bool {
        self.defined.get()
    }

    pub fn mark_defined(&self) {
        self.defined.set(true);
    }
}

#[derive(Debug)]
pub struct SumType {
    pub cases: Vec<Type>,
}

impl SumType {
    /// Index of the case identical to `ty`.
    pub fn case_index(&self, ty: &Type) -> Option<usize> {
        self.cases.iter().position(|case| case == ty)
    }
}

#[derive(Debug, Clone)]
pub enum Type {
    Int,
    Bool,
    Str,
    /// Undefined value, also the return type of `void` functions.
    Bot,
    Array(Rc<ArrayType>),
    Invoke(Rc<InvokeType>),
    Infer(InferId),
    Sum(Rc<SumType>),
}

impl Type {
    pub fn array(element: Type, length: u32) -> Type {
        Type::Array(Rc::new(ArrayType { element, length }))
    }

    pub fn invoke(params: Vec<Type>, ret: Type, variadic: bool, defined: bool) -> Type {
        Type::Invoke(Rc::new(InvokeType {
            params,
            ret,
            variadic,
            defined: Cell::new(defined),
        }))
    }

    pub fn sum(cases: Vec<Type>) -> Type {
        Type::Sum(Rc::new(SumType { cases }))
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Type::Bot)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Int, Type::Int)
            | (Type::Bool, Type::Bool)
            | (Type::Str, Type::Str)
            | (Type::Bot, Type::Bot) => true,
            (Type::Array(a), Type::Array(b)) => Rc::ptr_eq(a, b),
            (Type::Invoke(a), Type::Invoke(b)) => Rc::ptr_eq(a, b),
            (Type::Sum(a), Type::Sum(b)) => Rc::ptr_eq(a, b),
            (Type::Infer(a), Type::Infer(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Type {}

/// Table-free rendering, used in logs. Diagnostics go through
/// [`TypeTable::describe`] so inference variables show their value.
impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "boolean"),
            Type::Str => write!(f, "string"),
            Type::Bot => write!(f, "undefined"),
            Type::Array(array) => write!(f, "{}[{}]", array.element, array.length),
            Type::Invoke(invoke) => {
                let params = invoke
                    .params
                    .iter()
                    .map(|param| param.to_string())
                    .collect::<Vec<String>>();
                write!(f, "function({}) -> {}", params.join(", "), invoke.ret)
            }
            Type::Infer(id) => write!(f, "var#{}", id.0),
            Type::Sum(sum) => {
                let cases = sum
                    .cases
                    .iter()
                    .map(|case| case.to_string())
                    .collect::<Vec<String>>();
                write!(f, "{}", cases.join(" | "))
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct InferVar {
    value: Option<Type>,
    /// Variables unified with this one before it was resolved.
    dependents: Vec<InferId>,
}

/// Resolution state of every inference variable in one unit.
#[derive(Debug, Default)]
pub struct TypeTable {
    vars: Vec<InferVar>,
}

impl TypeTable {
    pub fn new() -> Self {
        TypeTable::default()
    }

    /// A new unresolved inference variable.
    pub fn fresh(&mut self) -> Type {
        let id = InferId(self.vars.len() as u32);
        self.vars.push(InferVar::default());
        log::trace!("fresh inference variable var#{}", id.0);
        Type::Infer(id)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn resolved(&self, id: InferId) -> Option<&Type> {
        self.vars
            .get(id.0 as usize)
            .and_then(|var| var.value.as_ref())
    }

    pub fn dependents(&self, id: InferId) -> &[InferId] {
        self.vars
            .get(id.0 as usize)
            .map(|var| var.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Follows a resolved inference variable to its value.
    pub fn prune(&self, ty: &Type) -> Type {
        match ty {
            Type::Infer(id) => match self.resolved(*id) {
                Some(value) => self.prune(value),
                None => ty.clone(),
            },
            _ => ty.clone(),
        }
    }

    pub fn is_unresolved(&self, ty: &Type) -> bool {
        matches!(self.prune(ty), Type::Infer(_))
    }

    pub fn describe(&self, ty: &Type) -> String {
        match ty {
            Type::Int => String::from("int"),
            Type::Bool => String::from("boolean"),
            Type::Str => String::from("string"),
            Type::Bot => String::from("undefined"),
            Type::Array(array) => format!("{}[{}]", self.describe(&array.element), array.length),
            Type::Invoke(invoke) => {
                let params = invoke
                    .params
                    .iter()
                    .map(|param| self.describe(param))
                    .collect::<Vec<String>>();
                let ret = if invoke.ret.is_bot() {
                    String::from("void")
                } else {
                    self.describe(&invoke.ret)
                };
                format!("function({}) -> {}", params.join(", "), ret)
            }
            Type::Infer(id) => match self.resolved(*id) {
                Some(value) => self.describe(value),
                None => String::from("var"),
            },
            Type::Sum(sum) => sum
                .cases
                .iter()
                .map(|case| self.describe(case))
                .collect::<Vec<String>>()
                .join(" | "),
        }
    }

    /// Is `a` usable where `b` is expected.
    ///
    /// When `a` is an inference variable the question goes to its own
    /// supertype test against `b`, which may bind it.
    pub fn is_subtype(&mut self, a: &Type, b: &Type) -> bool {
        match a {
            Type::Infer(id) => self.infer_accepts(*id, b),
            _ => self.accepts(b, a),
        }
    }

    pub fn is_supertype(&mut self, a: &Type, b: &Type) -> bool {
        self.is_subtype(b, a)
    }

    /// The supertype test of `sup`: does it accept a value of type `sub`.
    fn accepts(&mut self, sup: &Type, sub: &Type) -> bool {
        match sup {
            Type::Int => matches!(sub, Type::Int),
            Type::Bool => matches!(sub, Type::Bool),
            Type::Str => matches!(sub, Type::Str),
            Type::Bot => false,
            Type::Array(expected) => match sub {
                Type::Array(found) => {
                    found.length == expected.length
                        && self.is_subtype(&found.element, &expected.element)
                }
                _ => false,
            },
            Type::Invoke(expected) => match sub {
                Type::Invoke(found) => {
                    if found.params.len() != expected.params.len()
                        || found.variadic != expected.variadic
                    {
                        return false;
                    }

                    let params_match = found
                        .params
                        .iter()
                        .zip(expected.params.iter())
                        .all(|(f, e)| self.is_subtype(f, e));

                    params_match
                        && ((found.ret.is_bot() && expected.ret.is_bot())
                            || self.is_subtype(&found.ret, &expected.ret))
                }
                _ => false,
            },
            Type::Sum(sum) => sum.case_index(sub).is_some(),
            Type::Infer(id) => self.infer_accepts(*id, sub),
        }
    }

    fn infer_accepts(&mut self, id: InferId, other: &Type) -> bool {
        if let Some(value) = self.resolved(id).cloned() {
            return self.is_subtype(&value, other);
        }

        match other {
            Type::Infer(other_id) if *other_id == id => true,
            Type::Infer(other_id) => match self.resolved(*other_id).cloned() {
                Some(value) => self.bind(id, &value),
                None => {
                    self.link(id, *other_id);
                    true
                }
            },
            _ => self.bind(id, other),
        }
    }

    fn link(&mut self, a: InferId, b: InferId) {
        log::trace!("linking var#{} with var#{}", a.0, b.0);

        if !self.vars[a.0 as usize].dependents.contains(&b) {
            self.vars[a.0 as usize].dependents.push(b);
        }
        if !self.vars[b.0 as usize].dependents.contains(&a) {
            self.vars[b.0 as usize].dependents.push(a);
        }
    }

    /// Resolves `id` to `ty` and propagates to every linked variable.
    ///
    /// The value is committed before the dependents are visited and stays
    /// committed when one of them rejects it.
    pub fn bind(&mut self, id: InferId, ty: &Type) -> bool {
        if matches!(ty, Type::Infer(_)) {
            return false;
        }

        if let Some(value) = self.resolved(id).cloned() {
            return value == *ty || self.is_subtype(ty, &value);
        }

        log::trace!("binding var#{} to {}", id.0, ty);
        self.vars[id.0 as usize].value = Some(ty.clone());

        let dependents = self.dependents(id).to_vec();
        let mut result = true;
        for dependent in dependents {
            result &= self.bind(dependent, ty);
        }

        result
    }
}
