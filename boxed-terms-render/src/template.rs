//! Defines [`Node`], the compiled template tree consumed by the renderer.
//!
//! Templates are produced by a compiler outside this crate.  Expressions are
//! opaque evaluators over the variables in scope; everything else is plain
//! data.

use crate::ModuleId;
use boxed_terms::{Term, TermError};
use core::fmt;
use smartstring::alias::String;
use std::rc::Rc;

/// Signature of a compiled expression: variables in scope to a term.
pub type Evaluator = dyn Fn(&Term) -> Result<Term, TermError>;

/// A compiled expression.  Cloning shares the evaluator.
#[derive(Clone)]
pub struct Expression(Rc<Evaluator>);

impl Expression {
    pub fn new(f: impl Fn(&Term) -> Result<Term, TermError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// An expression that ignores its variables.
    pub fn constant(value: impl Into<Term>) -> Self {
        let value = value.into();
        Self::new(move |_| Ok(value.clone()))
    }

    /// An expression reading the atom-keyed variable `name`; evaluates to
    /// `nil` when the variable is unbound.
    pub fn var(name: &str) -> Self {
        let key = Term::atom(name);
        Self::new(move |vars| Ok(vars.get(&key)?.cloned().unwrap_or_else(Term::nil)))
    }

    #[inline]
    pub fn evaluate(&self, vars: &Term) -> Result<Term, TermError> {
        (self.0)(vars)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Expression(..)")
    }
}

/// Value of an element attribute or component prop.
#[derive(Clone, Debug)]
pub enum AttrValue {
    Literal(String),
    Expression(Expression),
    /// Attribute written without a value, e.g. `<input disabled>`.
    Empty,
}

#[derive(Clone, Debug)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

impl Attribute {
    pub fn literal(name: &str, value: &str) -> Self {
        Self {
            name: name.into(),
            value: AttrValue::Literal(value.into()),
        }
    }

    pub fn expression(name: &str, expression: Expression) -> Self {
        Self {
            name: name.into(),
            value: AttrValue::Expression(expression),
        }
    }

    pub fn empty(name: &str) -> Self {
        Self {
            name: name.into(),
            value: AttrValue::Empty,
        }
    }
}

/// One node of a compiled template.
#[derive(Clone, Debug)]
pub enum Node {
    /// A host element.  The tag `slot` is reserved for slot substitution.
    Element {
        tag: String,
        attrs: Vec<Attribute>,
        children: Vec<Node>,
    },
    Text(String),
    /// Interpolation of a computed value as text.
    Expression(Expression),
    /// A nested component; `children` become its default slot.
    Component {
        module: ModuleId,
        props: Vec<Attribute>,
        children: Vec<Node>,
    },
    /// Output of a conditional that produced nothing.
    Nil,
    /// A sequence flattened into its parent.
    Fragment(Vec<Node>),
    Conditional {
        condition: Expression,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

impl Node {
    pub fn element(tag: &str, attrs: Vec<Attribute>, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.into(),
            attrs,
            children,
        }
    }

    pub fn text(content: &str) -> Self {
        Node::Text(content.into())
    }

    pub fn expression(f: impl Fn(&Term) -> Result<Term, TermError> + 'static) -> Self {
        Node::Expression(Expression::new(f))
    }

    pub fn component(module: impl Into<ModuleId>, props: Vec<Attribute>, children: Vec<Node>) -> Self {
        Node::Component {
            module: module.into(),
            props,
            children,
        }
    }

    /// The slot placeholder.
    pub fn slot() -> Self {
        Self::element("slot", Vec::new(), Vec::new())
    }

    pub fn when(condition: Expression, then: Vec<Node>) -> Self {
        Node::Conditional {
            condition,
            then,
            otherwise: Vec::new(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Node::Nil)
    }
}
