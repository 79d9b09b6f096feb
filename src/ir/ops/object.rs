//! Object patterns: field lists, rest capture and guards.

use std::sync::Arc;

use crate::ir::error::{Result, TransformError};
use crate::ir::node::{KEY_TYPE, Kinds, Node, NodeMap};
use crate::ir::op::{self, Op, OpRef};
use crate::ir::state::State;

/// An op over the fields of an object rather than over a whole node.
///
/// `match_fields` returns the fields it did not consume so that [`Part`] can capture them;
/// `construct_fields` adds its fields to `base`.
pub trait ObjectOp: Send + Sync {
    fn match_fields(&self, st: &mut State, obj: &NodeMap) -> Result<Option<NodeMap>>;

    fn construct_fields(&self, st: &State, base: NodeMap) -> Result<NodeMap>;
}

/// One field of an [`Obj`].
#[derive(Clone)]
pub struct Field {
    pub name: String,
    pub op: OpRef,
    /// Flag variable for optional fields: bound to whether the field was present.
    pub optional: Option<String>,
}

/// Object with a set of named fields.
///
/// Matching is open: fields not listed are ignored. Construction emits only the listed fields.
#[derive(Clone, Default)]
pub struct Obj {
    fields: Vec<Field>,
}

pub fn obj() -> Obj {
    Obj::default()
}

impl Obj {
    pub fn field(mut self, name: &str, op: OpRef) -> Self {
        self.push(Field {
            name: name.to_string(),
            op,
            optional: None,
        });
        self
    }

    /// Adds a field that may be absent; presence is recorded in the boolean variable `flag`.
    pub fn opt(mut self, flag: &str, name: &str, op: OpRef) -> Self {
        self.push(Field {
            name: name.to_string(),
            op,
            optional: Some(flag.to_string()),
        });
        self
    }

    /// Replaces any earlier field with the same name.
    pub fn push(&mut self, field: Field) {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn into_op(self) -> OpRef {
        Arc::new(self)
    }
}

impl ObjectOp for Obj {
    fn match_fields(&self, st: &mut State, obj: &NodeMap) -> Result<Option<NodeMap>> {
        let mut rest = obj.clone();
        for f in &self.fields {
            match obj.get(&f.name) {
                Some(value) => {
                    if !op::check(f.op.as_ref(), st, value)? {
                        return Ok(None);
                    }
                    if let Some(flag) = &f.optional {
                        if !st.bind(flag, Node::Bool(true)) {
                            return Ok(None);
                        }
                    }
                    rest.remove_mut(&f.name);
                }
                None => match &f.optional {
                    Some(flag) if st.bind(flag, Node::Bool(false)) => {}
                    _ => return Ok(None),
                },
            }
        }
        Ok(Some(rest))
    }

    fn construct_fields(&self, st: &State, mut base: NodeMap) -> Result<NodeMap> {
        for f in &self.fields {
            if let Some(flag) = &f.optional {
                if !st.flag(flag)? {
                    continue;
                }
            }
            let value = f.op.construct(st, None)?;
            base.insert_mut(f.name.clone(), value);
        }
        Ok(base)
    }
}

impl Op for Obj {
    fn kinds(&self) -> Kinds {
        Kinds::OBJECT
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        match node {
            Node::Object(map) => Ok(self.match_fields(st, map)?.is_some()),
            _ => Ok(false),
        }
    }

    fn construct(&self, st: &State, _seed: Option<Node>) -> Result<Node> {
        Ok(Node::Object(
            self.construct_fields(st, NodeMap::new_with_ptr_kind())?,
        ))
    }
}

/// Rest capture: binds every field the inner op did not consume, and puts them back on
/// construct.
pub struct Part {
    var: String,
    inner: Arc<dyn ObjectOp>,
}

pub fn part(var: &str, inner: impl ObjectOp + 'static) -> OpRef {
    Arc::new(Part {
        var: var.to_string(),
        inner: Arc::new(inner),
    })
}

impl Op for Part {
    fn kinds(&self) -> Kinds {
        Kinds::OBJECT
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let Node::Object(map) = node else {
            return Ok(false);
        };
        match self.inner.match_fields(st, map)? {
            Some(rest) => Ok(st.bind(&self.var, Node::Object(rest))),
            None => Ok(false),
        }
    }

    fn construct(&self, st: &State, _seed: Option<Node>) -> Result<Node> {
        let base = match st.must_get(&self.var)? {
            Node::Object(map) => map.clone(),
            other => return Err(TransformError::unexpected("object", other)),
        };
        Ok(Node::Object(self.inner.construct_fields(st, base)?))
    }
}

/// Guard: the object has the listed fields. Bindings are discarded and it cannot construct.
pub struct Has(Obj);

pub fn has(fields: Obj) -> OpRef {
    Arc::new(Has(fields))
}

impl Op for Has {
    fn kinds(&self) -> Kinds {
        Kinds::OBJECT
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let mut scratch = st.snapshot();
        self.0.check(&mut scratch, node)
    }

    fn construct(&self, _st: &State, _seed: Option<Node>) -> Result<Node> {
        Err(TransformError::NotConstructible("Has"))
    }
}

/// Guard: the object's `@type` equals a given tag.
pub struct HasType(String);

pub fn has_type(typ: &str) -> OpRef {
    Arc::new(HasType(typ.to_string()))
}

impl Op for HasType {
    fn kinds(&self) -> Kinds {
        Kinds::OBJECT
    }

    fn check(&self, _st: &mut State, node: &Node) -> Result<bool> {
        Ok(node.get(KEY_TYPE).and_then(Node::as_str) == Some(self.0.as_str()))
    }

    fn construct(&self, _st: &State, _seed: Option<Node>) -> Result<Node> {
        Err(TransformError::NotConstructible("HasType"))
    }
}
