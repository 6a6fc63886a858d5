//! Field descriptors: which columns bind to which record fields.
//!
//! A record type registers its bindable fields once through [`Record::describe`].
//! The [`SchemaBuilder`] turns those registrations into a flat, ordered list of
//! [`FieldDescriptor`]s:
//!
//! - each scalar field contributes one descriptor carrying its column keys,
//!   its [`ScalarKind`] and its omit-empty flag
//! - embedded records (`nest`) and boxed optional records (`nest_boxed`) are
//!   flattened into the parent list, every descriptor gaining one
//!   [`PathStep`] per nesting level
//! - unregistered fields, `skip`ped fields and fields tagged `-` are unbound
//!
//! Each descriptor also carries a precomputed access path: one type-erased
//! hop per nesting level plus a leaf slot. Reads walk the hops and stop at the
//! first unset optional record; writes walk the same hops and allocate unset
//! optional records on the way down.
//!
//! Schemas are built once per record type and cached process-wide through
//! [`RecordSchema::of`]; they are immutable afterwards.

use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use log::debug;

use crate::{
    error::{BindError, BindResult},
    scalar::{CoercionError, Scalar, ScalarKind},
};

/// A record type whose fields can be bound to columns.
///
/// ```ignore
/// impl Record for Person {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema
///             .field("name", "Name", |p| &p.name, |p| &mut p.name)
///             .field("age", "Age,omitempty", |p| &p.age, |p| &mut p.age);
///     }
/// }
/// ```
pub trait Record: Default + 'static {
    fn describe(schema: &mut SchemaBuilder<Self>);
}

const OMIT_EMPTY_FLAG: &str = "omitempty";
const IGNORE_TAG: &str = "-";

/// Column keys and flags declared for one field.
///
/// The textual form is a comma-separated list of keys, optionally including
/// the `omitempty` flag. A tag of `-` leaves the field unbound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldTag {
    keys: Vec<String>,
    omit_empty: bool,
    ignored: bool,
}

impl FieldTag {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            keys: vec![key.into()],
            ..Self::default()
        }
    }

    pub fn parse(tag: &str) -> Self {
        if tag.trim() == IGNORE_TAG {
            return Self {
                ignored: true,
                ..Self::default()
            };
        }
        let mut parsed = Self::default();
        for token in tag.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token == OMIT_EMPTY_FLAG {
                parsed.omit_empty = true;
            } else {
                parsed.keys.push(token.to_string());
            }
        }
        parsed
    }

    pub fn alias(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_omit_empty(&self) -> bool {
        self.omit_empty
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }
}

impl From<&str> for FieldTag {
    fn from(tag: &str) -> Self {
        FieldTag::parse(tag)
    }
}

/// One structural step from a record to one of its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub name: String,
    /// Declaration position of the field within its parent record.
    pub index: usize,
    /// The step passes through an `Option<Box<_>>`.
    pub indirect: bool,
}

pub(crate) enum Reach<'a> {
    Node(&'a dyn Any),
    Unset,
}

type ReadHop = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<Reach<'a>> + Send + Sync>;
type WriteHop = Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;
type ReadSlot = Arc<dyn Fn(&dyn Any) -> Option<String> + Send + Sync>;
type WriteSlot = Arc<dyn Fn(&mut dyn Any, &str) -> Option<Result<(), CoercionError>> + Send + Sync>;

fn read_hop<F>(hop: F) -> ReadHop
where
    F: for<'a> Fn(&'a dyn Any) -> Option<Reach<'a>> + Send + Sync + 'static,
{
    Arc::new(hop)
}

fn write_hop<F>(hop: F) -> WriteHop
where
    F: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync + 'static,
{
    Arc::new(hop)
}

#[derive(Clone)]
struct Hop {
    read: ReadHop,
    write: WriteHop,
}

pub(crate) enum WriteFailure {
    Coercion(CoercionError),
    Layout,
}

/// Compiled metadata for one bindable field of a record type.
#[derive(Clone)]
pub struct FieldDescriptor {
    keys: Vec<String>,
    access_path: Vec<PathStep>,
    kind: ScalarKind,
    omit_empty: bool,
    optional: bool,
    hops: Vec<Hop>,
    read_slot: ReadSlot,
    write_slot: WriteSlot,
}

impl FieldDescriptor {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The key used as the column name when encoding.
    pub fn primary_key(&self) -> &str {
        &self.keys[0]
    }

    pub fn matches_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn access_path(&self) -> &[PathStep] {
        &self.access_path
    }

    /// Dotted field path, e.g. `address.city`.
    pub fn path_display(&self) -> String {
        self.access_path
            .iter()
            .map(|step| step.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    /// The slot is an `Option<_>` scalar.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub(crate) fn read_cell(&self, record: &dyn Any) -> BindResult<String> {
        let mut node = record;
        for hop in &self.hops {
            match (hop.read)(node) {
                Some(Reach::Node(next)) => node = next,
                Some(Reach::Unset) => return Ok(String::new()),
                None => return Err(self.layout_error()),
            }
        }
        (self.read_slot)(node).ok_or_else(|| self.layout_error())
    }

    pub(crate) fn write_cell(&self, record: &mut dyn Any, text: &str) -> Result<(), WriteFailure> {
        let mut node = record;
        for hop in &self.hops {
            node = (hop.write)(node).ok_or(WriteFailure::Layout)?;
        }
        match (self.write_slot)(node, text) {
            Some(result) => result.map_err(WriteFailure::Coercion),
            None => Err(WriteFailure::Layout),
        }
    }

    pub(crate) fn layout_error(&self) -> BindError {
        BindError::AccessPath {
            key: self.primary_key().to_string(),
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("keys", &self.keys)
            .field("access_path", &self.access_path)
            .field("kind", &self.kind)
            .field("omit_empty", &self.omit_empty)
            .field("optional", &self.optional)
            .finish()
    }
}

/// Collects field registrations for one record type.
pub struct SchemaBuilder<R> {
    fields: Vec<FieldDescriptor>,
    next_index: usize,
    problems: Vec<String>,
    lineage: Vec<TypeId>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> SchemaBuilder<R> {
    fn new(mut lineage: Vec<TypeId>) -> Self {
        lineage.push(TypeId::of::<R>());
        Self {
            fields: Vec::new(),
            next_index: 0,
            problems: Vec::new(),
            lineage,
            _record: PhantomData,
        }
    }

    fn claim_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Registers a scalar field.
    pub fn field<T: Scalar>(
        &mut self,
        name: &str,
        tag: impl Into<FieldTag>,
        read: fn(&R) -> &T,
        write: fn(&mut R) -> &mut T,
    ) -> &mut Self {
        let index = self.claim_index();
        let tag = tag.into();
        if tag.is_ignored() {
            return self;
        }
        if tag.keys.is_empty() {
            debug!("Field '{name}' declares no column keys; leaving it unbound");
            return self;
        }
        let read_slot: ReadSlot = Arc::new(move |node: &dyn Any| {
            node.downcast_ref::<R>()
                .map(|record| read(record).render_cell())
        });
        let write_slot: WriteSlot = Arc::new(move |node: &mut dyn Any, text: &str| {
            node.downcast_mut::<R>()
                .map(|record| T::parse_cell(text).map(|value| *write(record) = value))
        });
        self.fields.push(FieldDescriptor {
            keys: tag.keys,
            access_path: vec![PathStep {
                name: name.to_string(),
                index,
                indirect: false,
            }],
            kind: T::KIND,
            omit_empty: tag.omit_empty,
            optional: T::OPTIONAL,
            hops: Vec::new(),
            read_slot,
            write_slot,
        });
        self
    }

    /// Flattens the fields of an embedded record into this one.
    pub fn nest<N: Record>(
        &mut self,
        name: &str,
        read: fn(&R) -> &N,
        write: fn(&mut R) -> &mut N,
    ) -> &mut Self {
        let index = self.claim_index();
        let hop = Hop {
            read: read_hop(move |node| {
                node.downcast_ref::<R>()
                    .map(|record| Reach::Node(read(record)))
            }),
            write: write_hop(move |node| {
                node.downcast_mut::<R>()
                    .map(|record| write(record) as &mut dyn Any)
            }),
        };
        let step = PathStep {
            name: name.to_string(),
            index,
            indirect: false,
        };
        self.absorb::<N>(step, hop)
    }

    /// Flattens the fields of an optional boxed record into this one.
    ///
    /// Reads through an unset record produce empty cells; the first write
    /// allocates `N::default()`.
    pub fn nest_boxed<N: Record>(
        &mut self,
        name: &str,
        read: fn(&R) -> &Option<Box<N>>,
        write: fn(&mut R) -> &mut Option<Box<N>>,
    ) -> &mut Self {
        let index = self.claim_index();
        let hop = Hop {
            read: read_hop(move |node| {
                node.downcast_ref::<R>().map(|record| match read(record) {
                    Some(inner) => Reach::Node(&**inner),
                    None => Reach::Unset,
                })
            }),
            write: write_hop(move |node| {
                node.downcast_mut::<R>().map(|record| {
                    let slot = write(record);
                    &mut **slot.get_or_insert_with(Box::default) as &mut dyn Any
                })
            }),
        };
        let step = PathStep {
            name: name.to_string(),
            index,
            indirect: true,
        };
        self.absorb::<N>(step, hop)
    }

    /// Declares a field that takes no part in binding.
    pub fn skip(&mut self, _name: &str) -> &mut Self {
        self.claim_index();
        self
    }

    fn absorb<N: Record>(&mut self, step: PathStep, hop: Hop) -> &mut Self {
        if self.lineage.contains(&TypeId::of::<N>()) {
            self.problems.push(format!(
                "field '{}' nests {} inside itself",
                step.name,
                type_name::<N>()
            ));
            return self;
        }
        let mut inner = SchemaBuilder::<N>::new(self.lineage.clone());
        N::describe(&mut inner);
        self.problems.extend(
            inner
                .problems
                .into_iter()
                .map(|problem| format!("{}: {problem}", step.name)),
        );
        for mut field in inner.fields {
            field.access_path.insert(0, step.clone());
            field.hops.insert(0, hop.clone());
            self.fields.push(field);
        }
        self
    }

    fn finish(self) -> BindResult<RecordSchema> {
        let record = type_name::<R>();
        if !self.problems.is_empty() {
            return Err(BindError::Schema {
                record,
                reason: self.problems.join("; "),
            });
        }
        Ok(RecordSchema {
            record,
            fields: self.fields,
        })
    }
}

/// The ordered descriptor list of one record type.
#[derive(Debug)]
pub struct RecordSchema {
    record: &'static str,
    fields: Vec<FieldDescriptor>,
}

type SchemaCache = RwLock<HashMap<TypeId, Arc<RecordSchema>>>;

fn schema_cache() -> &'static SchemaCache {
    static CACHE: OnceLock<SchemaCache> = OnceLock::new();
    CACHE.get_or_init(SchemaCache::default)
}

impl RecordSchema {
    /// Returns the cached schema for `R`, extracting it on first use.
    pub fn of<R: Record>() -> BindResult<Arc<RecordSchema>> {
        let id = TypeId::of::<R>();
        if let Some(schema) = schema_cache()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(Arc::clone(schema));
        }
        let schema = Arc::new(Self::extract::<R>()?);
        debug!(
            "Extracted {} bindable field(s) from {}",
            schema.len(),
            schema.record
        );
        let mut cache = schema_cache()
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(id).or_insert(schema)))
    }

    /// Extracts the schema for `R` without consulting the cache.
    pub fn extract<R: Record>() -> BindResult<RecordSchema> {
        let mut builder = SchemaBuilder::<R>::new(Vec::new());
        R::describe(&mut builder);
        builder.finish()
    }

    pub fn record_name(&self) -> &'static str {
        self.record
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
