//! Destination shapes for decoded records.
//!
//! [`Element`] abstracts over records stored by value (`R`) and records stored
//! behind one level of indirection (`Option<Box<R>>`, allocated on first
//! write). [`RecordContainer`] abstracts over fixed-capacity destinations
//! (arrays and slices) and growable ones (`Vec`), so the engines never
//! special-case either.

use std::any::type_name;

use crate::{
    descriptor::Record,
    error::{BindError, BindResult},
};

/// One slot of a record container.
pub trait Element: Sized {
    type Record: Record;

    /// A fresh element for a body row.
    fn vacant() -> Self;

    /// The record, if one has been allocated.
    fn record(&self) -> Option<&Self::Record>;

    /// The record, allocating it first when needed.
    fn record_mut(&mut self) -> &mut Self::Record;
}

impl<R: Record> Element for R {
    type Record = R;

    fn vacant() -> Self {
        R::default()
    }

    fn record(&self) -> Option<&R> {
        Some(self)
    }

    fn record_mut(&mut self) -> &mut R {
        self
    }
}

impl<R: Record> Element for Option<Box<R>> {
    type Record = R;

    fn vacant() -> Self {
        None
    }

    fn record(&self) -> Option<&R> {
        self.as_deref()
    }

    fn record_mut(&mut self) -> &mut R {
        self.get_or_insert_with(Box::default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerShape {
    Fixed,
    Growable,
}

pub trait RecordContainer {
    type Item: Element;

    fn shape(&self) -> ContainerShape;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes room for exactly `rows` elements, or fails without touching the
    /// container when it cannot hold them.
    fn ensure_rows(&mut self, rows: usize) -> BindResult<()>;

    fn slot_mut(&mut self, index: usize) -> Option<&mut Self::Item>;
}

fn ensure_fixed(container: &'static str, available: usize, needed: usize) -> BindResult<()> {
    if available < needed {
        return Err(BindError::Capacity {
            container,
            needed,
            available,
        });
    }
    Ok(())
}

impl<E: Element> RecordContainer for Vec<E> {
    type Item = E;

    fn shape(&self) -> ContainerShape {
        ContainerShape::Growable
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn ensure_rows(&mut self, rows: usize) -> BindResult<()> {
        if Vec::len(self) > rows {
            self.truncate(rows);
        } else {
            self.reserve_exact(rows - Vec::len(self));
            self.resize_with(rows, E::vacant);
        }
        Ok(())
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut E> {
        self.get_mut(index)
    }
}

impl<E: Element, const N: usize> RecordContainer for [E; N] {
    type Item = E;

    fn shape(&self) -> ContainerShape {
        ContainerShape::Fixed
    }

    fn len(&self) -> usize {
        N
    }

    fn ensure_rows(&mut self, rows: usize) -> BindResult<()> {
        ensure_fixed(type_name::<Self>(), N, rows)
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut E> {
        self.get_mut(index)
    }
}

impl<E: Element> RecordContainer for [E] {
    type Item = E;

    fn shape(&self) -> ContainerShape {
        ContainerShape::Fixed
    }

    fn len(&self) -> usize {
        <[E]>::len(self)
    }

    fn ensure_rows(&mut self, rows: usize) -> BindResult<()> {
        ensure_fixed(type_name::<Self>(), <[E]>::len(self), rows)
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut E> {
        self.get_mut(index)
    }
}
