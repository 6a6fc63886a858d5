//! Column-to-field resolution for one decode call.
//!
//! [`ColumnBindings::resolve`] maps every header position to the descriptor
//! that claims it, applying the configured validation modes:
//!
//! - repeated header names are rejected up front when
//!   `fail_if_double_header_names` is set
//! - repeated names bind to successive fields declaring the same key when
//!   `align_duplicate_headers_with_field_order` is set, otherwise always to the
//!   first such field
//! - fields none of whose keys appear in the header are rejected when
//!   `fail_if_unmatched_struct_tags` is set
//!
//! Header columns claimed by no field are ignored.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::debug;

use crate::{
    config::BindConfig,
    descriptor::RecordSchema,
    error::{BindError, BindResult},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBindings {
    /// Per column position, the index of the bound descriptor.
    columns: Vec<Option<usize>>,
    ignored: Vec<String>,
}

impl ColumnBindings {
    pub fn resolve(
        header: &[String],
        schema: &RecordSchema,
        config: &BindConfig,
    ) -> BindResult<Self> {
        if config.fail_if_double_header_names {
            ensure_unique_header(header)?;
        }

        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        let mut columns = Vec::with_capacity(header.len());
        let mut ignored = Vec::new();
        for name in header {
            let seen = occurrences.get(name.as_str()).copied().unwrap_or(0);
            let bound = schema
                .fields()
                .iter()
                .enumerate()
                .filter(|(_, field)| field.matches_key(name))
                .map(|(idx, _)| idx)
                .nth(seen);
            match bound {
                Some(_) if config.align_duplicate_headers_with_field_order => {
                    occurrences.insert(name.as_str(), seen + 1);
                }
                Some(_) => {}
                None => ignored.push(name.clone()),
            }
            columns.push(bound);
        }

        if config.fail_if_unmatched_struct_tags {
            ensure_fields_matched(header, schema)?;
        }

        if !ignored.is_empty() {
            debug!(
                "Ignoring {} header column(s) not claimed by {}: {}",
                ignored.len(),
                schema.record_name(),
                ignored.iter().join(", ")
            );
        }
        debug!(
            "Bound {} of {} header column(s) to {}",
            columns.iter().flatten().count(),
            header.len(),
            schema.record_name()
        );
        Ok(Self { columns, ignored })
    }

    /// Binds column N to descriptor N, for rows without a header.
    pub fn positional(schema: &RecordSchema) -> Self {
        Self {
            columns: (0..schema.len()).map(Some).collect(),
            ignored: Vec::new(),
        }
    }

    /// The descriptor index bound to `column`, if any.
    pub fn field_for(&self, column: usize) -> Option<usize> {
        self.columns.get(column).copied().flatten()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Header names no field claimed, in header order.
    pub fn ignored_columns(&self) -> &[String] {
        &self.ignored
    }

    /// Bound (column, descriptor) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(column, field)| field.map(|field| (column, field)))
    }
}

fn ensure_unique_header(header: &[String]) -> BindResult<()> {
    let names = header.iter().duplicates().cloned().collect::<Vec<_>>();
    if names.is_empty() {
        Ok(())
    } else {
        Err(BindError::DuplicateHeaders { names })
    }
}

fn ensure_fields_matched(header: &[String], schema: &RecordSchema) -> BindResult<()> {
    let present = header.iter().map(String::as_str).collect::<HashSet<_>>();
    let keys = schema
        .fields()
        .iter()
        .filter(|field| !field.keys().iter().any(|key| present.contains(key.as_str())))
        .flat_map(|field| field.keys().iter().cloned())
        .collect::<Vec<_>>();
    if keys.is_empty() {
        Ok(())
    } else {
        Err(BindError::UnmatchedFields { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Record, SchemaBuilder};

    #[derive(Debug, Default)]
    struct Visit {
        name: String,
        first: String,
        second: String,
        score: f64,
    }

    impl Record for Visit {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field("name", "Name", |v| &v.name, |v| &mut v.name)
                .field("first", "Site", |v| &v.first, |v| &mut v.first)
                .field("second", "Site", |v| &v.second, |v| &mut v.second)
                .field("score", "Score,Points", |v| &v.score, |v| &mut v.score);
        }
    }

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn schema() -> std::sync::Arc<RecordSchema> {
        RecordSchema::of::<Visit>().expect("schema")
    }

    #[test]
    fn aliases_and_extra_columns_resolve() {
        let bindings = ColumnBindings::resolve(
            &header(&["Points", "Extra", "Name", "Site"]),
            &schema(),
            &BindConfig::strict(),
        )
        .expect("resolve");
        assert_eq!(bindings.field_for(0), Some(3));
        assert_eq!(bindings.field_for(1), None);
        assert_eq!(bindings.field_for(2), Some(0));
        assert_eq!(bindings.field_for(3), Some(1));
        assert_eq!(bindings.ignored_columns(), ["Extra".to_string()]);
        assert_eq!(bindings.iter().count(), 3);
    }

    #[test]
    fn aligned_duplicates_follow_declaration_order() {
        let config = BindConfig::permissive().with_align_duplicate_headers(true);
        let bindings =
            ColumnBindings::resolve(&header(&["Site", "Name", "Site", "Site"]), &schema(), &config)
                .expect("resolve");
        assert_eq!(bindings.field_for(0), Some(1));
        assert_eq!(bindings.field_for(2), Some(2));
        assert_eq!(bindings.field_for(3), None);
    }

    #[test]
    fn unaligned_duplicates_bind_first_field() {
        let config = BindConfig::permissive().with_align_duplicate_headers(false);
        let bindings = ColumnBindings::resolve(&header(&["Site", "Site"]), &schema(), &config)
            .expect("resolve");
        assert_eq!(bindings.field_for(0), Some(1));
        assert_eq!(bindings.field_for(1), Some(1));
    }

    #[test]
    fn repeated_names_are_listed_once_each() {
        let config = BindConfig::strict().with_fail_if_unmatched_struct_tags(false);
        let err = ColumnBindings::resolve(
            &header(&["Site", "Name", "Site", "Name", "Site"]),
            &schema(),
            &config,
        )
        .unwrap_err();
        match err {
            BindError::DuplicateHeaders { names } => assert_eq!(names, vec!["Site", "Name"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unmatched_fields_list_all_their_keys() {
        let err = ColumnBindings::resolve(&header(&["Name"]), &schema(), &BindConfig::strict())
            .unwrap_err();
        match err {
            BindError::UnmatchedFields { keys } => {
                assert_eq!(keys, vec!["Site", "Site", "Score", "Points"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn positional_bindings_cover_every_field() {
        let bindings = ColumnBindings::positional(&schema());
        assert_eq!(bindings.width(), 4);
        assert_eq!(bindings.field_for(3), Some(3));
        assert!(bindings.ignored_columns().is_empty());
    }
}
