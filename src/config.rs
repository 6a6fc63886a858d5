//! Binding configuration.
//!
//! [`BindConfig`] gathers the validation toggles a decode call honours and the
//! cell separator used by the delimited-text adapter. There is no implicit
//! default: callers start from [`BindConfig::strict`] or
//! [`BindConfig::permissive`], or load a YAML document in which every key is
//! required.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TAG_SEPARATOR: char = ',';

/// How an empty cell bound to a non-string field is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCellPolicy {
    /// Only fields tagged `omitempty` keep their zero value; other fields
    /// coerce the empty text (and numeric fields fail).
    OmitEmptyOnly,
    /// Empty cells never reach numeric fields, whatever their tag.
    SkipEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindConfig {
    /// Every field must find one of its keys in the header.
    pub fail_if_unmatched_struct_tags: bool,
    /// The header must not repeat a column name.
    pub fail_if_double_header_names: bool,
    /// The Nth occurrence of a repeated header binds to the Nth field
    /// declaring that key instead of always the first.
    pub align_duplicate_headers_with_field_order: bool,
    pub empty_cells: EmptyCellPolicy,
    /// Cell separator for the delimited-text adapter.
    pub tag_separator: char,
}

impl BindConfig {
    pub fn strict() -> Self {
        Self {
            fail_if_unmatched_struct_tags: true,
            fail_if_double_header_names: true,
            align_duplicate_headers_with_field_order: false,
            empty_cells: EmptyCellPolicy::OmitEmptyOnly,
            tag_separator: DEFAULT_TAG_SEPARATOR,
        }
    }

    pub fn permissive() -> Self {
        Self {
            fail_if_unmatched_struct_tags: false,
            fail_if_double_header_names: false,
            align_duplicate_headers_with_field_order: true,
            empty_cells: EmptyCellPolicy::SkipEmpty,
            tag_separator: DEFAULT_TAG_SEPARATOR,
        }
    }

    pub fn with_fail_if_unmatched_struct_tags(mut self, enabled: bool) -> Self {
        self.fail_if_unmatched_struct_tags = enabled;
        self
    }

    pub fn with_fail_if_double_header_names(mut self, enabled: bool) -> Self {
        self.fail_if_double_header_names = enabled;
        self
    }

    pub fn with_align_duplicate_headers(mut self, enabled: bool) -> Self {
        self.align_duplicate_headers_with_field_order = enabled;
        self
    }

    pub fn with_empty_cells(mut self, policy: EmptyCellPolicy) -> Self {
        self.empty_cells = policy;
        self
    }

    pub fn with_tag_separator(mut self, separator: char) -> Self {
        self.tag_separator = separator;
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: BindConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))?;
        config
            .validate()
            .with_context(|| format!("Validating config file {path:?}"))?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: BindConfig = serde_yaml::from_str(text).context("Parsing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let file = File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        serde_yaml::to_writer(file, self).with_context(|| format!("Writing config file {path:?}"))
    }

    pub fn validate(&self) -> Result<()> {
        let separator = self.tag_separator;
        ensure!(
            separator.is_ascii(),
            "Tag separator '{separator}' must be a single ASCII character"
        );
        ensure!(
            !matches!(separator, '"' | '\n' | '\r'),
            "Tag separator cannot be a quote or line break"
        );
        Ok(())
    }

    /// The tag separator as a delimiter byte.
    pub fn delimiter(&self) -> Result<u8> {
        self.validate()?;
        Ok(self.tag_separator as u8)
    }
}
