//! Dataset representation: attributes, class labels, and the numeric
//! instance matrix the correlation engine works on.

pub mod correlation;
pub mod csv;

pub use correlation::{AttributePair, CorrelationEngine, CorrelationReport};

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use log;
use ndarray::{Array2, ArrayView1};

use crate::error::{FcnError, Result};

/// One attribute (feature column) of a dataset.
///
/// Identity and equality follow the attribute name; the id is the stable
/// 0-based position of the attribute in the original column order. The
/// class-relevance score is written exactly once, by the correlation
/// engine, before any network is built.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub id: u32,
    pub name: String,
    pub class_relevance: f64,
}

impl Attribute {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            class_relevance: 0.0,
        }
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// All attributes of a dataset, in original column order (index == id).
#[derive(Debug, Clone)]
pub struct AttributeCatalog {
    attributes: Vec<Attribute>,
}

impl AttributeCatalog {
    /// Build a catalog from column names. Names must be unique.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut seen = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            if let Some(prev) = seen.insert(name.as_ref().to_string(), i) {
                return Err(FcnError::DataIntegrity(format!(
                    "duplicate attribute name '{}' (columns {} and {})",
                    name.as_ref(),
                    prev,
                    i
                )));
            }
        }

        let attributes = names
            .iter()
            .enumerate()
            .map(|(i, name)| Attribute::new(i as u32, name.as_ref()))
            .collect();
        Ok(Self { attributes })
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Attribute> {
        self.attributes.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.attributes.iter().find(|a| a.name == name).map(|a| a.id)
    }

    /// Write the class-relevance score of one attribute. Called once per
    /// attribute by the correlation engine before any network is built.
    pub fn set_relevance(&mut self, id: u32, score: f64) {
        self.attributes[id as usize].class_relevance = score;
    }

    /// Attributes ranked by descending `|class_relevance|`.
    ///
    /// This is the catalog-level display ranking. The greedy selector
    /// deliberately uses a different criterion (signed relevance,
    /// descending); the two must not be unified.
    pub fn ranked(&self) -> Vec<&Attribute> {
        let mut ranked: Vec<&Attribute> = self.attributes.iter().collect();
        ranked.sort_by(|a, b| {
            b.class_relevance
                .abs()
                .partial_cmp(&a.class_relevance.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }
}

/// Explicit `label -> {0, 1}` mapping used to binarize the class column
/// before computing relevance scores. Labels outside the mapping fail
/// closed with a configuration error.
#[derive(Debug, Clone, Default)]
pub struct LabelBinarizer {
    mapping: HashMap<String, u8>,
}

impl LabelBinarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map one label value to 0 and another to 1.
    pub fn two_class(zero: &str, one: &str) -> Self {
        let mut b = Self::new();
        b.mapping.insert(zero.to_string(), 0);
        b.mapping.insert(one.to_string(), 1);
        b
    }

    /// Add or replace a single label mapping.
    pub fn with_label(mut self, label: &str, bit: u8) -> Self {
        self.mapping.insert(label.to_string(), bit.min(1));
        self
    }

    /// Infer a mapping from the labels themselves: exactly two distinct
    /// values are required, assigned 0/1 in lexicographic order. Datasets
    /// with more classes must be pre-binarized by the caller.
    pub fn infer(labels: &[String]) -> Result<Self> {
        let mut distinct: Vec<&String> = Vec::new();
        for label in labels {
            if !distinct.contains(&label) {
                distinct.push(label);
            }
        }
        distinct.sort();

        if distinct.len() != 2 {
            return Err(FcnError::Configuration(format!(
                "label binarization requires exactly 2 distinct class labels, found {}: {:?}",
                distinct.len(),
                distinct
            )));
        }

        Ok(Self::two_class(distinct[0], distinct[1]))
    }

    pub fn binarize(&self, label: &str) -> Result<u8> {
        self.mapping.get(label).copied().ok_or_else(|| {
            FcnError::Configuration(format!("no binarization defined for class label '{label}'"))
        })
    }

    /// Binarize every label, failing on the first unmapped value.
    pub fn encode_all(&self, labels: &[String]) -> Result<Vec<f64>> {
        labels
            .iter()
            .map(|l| self.binarize(l).map(f64::from))
            .collect()
    }
}

/// A labeled tabular dataset: an `instances x attributes` numeric matrix
/// plus one class label per instance. Dimensions are fixed at construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    catalog: AttributeCatalog,
    data: Array2<f64>,
    labels: Vec<String>,
    source: String,
}

impl Dataset {
    pub fn new(
        catalog: AttributeCatalog,
        data: Array2<f64>,
        labels: Vec<String>,
        source: &str,
    ) -> Result<Self> {
        if data.nrows() != labels.len() {
            return Err(FcnError::DataIntegrity(format!(
                "{} instances but {} class labels",
                data.nrows(),
                labels.len()
            )));
        }
        if data.ncols() != catalog.len() {
            return Err(FcnError::DataIntegrity(format!(
                "{} data columns but {} attributes in the catalog",
                data.ncols(),
                catalog.len()
            )));
        }

        Ok(Self {
            catalog,
            data,
            labels,
            source: source.to_string(),
        })
    }

    pub fn num_instances(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_attributes(&self) -> usize {
        self.data.ncols()
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    pub(crate) fn catalog_mut(&mut self) -> &mut AttributeCatalog {
        &mut self.catalog
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Values of one attribute across all instances.
    pub fn column(&self, id: u32) -> ArrayView1<'_, f64> {
        self.data.column(id as usize)
    }

    /// Log the dataset shape and per-class instance counts.
    pub fn describe(&self) {
        log::info!(
            "Dataset {}: {} attributes, {} instances",
            self.source,
            self.num_attributes(),
            self.num_instances()
        );

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in &self.labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        let mut counts: Vec<(&str, usize)> = counts.into_iter().collect();
        counts.sort();
        for (label, count) in counts {
            log::info!("Class {label}: {count} instances");
        }
    }
}
