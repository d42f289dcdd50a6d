//! Catálogo de checks disponibles y features detectadas.
//!
//! El catálogo se puebla una vez al arrancar (`register_*`) y después sólo se
//! presta de forma inmutable a los constructores de escenarios, por lo que no
//! puede cambiar durante una corrida.

use std::collections::HashMap;
use std::sync::Arc;

use crate::step::{StepDefinition, StepKind};

/// Feature del host a la que un step puede estar ligado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub label: String,
    pub description: String,
}

impl Feature {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self { label: label.into(),
               description: description.into() }
    }
}

/// Selección de steps: por label exacto o por conjunto de tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFilter {
    Label(String),
    Tags(Vec<String>),
}

impl StepFilter {
    pub fn label(label: impl Into<String>) -> Self {
        Self::Label(label.into())
    }

    pub fn tags<I, T>(tags: I) -> Self
        where I: IntoIterator<Item = T>,
              T: Into<String>
    {
        Self::Tags(tags.into_iter().map(Into::into).collect())
    }
}

pub trait Catalog {
    /// Tipos de step que cumplen `filter`, en orden de registro.
    fn find_steps(&self, filter: &StepFilter) -> Vec<Arc<dyn StepDefinition>>;
    fn find_feature(&self, name: &str) -> Option<Feature>;
}

fn normalize(label: &str) -> String {
    label.replace('-', "_")
}

/// Catálogo en memoria.
#[derive(Debug, Default)]
pub struct StepRegistry {
    steps: Vec<Arc<dyn StepDefinition>>,
    features: HashMap<String, Feature>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_step<D: StepDefinition + 'static>(&mut self, definition: D) -> &mut Self {
        self.steps.push(Arc::new(definition));
        self
    }

    pub fn register_feature(&mut self, feature: Feature) -> &mut Self {
        self.features.insert(normalize(&feature.label), feature);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn available(&self, definition: &dyn StepDefinition) -> bool {
        let metadata = definition.metadata();
        metadata.kind == StepKind::Check
        && metadata.for_feature
                   .as_deref()
                   .map_or(true, |f| self.features.contains_key(&normalize(f)))
    }
}

impl Catalog for StepRegistry {
    fn find_steps(&self, filter: &StepFilter) -> Vec<Arc<dyn StepDefinition>> {
        self.steps
            .iter()
            .filter(|d| self.available(d.as_ref()))
            .filter(|d| {
                let metadata = d.metadata();
                match filter {
                    StepFilter::Label(label) => normalize(&metadata.label) == normalize(label),
                    StepFilter::Tags(tags) => tags.iter().all(|t| metadata.tags.contains(t)),
                }
            })
            .cloned()
            .collect()
    }

    fn find_feature(&self, name: &str) -> Option<Feature> {
        self.features.get(&normalize(name)).cloned()
    }
}
