use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read {0}: {1}")]
    Io(String, std::io::Error),
    #[error("Invalid class index JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid species info YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Class index {0} is assigned to both {1} and {2}")]
    DuplicateIndex(usize, String, String),
    #[error("Class index {index} for {label} is outside 0..{count}")]
    IndexOutOfRange {
        label: String,
        index: usize,
        count: usize,
    },
}

/// Maps model output positions to species labels.
#[derive(Debug, Clone)]
pub struct ClassIndex {
    labels: Vec<Option<String>>,
}

impl ClassIndex {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(path.display().to_string(), e))?;
        let mapping: HashMap<String, usize> = serde_json::from_str(&raw)?;
        Self::from_mapping(mapping)
    }

    /// Builds the index from a `{label: index}` mapping. Indices must be dense,
    /// i.e. every index lies in `0..mapping.len()`.
    pub fn from_mapping(mapping: HashMap<String, usize>) -> Result<Self, CatalogError> {
        let count = mapping.len();
        let mut labels: Vec<Option<String>> = vec![None; count];
        for (label, idx) in mapping {
            if idx >= count {
                return Err(CatalogError::IndexOutOfRange {
                    label,
                    index: idx,
                    count,
                });
            }
            if let Some(existing) = &labels[idx] {
                return Err(CatalogError::DuplicateIndex(idx, existing.clone(), label));
            }
            labels[idx] = Some(label);
        }
        Ok(Self { labels })
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).and_then(|l| l.as_deref())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SpeciesInfo {
    pub species_name: String,
    pub scientific_name: String,
    pub taxonomy: String,
    pub status: String,
}

impl SpeciesInfo {
    pub fn unknown(species_name: &str) -> Self {
        Self {
            species_name: species_name.to_string(),
            scientific_name: "N/A".to_string(),
            taxonomy: "N/A".to_string(),
            status: "N/A".to_string(),
        }
    }
}

/// Taxonomy and conservation metadata keyed by the label the model emits.
#[derive(Debug, Clone, Default)]
pub struct SpeciesCatalog {
    species: HashMap<String, SpeciesInfo>,
}

impl SpeciesCatalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(path.display().to_string(), e))?;
        let entries: Vec<SpeciesInfo> = serde_yaml::from_str(&raw)?;
        log::info!("Loaded {} species from {}", entries.len(), path.display());
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<SpeciesInfo>) -> Self {
        let species = entries
            .into_iter()
            .map(|info| (info.species_name.clone(), info))
            .collect();
        Self { species }
    }

    /// Metadata for a label, or an "N/A" record carrying the label itself.
    pub fn lookup(&self, label: &str) -> SpeciesInfo {
        self.species
            .get(label)
            .cloned()
            .unwrap_or_else(|| SpeciesInfo::unknown(label))
    }
}
