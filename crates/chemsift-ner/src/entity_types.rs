//! Entity type classification and label parsing.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::NerError;

/// Normalized entity type for biomedical NER.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Gene,
    Protein,
    Disease,
    Chemical,
    Mutation,
    Species,
    CellLine,
    Pathway,
    Drug,
    Other,
}

impl EntityType {
    pub const ALL: [EntityType; 10] = [
        EntityType::Gene,
        EntityType::Protein,
        EntityType::Disease,
        EntityType::Chemical,
        EntityType::Mutation,
        EntityType::Species,
        EntityType::CellLine,
        EntityType::Pathway,
        EntityType::Drug,
        EntityType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Gene => "GENE",
            EntityType::Protein => "PROTEIN",
            EntityType::Disease => "DISEASE",
            EntityType::Chemical => "CHEMICAL",
            EntityType::Mutation => "MUTATION",
            EntityType::Species => "SPECIES",
            EntityType::CellLine => "CELL_LINE",
            EntityType::Pathway => "PATHWAY",
            EntityType::Drug => "DRUG",
            EntityType::Other => "OTHER",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = NerError;

    /// Strict parse: unknown labels are an error rather than `Other`.
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let clean = label.trim();
        lookup(clean)
            .or_else(|| lookup(&clean.to_ascii_uppercase()))
            .ok_or_else(|| NerError::InvalidInput(format!("unknown entity label '{label}'")))
    }
}

// Map model-specific labels to normalized types
fn get_label_map() -> &'static HashMap<String, EntityType> {
    use std::sync::OnceLock;
    static LABEL_MAP: OnceLock<HashMap<String, EntityType>> = OnceLock::new();
    LABEL_MAP.get_or_init(|| {
        let mut m = HashMap::new();

        for t in EntityType::ALL {
            m.insert(t.as_str().to_string(), t);
        }

        // BC5CDR labels
        m.insert("Chemical".to_string(), EntityType::Chemical);
        m.insert("Disease".to_string(), EntityType::Disease);

        // SciSpacy / CRAFT labels
        m.insert("GGP".to_string(), EntityType::Gene);
        m.insert("SO".to_string(), EntityType::Gene);
        m.insert("TAXON".to_string(), EntityType::Species);
        m.insert("CELL".to_string(), EntityType::CellLine);
        m.insert("CELL_TYPE".to_string(), EntityType::CellLine);
        m.insert("ORGANISM".to_string(), EntityType::Species);
        m.insert("CHEBI".to_string(), EntityType::Chemical);

        // NCBI Disease labels
        m.insert("SpecificDisease".to_string(), EntityType::Disease);
        m.insert("DiseaseClass".to_string(), EntityType::Disease);
        m.insert("CompositeMention".to_string(), EntityType::Disease);

        // BioNLP / BioCreative labels
        m.insert("Gene_or_gene_product".to_string(), EntityType::Gene);
        m.insert("Protein".to_string(), EntityType::Protein);
        m.insert("Simple_chemical".to_string(), EntityType::Chemical);
        m.insert("Amino_acid".to_string(), EntityType::Chemical);
        m.insert("Drug".to_string(), EntityType::Drug);
        m.insert("Cancer".to_string(), EntityType::Disease);

        m
    })
}

fn lookup(label: &str) -> Option<EntityType> {
    get_label_map().get(label).copied()
}

/// The entity categories that count towards document density.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet(BTreeSet<EntityType>);

impl CategorySet {
    pub fn from_types(types: impl IntoIterator<Item = EntityType>) -> Self {
        Self(types.into_iter().collect())
    }

    /// Parse a list of labels such as `["CHEMICAL", "DISEASE"]`.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> crate::Result<Self> {
        if labels.is_empty() {
            return Err(NerError::InvalidInput(
                "at least one entity category is required".to_string(),
            ));
        }
        labels
            .iter()
            .map(|l| l.as_ref().parse::<EntityType>())
            .collect::<crate::Result<BTreeSet<_>>>()
            .map(Self)
    }

    pub fn contains(&self, t: EntityType) -> bool {
        self.0.contains(&t)
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityType> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CategorySet {
    /// Chemicals and diseases, the BC5CDR label pair.
    fn default() -> Self {
        Self::from_types([EntityType::Chemical, EntityType::Disease])
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.0.iter().map(|t| t.as_str()).collect();
        f.write_str(&labels.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_label_aliases() {
        assert_eq!("GGP".parse::<EntityType>().unwrap(), EntityType::Gene);
        assert_eq!("Gene_or_gene_product".parse::<EntityType>().unwrap(), EntityType::Gene);
        assert_eq!("SpecificDisease".parse::<EntityType>().unwrap(), EntityType::Disease);
        assert_eq!("Simple_chemical".parse::<EntityType>().unwrap(), EntityType::Chemical);
        // BIO prefixes are tagger output, not lexicon labels
        assert!("B-GENE".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_strict_parse() {
        assert_eq!("CHEMICAL".parse::<EntityType>().unwrap(), EntityType::Chemical);
        assert_eq!("chemical".parse::<EntityType>().unwrap(), EntityType::Chemical);
        assert_eq!("cell_line".parse::<EntityType>().unwrap(), EntityType::CellLine);
        assert!("widget".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_category_set_from_labels() {
        let set = CategorySet::from_labels(&["CHEMICAL", "Disease"]).unwrap();
        assert_eq!(set, CategorySet::default());
        assert_eq!(set.to_string(), "DISEASE,CHEMICAL");

        assert!(CategorySet::from_labels::<&str>(&[]).is_err());
        assert!(CategorySet::from_labels(&["CHEMICAL", "bogus"]).is_err());
    }
}
