use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::CategoryCode;
use crate::parsing::cog::CategoryDefinition;

/// NCBI COG 2020 functional category names
const STANDARD_CATEGORIES: [(char, &str); 25] = [
    ('A', "RNA processing and modification"),
    ('B', "Chromatin structure and dynamics"),
    ('C', "Energy production and conversion"),
    ('D', "Cell cycle control, cell division, chromosome partitioning"),
    ('E', "Amino acid transport and metabolism"),
    ('F', "Nucleotide transport and metabolism"),
    ('G', "Carbohydrate transport and metabolism"),
    ('H', "Coenzyme transport and metabolism"),
    ('I', "Lipid transport and metabolism"),
    ('J', "Translation, ribosomal structure and biogenesis"),
    ('K', "Transcription"),
    ('L', "Replication, recombination and repair"),
    ('M', "Cell wall/membrane/envelope biogenesis"),
    ('N', "Cell motility"),
    ('O', "Posttranslational modification, protein turnover, chaperones"),
    ('P', "Inorganic ion transport and metabolism"),
    ('Q', "Secondary metabolites biosynthesis, transport and catabolism"),
    ('R', "General function prediction only"),
    ('S', "Function unknown"),
    ('T', "Signal transduction mechanisms"),
    ('U', "Intracellular trafficking, secretion, and vesicular transport"),
    ('V', "Defense mechanisms"),
    ('W', "Extracellular structures"),
    ('Y', "Nuclear structure"),
    ('Z', "Cytoskeleton"),
];

/// Mapping from category code to human-readable name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    names: BTreeMap<CategoryCode, String>,
}

impl CategoryTable {
    /// The built-in table covering all 25 codes
    #[must_use]
    pub fn standard() -> Self {
        let names = STANDARD_CATEGORIES
            .iter()
            .filter_map(|(c, name)| CategoryCode::new(*c).map(|code| (code, (*name).to_string())))
            .collect();
        Self { names }
    }

    /// A table holding exactly the given definitions; later rows win on repeats
    #[must_use]
    pub fn from_definitions(definitions: Vec<CategoryDefinition>) -> Self {
        let names = definitions
            .into_iter()
            .map(|def| (def.code, def.name))
            .collect();
        Self { names }
    }

    #[must_use]
    pub fn name(&self, code: CategoryCode) -> Option<&str> {
        self.names.get(&code).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, code: CategoryCode) -> bool {
        self.names.contains_key(&code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryCode, &str)> {
        self.names.iter().map(|(code, name)| (*code, name.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_complete() {
        let table = CategoryTable::standard();
        assert_eq!(table.len(), 25);
        for code in CategoryCode::all() {
            assert!(table.contains(code), "missing {code}");
        }
        assert_eq!(
            table.name(CategoryCode::new('S').unwrap()),
            Some("Function unknown")
        );
    }

    #[test]
    fn test_from_definitions_only_holds_given_codes() {
        let table = CategoryTable::from_definitions(vec![CategoryDefinition {
            code: CategoryCode::new('K').unwrap(),
            name: "Transcription".to_string(),
        }]);
        assert_eq!(table.len(), 1);
        assert!(!table.contains(CategoryCode::new('J').unwrap()));
    }
}
