use crate::core::types::{CategoryCode, CogId};

use super::store::{CogCatalog, CogRecord};

/// Which part of a COG definition a search matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SearchField {
    /// COG name, gene symbol and pathway
    #[default]
    Description,
    /// Functional category codes and names
    Category,
    /// COG identifier
    CogId,
}

/// Free-text lookups over the COG definitions of a catalog
pub struct CogSearch<'a> {
    catalog: &'a CogCatalog,
}

impl<'a> CogSearch<'a> {
    pub fn new(catalog: &'a CogCatalog) -> Self {
        Self { catalog }
    }

    /// Case-insensitive substring search. Results are sorted by COG id.
    #[must_use]
    pub fn search(&self, text: &str, field: SearchField) -> Vec<&'a CogRecord> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<&CogRecord> = self
            .catalog
            .cogs()
            .filter(|record| self.matches(record, &needle, field))
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    /// All COGs listing the given category code, sorted by COG id
    #[must_use]
    pub fn in_category(&self, code: CategoryCode) -> Vec<&'a CogRecord> {
        let mut matches: Vec<&CogRecord> = self
            .catalog
            .cogs()
            .filter(|record| record.categories.contains(&code))
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    /// Exact lookup that also accepts lowercase ids such as `cog0001`
    #[must_use]
    pub fn find_id(&self, text: &str) -> Option<&'a CogRecord> {
        let trimmed = text.trim();
        self.catalog
            .get(&CogId::new(trimmed))
            .or_else(|| self.catalog.get(&CogId::new(trimmed.to_uppercase())))
    }

    fn matches(&self, record: &CogRecord, needle: &str, field: SearchField) -> bool {
        match field {
            SearchField::Description => {
                record.name.to_lowercase().contains(needle)
                    || record
                        .gene
                        .as_deref()
                        .is_some_and(|g| g.to_lowercase().contains(needle))
                    || record
                        .pathway
                        .as_deref()
                        .is_some_and(|p| p.to_lowercase().contains(needle))
            }
            SearchField::Category => {
                // A single letter is a code; anything longer matches names
                if needle.len() == 1 {
                    record
                        .categories
                        .iter()
                        .any(|c| c.as_char().to_ascii_lowercase().to_string() == needle)
                } else {
                    self.catalog
                        .category_names(record)
                        .iter()
                        .any(|name| name.to_lowercase().contains(needle))
                }
            }
            SearchField::CogId => record.id.as_str().to_lowercase().contains(needle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builder::CatalogBuilder;
    use crate::parsing::cog::{CogAssignment, CogDefinition};

    fn catalog() -> CogCatalog {
        let def = |id: &str, codes: &str, name: &str, gene: Option<&str>| CogDefinition {
            id: CogId::new(id),
            categories: CategoryCode::parse_run(codes).unwrap(),
            name: name.to_string(),
            gene: gene.map(str::to_string),
            pathway: None,
            line: 1,
        };
        CatalogBuilder::new()
            .with_definitions(vec![
                def("COG0745", "TK", "DNA-binding response regulator, OmpR family", Some("OmpR")),
                def("COG0001", "H", "Glutamate-1-semialdehyde aminotransferase", Some("HemL")),
                def("COG0583", "K", "DNA-binding transcriptional regulator, LysR family", None),
            ])
            .with_assignments(vec![CogAssignment {
                accession: "WP_1".to_string(),
                cog_id: CogId::new("COG0001"),
                line: 1,
            }])
            .build()
            .unwrap()
    }

    fn ids(records: &[&CogRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_search_description_sorted_by_id() {
        let catalog = catalog();
        let search = CogSearch::new(&catalog);
        let found = search.search("dna-binding", SearchField::Description);
        assert_eq!(ids(&found), vec!["COG0583", "COG0745"]);

        let found = search.search("heml", SearchField::Description);
        assert_eq!(ids(&found), vec!["COG0001"]);
    }

    #[test]
    fn test_search_category_by_code_and_name() {
        let catalog = catalog();
        let search = CogSearch::new(&catalog);
        assert_eq!(
            ids(&search.search("k", SearchField::Category)),
            vec!["COG0583", "COG0745"]
        );
        assert_eq!(
            ids(&search.search("signal transduction", SearchField::Category)),
            vec!["COG0745"]
        );
    }

    #[test]
    fn test_search_cog_id_and_empty_query() {
        let catalog = catalog();
        let search = CogSearch::new(&catalog);
        assert_eq!(ids(&search.search("0745", SearchField::CogId)), vec!["COG0745"]);
        assert!(search.search("   ", SearchField::Description).is_empty());
    }

    #[test]
    fn test_find_id_and_in_category() {
        let catalog = catalog();
        let search = CogSearch::new(&catalog);
        assert!(search.find_id("cog0001").is_some());
        assert!(search.find_id("COG9999").is_none());
        assert_eq!(
            ids(&search.in_category(CategoryCode::new('T').unwrap())),
            vec!["COG0745"]
        );
    }
}
