use std::{collections::HashMap, fs::File, io::Read, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::{Anime, CatalogRow},
};

/// Ordered, read-only collection of catalog entries
///
/// Row positions are stable for the catalog's lifetime; the vector model's
/// matrix rows are aligned to them, so a catalog is never reordered after
/// a model has been fitted on it.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<Anime>,
    /// First-wins on duplicate names
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog from entries in their final order
    pub fn new(entries: Vec<Anime>) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            by_name.entry(entry.name.clone()).or_insert(index);
        }
        Self { entries, by_name }
    }

    /// Parses a cleaned catalog CSV
    pub fn from_reader<R: Read>(reader: R) -> AppResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let entries = csv_reader
            .deserialize::<CatalogRow>()
            .map(|row| row.map(Anime::from))
            .collect::<Result<Vec<_>, _>>()?;

        let catalog = Self::new(entries);
        if catalog.by_name.len() < catalog.len() {
            tracing::warn!(
                entries = catalog.len(),
                unique_names = catalog.by_name.len(),
                "Catalog contains duplicate names; first occurrence wins"
            );
        }
        Ok(catalog)
    }

    /// Loads a cleaned catalog CSV from disk
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AppError::InvalidInput(format!(
                "Cannot open catalog {}: {}",
                path.display(),
                e
            ))
        })?;
        let catalog = Self::from_reader(file)?;

        tracing::info!(
            path = %path.display(),
            entries = catalog.len(),
            "Catalog loaded"
        );

        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Anime> {
        self.entries.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Anime> {
        self.index_of(name).and_then(|i| self.get(i))
    }

    pub fn entries(&self) -> &[Anime] {
        &self.entries
    }

    /// Resolves names to row indices, silently dropping unknown names
    ///
    /// Indices come back ascending and de-duplicated.
    pub fn resolve(&self, names: &[String]) -> Vec<usize> {
        let mut indices: Vec<usize> = names.iter().filter_map(|n| self.index_of(n)).collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Fusion text of every entry, in row order
    pub fn fusion_texts(&self) -> Vec<String> {
        self.entries.iter().map(Anime::fusion_text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
MAL_ID,Name,Score,Genres,sypnopsis,Episodes
4224,Toradora!,8.24,\"Comedy, Romance, School\",Ryuuji is a delinquent-looking boy,25
2167,Clannad,8.3,\"Comedy, Drama, Romance\",Tomoya is a delinquent,23
99,Kimi ni Todoke,Unknown,\"Romance, Shoujo\",Sawako is misunderstood,25
";

    fn anime(id: u64, name: &str) -> Anime {
        Anime {
            id,
            name: name.to_string(),
            genres: vec!["Romance".to_string()],
            synopsis: format!("synopsis of {}", name),
            score: None,
        }
    }

    #[test]
    fn test_from_reader_keeps_row_order() {
        let catalog = Catalog::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(0).unwrap().name, "Toradora!");
        assert_eq!(catalog.get(2).unwrap().score, None);
        assert_eq!(catalog.index_of("Clannad"), Some(1));
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let catalog = Catalog::new(vec![anime(1, "A"), anime(2, "B"), anime(3, "A")]);
        assert_eq!(catalog.index_of("A"), Some(0));
        assert_eq!(catalog.by_name("A").unwrap().id, 1);
    }

    #[test]
    fn test_resolve_drops_unknown_names() {
        let catalog = Catalog::new(vec![anime(1, "A"), anime(2, "B"), anime(3, "C")]);
        let names = vec![
            "C".to_string(),
            "missing".to_string(),
            "A".to_string(),
            "C".to_string(),
        ];
        assert_eq!(catalog.resolve(&names), vec![0, 2]);
        assert!(catalog.resolve(&["nope".to_string()]).is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load("/definitely/not/here.csv");
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, SAMPLE.as_bytes()).unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.fusion_texts().len(), 3);
    }
}
