use std::{
    collections::HashSet,
    io::{Read, Write},
};

use serde::Serialize;

use crate::error::{AppError, AppResult};

const NAME_COLUMN: &str = "Name";
const GENRES_COLUMN: &str = "Genres";
const SYNOPSIS_COLUMN: &str = "sypnopsis";

/// Filters applied to the raw dataset before it becomes a catalog
#[derive(Debug, Clone)]
pub struct CleaningRules {
    /// Synopsis text the dataset uses when it has none
    pub placeholder_synopsis: String,
    /// Every kept row must carry this genre, when set
    pub required_genre: Option<String>,
    pub denied_genres: Vec<String>,
    /// Sequel and special-edition markers rejected in names
    pub denied_title_markers: Vec<String>,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            placeholder_synopsis: "No synopsis information".to_string(),
            required_genre: Some("Romance".to_string()),
            denied_genres: to_strings(&["Horror", "Demons", "Hentai", "Gore", "Ecchi", "Military"]),
            denied_title_markers: to_strings(&[
                "1st Season",
                "Season 2",
                "Season 3",
                "Season 4",
                "2nd Season",
                "3rd Season",
                "Part 2",
                "Part II",
                "Second Season",
                "Third Season",
                "OVA",
                "Ova",
                "Special",
                "Specials",
                "Movie",
                "Music",
                "Live",
                "(TV)",
            ]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Counts per cleaning step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub missing_fields: usize,
    pub placeholder_synopsis: usize,
    pub missing_required_genre: usize,
    pub denied_genre: usize,
    pub denied_title: usize,
    pub duplicate_synopsis: usize,
    pub duplicate_base_title: usize,
}

/// Why a row was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    MissingFields,
    PlaceholderSynopsis,
    MissingRequiredGenre,
    DeniedGenre,
    DeniedTitle,
    DuplicateSynopsis,
    DuplicateBaseTitle,
}

impl CleaningReport {
    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::MissingFields => self.missing_fields += 1,
            Rejection::PlaceholderSynopsis => self.placeholder_synopsis += 1,
            Rejection::MissingRequiredGenre => self.missing_required_genre += 1,
            Rejection::DeniedGenre => self.denied_genre += 1,
            Rejection::DeniedTitle => self.denied_title += 1,
            Rejection::DuplicateSynopsis => self.duplicate_synopsis += 1,
            Rejection::DuplicateBaseTitle => self.duplicate_base_title += 1,
        }
    }
}

/// Name with any subtitle or parenthesised suffix removed
///
/// `"Clannad: After Story"` and `"Fullmetal Alchemist (2009)"` reduce to
/// `"Clannad"` and `"Fullmetal Alchemist"`.
pub fn base_title(name: &str) -> &str {
    let before_colon = name.split(':').next().unwrap_or(name);
    before_colon.split(" (").next().unwrap_or(before_colon)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

struct Columns {
    name: usize,
    genres: usize,
    synopsis: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> AppResult<Self> {
        let find = |column: &str| {
            headers.iter().position(|h| h == column).ok_or_else(|| {
                AppError::InvalidInput(format!("Dataset is missing the '{}' column", column))
            })
        };
        Ok(Self {
            name: find(NAME_COLUMN)?,
            genres: find(GENRES_COLUMN)?,
            synopsis: find(SYNOPSIS_COLUMN)?,
        })
    }
}

/// Per-row rules; de-duplication runs afterwards over the survivors
struct Cleaner<'a> {
    rules: &'a CleaningRules,
    columns: Columns,
}

impl Cleaner<'_> {
    fn field<'r>(&self, record: &'r csv::StringRecord, column: usize) -> &'r str {
        record.get(column).unwrap_or("").trim()
    }

    fn check(&self, record: &csv::StringRecord) -> Result<(), Rejection> {
        let name = self.field(record, self.columns.name);
        let genres = self.field(record, self.columns.genres);
        let synopsis = self.field(record, self.columns.synopsis);

        if genres.is_empty() || synopsis.is_empty() {
            return Err(Rejection::MissingFields);
        }
        if synopsis.contains(&self.rules.placeholder_synopsis) {
            return Err(Rejection::PlaceholderSynopsis);
        }
        if let Some(required) = &self.rules.required_genre {
            if !contains_ignore_case(genres, required) {
                return Err(Rejection::MissingRequiredGenre);
            }
        }
        if self
            .rules
            .denied_genres
            .iter()
            .any(|g| contains_ignore_case(genres, g))
        {
            return Err(Rejection::DeniedGenre);
        }
        if self
            .rules
            .denied_title_markers
            .iter()
            .any(|m| contains_ignore_case(name, m))
        {
            return Err(Rejection::DeniedTitle);
        }
        Ok(())
    }

    /// Keeps the first record per key; later ones are counted as `rejection`
    fn dedup_by<F>(
        &self,
        records: Vec<csv::StringRecord>,
        report: &mut CleaningReport,
        rejection: Rejection,
        key: F,
    ) -> Vec<csv::StringRecord>
    where
        F: Fn(&csv::StringRecord) -> String,
    {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|record| {
                let fresh = seen.insert(key(record));
                if !fresh {
                    report.record(rejection);
                }
                fresh
            })
            .collect()
    }
}

/// Filters a raw dataset into a cleaned catalog
///
/// All input columns are written back out, in their original order. Rules
/// are applied in a fixed order and the first failing rule is the one
/// counted in the report. Both de-duplication passes keep the first row.
pub fn clean_catalog<R: Read, W: Write>(
    input: R,
    output: W,
    rules: &CleaningRules,
) -> AppResult<CleaningReport> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();
    let columns = Columns::locate(&headers)?;

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&headers)?;

    let cleaner = Cleaner { rules, columns };
    let mut report = CleaningReport::default();

    let mut filtered = Vec::new();
    for record in reader.records() {
        let record = record?;
        report.rows_read += 1;

        match cleaner.check(&record) {
            Ok(()) => filtered.push(record),
            Err(rejection) => report.record(rejection),
        }
    }

    // Two passes: a row dropped by title still claims its synopsis
    let synopsis = cleaner.columns.synopsis;
    let unique_plots = cleaner.dedup_by(filtered, &mut report, Rejection::DuplicateSynopsis, |r| {
        cleaner.field(r, synopsis).to_string()
    });
    let name = cleaner.columns.name;
    let kept = cleaner.dedup_by(unique_plots, &mut report, Rejection::DuplicateBaseTitle, |r| {
        base_title(cleaner.field(r, name)).to_string()
    });

    for record in &kept {
        writer.write_record(record)?;
    }
    report.rows_kept = kept.len();

    writer.flush()?;

    tracing::info!(
        rows_read = report.rows_read,
        rows_kept = report.rows_kept,
        denied_title = report.denied_title,
        duplicate_synopsis = report.duplicate_synopsis,
        duplicate_base_title = report.duplicate_base_title,
        "Catalog cleaned"
    );

    Ok(report)
}
