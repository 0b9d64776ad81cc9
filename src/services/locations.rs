//! Wilaya / daira / commune directory.
//!
//! The source is a denormalized SQL export with one row per commune:
//!
//! ```sql
//! INSERT INTO `algeria_cities` (`id`, `commune_name_ascii`, `commune_name`,
//!     `daira_name_ascii`, `daira_name`, `wilaya_code`, `wilaya_name_ascii`, `wilaya_name`)
//! VALUES (1, 'Adrar', 'أدرار', 'Adrar', 'أدرار', '01', 'Adrar', 'أدرار'), ...;
//! ```
//!
//! Rows are folded into a wilaya -> daira -> commune tree. Repeated dairas and
//! communes collapse into one entry; wilayas come out ordered by code.

use regex::Regex;
use serde::Serialize;
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::{Arc, LazyLock, RwLock},
};
use thiserror::Error;

use crate::services::slug::slugify;

static INSERT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)INSERT\s+INTO\s+[`"\w.]+\s*(?:\(([^)]*)\))?\s*VALUES"#).unwrap()
});

/// Column order of the export when the INSERT carries no column list.
const DEFAULT_COLUMNS: &[&str] = &[
    "id",
    "commune_name_ascii",
    "commune_name",
    "daira_name_ascii",
    "daira_name",
    "wilaya_code",
    "wilaya_name_ascii",
    "wilaya_name",
];

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Failed to read location dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed location dataset at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("Location dataset is missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("No location dataset configured")]
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commune {
    pub name: String,
    pub name_ascii: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Daira {
    pub name: String,
    pub name_ascii: String,
    pub communes: Vec<Commune>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wilaya {
    pub code: String,
    pub name: String,
    pub name_ascii: String,
    pub dairas: Vec<Daira>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WilayaSummary {
    pub code: String,
    pub name: String,
    pub name_ascii: String,
    pub daira_count: usize,
    pub commune_count: usize,
}

impl From<&Wilaya> for WilayaSummary {
    fn from(wilaya: &Wilaya) -> Self {
        Self {
            code: wilaya.code.clone(),
            name: wilaya.name.clone(),
            name_ascii: wilaya.name_ascii.clone(),
            daira_count: wilaya.dairas.len(),
            commune_count: wilaya.dairas.iter().map(|d| d.communes.len()).sum(),
        }
    }
}

//============================================================================
// SQL tuple parsing
//============================================================================

struct ValuesParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> ValuesParser<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> LocationError {
        LocationError::Parse {
            offset: self.pos,
            message: message.into(),
        }
    }

    /// Parse `(…), (…), …` up to the terminating `;` (or end of input).
    fn rows(&mut self) -> Result<Vec<Vec<Option<String>>>, LocationError> {
        let mut rows = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(';') => {
                    self.bump();
                    break;
                }
                Some(',') => {
                    self.bump();
                }
                Some('(') => {
                    self.bump();
                    rows.push(self.tuple()?);
                }
                Some(other) => return Err(self.error(format!("unexpected '{other}'"))),
            }
        }
        Ok(rows)
    }

    fn tuple(&mut self) -> Result<Vec<Option<String>>, LocationError> {
        let mut fields = Vec::new();
        loop {
            self.skip_whitespace();
            fields.push(self.field()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(')') => return Ok(fields),
                Some(other) => return Err(self.error(format!("expected ',' or ')', got '{other}'"))),
                None => return Err(self.error("unterminated tuple")),
            }
        }
    }

    fn field(&mut self) -> Result<Option<String>, LocationError> {
        if self.peek() == Some('\'') {
            self.bump();
            return self.quoted().map(Some);
        }

        let start = self.pos;
        while self.peek().is_some_and(|c| c != ',' && c != ')') {
            self.bump();
        }
        let raw = self.src[start..self.pos].trim();
        if raw.eq_ignore_ascii_case("null") {
            Ok(None)
        } else {
            Ok(Some(raw.to_string()))
        }
    }

    fn quoted(&mut self) -> Result<String, LocationError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.bump();
                    out.push('\'');
                }
                Some('\'') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("dangling escape")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}

struct ColumnMap {
    commune_ascii: usize,
    commune: usize,
    daira_ascii: usize,
    daira: usize,
    wilaya_code: usize,
    wilaya_ascii: usize,
    wilaya: usize,
}

impl ColumnMap {
    fn from_names(names: &[String]) -> Result<Self, LocationError> {
        let position = |column: &'static str| {
            names
                .iter()
                .position(|name| name == column)
                .ok_or(LocationError::MissingColumn(column))
        };

        Ok(Self {
            commune_ascii: position("commune_name_ascii")?,
            commune: position("commune_name")?,
            daira_ascii: position("daira_name_ascii")?,
            daira: position("daira_name")?,
            wilaya_code: position("wilaya_code")?,
            wilaya_ascii: position("wilaya_name_ascii")?,
            wilaya: position("wilaya_name")?,
        })
    }
}

fn column_names(list: Option<&str>) -> Vec<String> {
    match list {
        Some(list) => list
            .split(',')
            .map(|name| name.trim().trim_matches(|c| c == '`' || c == '"').to_string())
            .collect(),
        None => DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
    }
}

/// Wilaya codes are two digits in the export ("01"…"58"); accept "1" too.
fn normalize_code(code: &str) -> String {
    let code = code.trim();
    match code.parse::<u32>() {
        Ok(n) => format!("{n:02}"),
        Err(_) => code.to_string(),
    }
}

//============================================================================
// Directory
//============================================================================

#[derive(Default)]
struct DairaBuilder {
    name: String,
    name_ascii: String,
    communes: Vec<Commune>,
}

#[derive(Default)]
struct WilayaBuilder {
    name: String,
    name_ascii: String,
    dairas: Vec<DairaBuilder>,
    daira_index: HashMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDirectory {
    wilayas: Vec<Wilaya>,
}

impl LocationDirectory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_sql(sql: &str) -> Result<Self, LocationError> {
        let mut wilayas: BTreeMap<String, WilayaBuilder> = BTreeMap::new();
        let mut search_from = 0;

        while let Some(header) = INSERT_HEADER.captures_at(sql, search_from) {
            let names = column_names(header.get(1).map(|m| m.as_str()));
            let columns = ColumnMap::from_names(&names)?;
            let values_end = header.get(0).map_or(sql.len(), |m| m.end());

            let mut parser = ValuesParser::new(sql, values_end);
            for row in parser.rows()? {
                Self::add_row(&mut wilayas, &columns, &row);
            }
            search_from = parser.pos;
        }

        let wilayas = wilayas
            .into_iter()
            .map(|(code, builder)| Wilaya {
                code,
                name: builder.name,
                name_ascii: builder.name_ascii,
                dairas: builder
                    .dairas
                    .into_iter()
                    .map(|d| Daira {
                        name: d.name,
                        name_ascii: d.name_ascii,
                        communes: d.communes,
                    })
                    .collect(),
            })
            .collect();

        Ok(Self { wilayas })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LocationError> {
        let path = path.as_ref();
        let sql = std::fs::read_to_string(path).map_err(|source| LocationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_sql(&sql)
    }

    fn add_row(
        wilayas: &mut BTreeMap<String, WilayaBuilder>,
        columns: &ColumnMap,
        row: &[Option<String>],
    ) {
        let cell = |index: usize| {
            row.get(index)
                .and_then(|value| value.as_deref())
                .map(str::trim)
                .unwrap_or_default()
        };

        let code = normalize_code(cell(columns.wilaya_code));
        if code.is_empty() {
            log::warn!("Skipping location row without a wilaya code: {:?}", row);
            return;
        }

        let wilaya = wilayas.entry(code).or_insert_with(|| WilayaBuilder {
            name: cell(columns.wilaya).to_string(),
            name_ascii: cell(columns.wilaya_ascii).to_string(),
            ..Default::default()
        });

        let daira_ascii = cell(columns.daira_ascii);
        let daira_key = slugify(daira_ascii);
        let index = match wilaya.daira_index.get(&daira_key) {
            Some(index) => *index,
            None => {
                wilaya.dairas.push(DairaBuilder {
                    name: cell(columns.daira).to_string(),
                    name_ascii: daira_ascii.to_string(),
                    communes: Vec::new(),
                });
                let index = wilaya.dairas.len() - 1;
                wilaya.daira_index.insert(daira_key, index);
                index
            }
        };

        let daira = &mut wilaya.dairas[index];
        let commune_ascii = cell(columns.commune_ascii);
        if commune_ascii.is_empty() {
            return;
        }
        let already_listed = daira
            .communes
            .iter()
            .any(|c| slugify(&c.name_ascii) == slugify(commune_ascii));
        if !already_listed {
            daira.communes.push(Commune {
                name: cell(columns.commune).to_string(),
                name_ascii: commune_ascii.to_string(),
            });
        }
    }

    pub fn wilayas(&self) -> &[Wilaya] {
        &self.wilayas
    }

    pub fn summaries(&self) -> Vec<WilayaSummary> {
        self.wilayas.iter().map(WilayaSummary::from).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.wilayas.is_empty()
    }

    /// Find a wilaya by code ("16", "9") or by name in any spelling ("Béjaïa", "bejaia").
    pub fn find_wilaya(&self, query: &str) -> Option<&Wilaya> {
        let query = query.trim();
        if query.chars().all(|c| c.is_ascii_digit()) && !query.is_empty() {
            let code = normalize_code(query);
            return self.wilayas.iter().find(|w| w.code == code);
        }

        let wanted = slugify(query);
        self.wilayas
            .iter()
            .find(|w| slugify(&w.name_ascii) == wanted || slugify(&w.name) == wanted)
    }

    pub fn dairas_of(&self, wilaya: &str) -> Option<&[Daira]> {
        self.find_wilaya(wilaya).map(|w| w.dairas.as_slice())
    }

    pub fn communes_of(&self, wilaya: &str, daira: &str) -> Option<&[Commune]> {
        let wanted = slugify(daira);
        self.dairas_of(wilaya)?
            .iter()
            .find(|d| slugify(&d.name_ascii) == wanted || slugify(&d.name) == wanted)
            .map(|d| d.communes.as_slice())
    }
}

//============================================================================
// Service
//============================================================================

/// Holds the loaded directory and swaps it on reload.
pub struct LocationService {
    source: Option<PathBuf>,
    directory: RwLock<Arc<LocationDirectory>>,
}

impl LocationService {
    pub fn new(directory: LocationDirectory, source: Option<PathBuf>) -> Self {
        Self {
            source,
            directory: RwLock::new(Arc::new(directory)),
        }
    }

    /// Load from `source` when given; a missing path yields an empty directory.
    pub fn from_source(source: Option<&str>) -> Result<Self, LocationError> {
        match source {
            Some(path) => {
                let directory = LocationDirectory::load(path)?;
                log::info!(
                    "Loaded {} wilayas from {}",
                    directory.wilayas().len(),
                    path
                );
                Ok(Self::new(directory, Some(PathBuf::from(path))))
            }
            None => {
                log::warn!("LOCATIONS_DATASET not set; location lookups will be empty");
                Ok(Self::new(LocationDirectory::empty(), None))
            }
        }
    }

    pub fn current(&self) -> Arc<LocationDirectory> {
        self.directory
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Re-read the dataset from its source. Returns the number of wilayas loaded.
    pub async fn reload(&self) -> Result<usize, LocationError> {
        let path = self.source.clone().ok_or(LocationError::NotConfigured)?;
        let sql = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LocationError::Io {
                path: path.clone(),
                source,
            })?;
        let directory = LocationDirectory::from_sql(&sql)?;
        let count = directory.wilayas().len();

        *self
            .directory
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(directory);

        Ok(count)
    }
}
