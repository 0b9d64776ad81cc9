//! Icon lookup for the nearby-place badges on property pages.
//!
//! Labels come from agents typing free text ("Ecole primaire", "Hôpital",
//! "bus_stop.png"), so resolution runs from strict to loose: exact slug,
//! alias, containment of a known slug, then a small edit distance. Anything
//! left over gets [`DEFAULT_ICON`].

use serde::Serialize;
use std::collections::HashMap;

use crate::services::slug::slugify;

pub const DEFAULT_ICON: &str = "place.svg";

const ICON_EXTENSIONS: &[&str] = &["svg", "png", "webp", "jpg", "jpeg"];

const STANDARD_ICONS: &[&str] = &[
    "school.svg",
    "university.svg",
    "hospital.svg",
    "pharmacy.svg",
    "mosque.svg",
    "bus-stop.svg",
    "tram.svg",
    "metro.svg",
    "train-station.svg",
    "airport.svg",
    "market.svg",
    "shopping-mall.svg",
    "restaurant.svg",
    "cafe.svg",
    "bank.svg",
    "post-office.svg",
    "police.svg",
    "park.svg",
    "beach.svg",
    "stadium.svg",
    "gym.svg",
];

const STANDARD_ALIASES: &[(&str, &str)] = &[
    ("ecole", "school"),
    ("primaire", "school"),
    ("cem", "school"),
    ("lycee", "school"),
    ("college", "school"),
    ("universite", "university"),
    ("fac", "university"),
    ("faculte", "university"),
    ("hopital", "hospital"),
    ("chu", "hospital"),
    ("clinique", "hospital"),
    ("polyclinique", "hospital"),
    ("pharmacie", "pharmacy"),
    ("mosquee", "mosque"),
    ("masjid", "mosque"),
    ("bus", "bus-stop"),
    ("arret-de-bus", "bus-stop"),
    ("gare", "train-station"),
    ("gare-routiere", "bus-stop"),
    ("aeroport", "airport"),
    ("marche", "market"),
    ("souk", "market"),
    ("centre-commercial", "shopping-mall"),
    ("mall", "shopping-mall"),
    ("banque", "bank"),
    ("poste", "post-office"),
    ("commissariat", "police"),
    ("gendarmerie", "police"),
    ("jardin", "park"),
    ("parc", "park"),
    ("plage", "beach"),
    ("stade", "stadium"),
    ("salle-de-sport", "gym"),
];

/// A nearby place as rendered on a property page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NearbyPlace {
    pub name: String,
    pub icon: String,
}

/// Normalize a label or filename into the slug icons are matched on.
pub fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    let stem = match trimmed.rsplit_once('.') {
        Some((stem, ext)) if ICON_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => stem,
        _ => trimmed,
    };
    slugify(stem)
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn typo_budget(slug: &str) -> usize {
    match slug.len() {
        0..=3 => 0,
        4..=7 => 1,
        _ => 2,
    }
}

#[derive(Debug, Clone)]
pub struct IconCatalog {
    /// slug -> filename, e.g. "bus-stop" -> "bus-stop.svg"
    icons: HashMap<String, String>,
    /// alternate slug -> icon slug
    aliases: HashMap<String, String>,
}

impl Default for IconCatalog {
    fn default() -> Self {
        let mut catalog = Self::new(STANDARD_ICONS.iter().copied());
        for (alias, target) in STANDARD_ALIASES {
            catalog = catalog.with_alias(alias, target);
        }
        catalog
    }
}

impl IconCatalog {
    pub fn new<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let icons = filenames
            .into_iter()
            .map(Into::into)
            .map(|filename| (normalize_label(&filename), filename))
            .filter(|(slug, _)| !slug.is_empty())
            .collect();

        Self {
            icons,
            aliases: HashMap::new(),
        }
    }

    pub fn with_alias(mut self, alias: &str, icon_slug: &str) -> Self {
        self.aliases
            .insert(normalize_label(alias), normalize_label(icon_slug));
        self
    }

    fn icon(&self, slug: &str) -> Option<&str> {
        self.icons
            .get(slug)
            .or_else(|| self.aliases.get(slug).and_then(|target| self.icons.get(target)))
            .map(String::as_str)
    }

    /// Icon filename for a free-text label, [`DEFAULT_ICON`] when nothing fits.
    pub fn resolve(&self, label: &str) -> &str {
        let slug = normalize_label(label);
        if slug.is_empty() {
            return DEFAULT_ICON;
        }

        self.icon(&slug)
            .or_else(|| self.by_containment(&slug))
            .or_else(|| self.by_edit_distance(&slug))
            .unwrap_or(DEFAULT_ICON)
    }

    pub fn nearby_places(&self, labels: &[String]) -> Vec<NearbyPlace> {
        labels
            .iter()
            .filter(|label| !label.trim().is_empty())
            .map(|label| NearbyPlace {
                name: label.trim().to_string(),
                icon: self.resolve(label).to_string(),
            })
            .collect()
    }

    /// Longest known slug (icon or alias) appearing as whole tokens inside `slug`.
    fn by_containment(&self, slug: &str) -> Option<&str> {
        let padded = format!("-{slug}-");
        self.icons
            .keys()
            .chain(self.aliases.keys())
            .filter(|known| padded.contains(&format!("-{known}-")))
            .max_by_key(|known| known.len())
            .and_then(|known| self.icon(known))
    }

    fn by_edit_distance(&self, slug: &str) -> Option<&str> {
        let budget = typo_budget(slug);
        if budget == 0 {
            return None;
        }

        self.icons
            .keys()
            .chain(self.aliases.keys())
            .map(|known| (edit_distance(slug, known), known))
            .filter(|(distance, _)| *distance <= budget)
            .min_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.cmp(b)))
            .and_then(|(_, known)| self.icon(known))
    }
}
