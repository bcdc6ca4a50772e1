//! Candidate lists and the corpus entity index.
//!
//! Candidate lists are named, read-only pools of strings loaded from
//! curated files (one entry per line, or a JSON array). Scraped sources
//! pass through a plausibility filter first: length 3..=60, no leading
//! digits, no URLs or phone-number punctuation, at least two words; joint
//! entries like "Nick & Sarah Allan" split into one entry per person.
//!
//! The entity index is built from extracted page text with a heuristic
//! tagger over capitalised token runs. It answers the scorer's three
//! questions: how often a string occurs across the corpus, whether it is
//! known to occur as a given entity type, and whether it occurs in a
//! specific document.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BlackbarError, Result};
use crate::types::CandidateList;

/// Entity types the tagger and the gap predictor agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Person,
    Org,
    Gpe,
    Loc,
    Date,
    Money,
    Law,
    Event,
}

/// Words that disqualify a scraped entry from being a person name.
const NON_NAME_WORDS: &[&str] = &[
    "castle", "college", "hotel", "club", "office", "airport", "airline", "leasing", "transfer",
    "service", "hotline", "aero", "air ", "fax", "tel ",
];

static JOINT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\s*&\s*(\w+)\s+(.+)$").expect("joint name pattern"));

/// Split "Nick & Sarah Allan" into ["Nick Allan", "Sarah Allan"].
///
/// Entries containing institution words are dropped entirely: "Foo & Bar
/// Hotel" is not two people.
pub fn split_joint_name(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    if NON_NAME_WORDS.iter().any(|w| lower.contains(w)) {
        return Vec::new();
    }
    if let Some(caps) = JOINT_NAME.captures(name) {
        return vec![
            format!("{} {}", &caps[1], &caps[3]),
            format!("{} {}", &caps[2], &caps[3]),
        ];
    }
    vec![name.to_string()]
}

/// Filter for entries arriving from scraped sources.
pub fn is_plausible_name(s: &str) -> bool {
    let s = s.trim();
    let len = s.chars().count();
    if !(3..=60).contains(&len) {
        return false;
    }
    if s.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    if ["@", "#", "http", "www.", "(", ")"].iter().any(|p| s.contains(p)) {
        return false;
    }
    s.split_whitespace().count() >= 2
}

/// Load a candidate list from a file.
///
/// `.json` files must hold an array of strings; anything else is read as
/// one entry per line. `scraped` routes entries through the plausibility
/// filter and joint-name splitting.
pub fn load_candidate_list(path: &Path, scraped: bool) -> Result<CandidateList> {
    let raw = std::fs::read_to_string(path).map_err(|e| BlackbarError::io(path, e))?;

    let entries: Vec<String> = if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str::<Vec<String>>(&raw)?
    } else {
        raw.lines().map(str::to_string).collect()
    };

    let mut cleaned: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for entry in entries {
        let entry = entry.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        let expanded = if scraped {
            split_joint_name(entry)
                .into_iter()
                .filter(|e| is_plausible_name(e))
                .collect()
        } else {
            vec![entry.to_string()]
        };
        for e in expanded {
            if seen.insert(e.clone()) {
                cleaned.push(e);
            }
        }
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "candidates".to_string());

    Ok(CandidateList {
        name,
        entries: cleaned,
    })
}

const ORG_SUFFIXES: &[&str] = &[
    "Inc", "LLC", "Ltd", "Corp", "Company", "Foundation", "University", "Bank", "Trust",
    "Institute", "Department", "Agency", "Committee", "Association", "Group",
];

const PERSON_TITLES: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "Prof", "Judge", "Senator", "President", "Attorney", "Detective",
    "Officer", "Agent",
];

const PLACE_PREPOSITIONS: &[&str] = &["in", "at", "near", "from", "to", "of"];

const MONTHS: &[&str] = &[
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// A run of capitalised tokens with its classified type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedEntity {
    pub text: String,
    pub entity_type: EntityType,
}

fn is_capitalised(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_uppercase())
}

fn classify_run(run: &[&str], previous: Option<&str>) -> Option<TaggedEntity> {
    if run.is_empty() {
        return None;
    }
    let text = run.join(" ");

    if run.iter().any(|t| MONTHS.contains(t)) {
        return Some(TaggedEntity {
            text,
            entity_type: EntityType::Date,
        });
    }
    if run.iter().any(|t| ORG_SUFFIXES.contains(t)) {
        return Some(TaggedEntity {
            text,
            entity_type: EntityType::Org,
        });
    }
    if let Some(prev) = previous {
        if PERSON_TITLES.contains(&prev.trim_end_matches('.')) {
            return Some(TaggedEntity {
                text,
                entity_type: EntityType::Person,
            });
        }
        if PLACE_PREPOSITIONS.contains(&prev.to_lowercase().as_str()) && run.len() <= 3 {
            return Some(TaggedEntity {
                text,
                entity_type: EntityType::Gpe,
            });
        }
    }
    // Multi-word capitalised runs default to person names; single
    // capitalised words are too ambiguous to tag (sentence starts).
    if run.len() >= 2 {
        return Some(TaggedEntity {
            text,
            entity_type: EntityType::Person,
        });
    }
    None
}

static MONEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[0-9][0-9,]*(?:\.[0-9]+)?").expect("money pattern"));

/// Tag entities in free text with the heuristic pass.
pub fn tag_entities(text: &str) -> Vec<TaggedEntity> {
    let mut entities = Vec::new();

    for m in MONEY.find_iter(text) {
        entities.push(TaggedEntity {
            text: m.as_str().to_string(),
            entity_type: EntityType::Money,
        });
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut run: Vec<&str> = Vec::new();
    let mut run_start = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        let word = token.trim_matches(|c: char| !c.is_alphanumeric());
        if !word.is_empty() && is_capitalised(word) && !word.chars().all(|c| c.is_ascii_digit()) {
            if run.is_empty() {
                run_start = i;
            }
            run.push(word);
            // Punctuation after the token ends the run: sentence and
            // clause boundaries never join two entities.
            if token.ends_with(['.', ',', ';', ':', '!', '?']) {
                let previous = run_start.checked_sub(1).map(|p| tokens[p]);
                entities.extend(classify_run(&run, previous));
                run.clear();
            }
        } else if !run.is_empty() {
            let previous = run_start.checked_sub(1).map(|p| tokens[p]);
            entities.extend(classify_run(&run, previous));
            run.clear();
        }
    }
    if !run.is_empty() {
        let previous = run_start.checked_sub(1).map(|p| tokens[p]);
        entities.extend(classify_run(&run, previous));
    }

    // Titles themselves sneak into runs ("Mr. John Smith" tokenises with
    // "Mr." capitalised); strip leading titles from person entities.
    for e in &mut entities {
        if e.entity_type == EntityType::Person {
            let mut words: Vec<&str> = e.text.split(' ').collect();
            while words
                .first()
                .is_some_and(|w| PERSON_TITLES.contains(&w.trim_end_matches('.')))
            {
                words.remove(0);
            }
            if !words.is_empty() {
                e.text = words.join(" ");
            }
        }
    }
    entities.retain(|e| !e.text.is_empty());

    entities
}

/// Corpus-wide entity occurrence index.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    /// (text, type) -> total occurrences across the corpus.
    counts: HashMap<String, u32>,
    /// text -> observed entity types.
    types: HashMap<String, HashSet<EntityType>>,
    /// doc_id -> texts occurring in that document.
    by_document: HashMap<String, HashSet<String>>,
    max_count: u32,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag `text` and fold the results into the index under `doc_id`.
    pub fn add_document(&mut self, doc_id: &str, text: &str) {
        for entity in tag_entities(text) {
            *self.counts.entry(entity.text.clone()).or_insert(0) += 1;
            self.max_count = self.max_count.max(self.counts[&entity.text]);
            self.types
                .entry(entity.text.clone())
                .or_default()
                .insert(entity.entity_type);
            self.by_document
                .entry(doc_id.to_string())
                .or_default()
                .insert(entity.text);
        }
    }

    pub fn corpus_count(&self, text: &str) -> u32 {
        self.counts.get(text).copied().unwrap_or(0)
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// True when `text` has been observed as `entity_type` in the corpus.
    pub fn occurs_as(&self, text: &str, entity_type: EntityType) -> bool {
        self.types
            .get(text)
            .is_some_and(|set| set.contains(&entity_type))
    }

    pub fn in_document(&self, doc_id: &str, text: &str) -> bool {
        self.by_document
            .get(doc_id)
            .is_some_and(|set| set.contains(text))
    }

    /// All distinct entity texts, for extending the candidate pool.
    pub fn entity_texts(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}
