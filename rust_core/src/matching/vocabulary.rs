//! Team vocabulary: canonical codes and their known aliases.
//!
//! This module provides:
//! - The built-in NBA table
//! - JSON loading (`{ "ATL": ["atlanta hawks", "hawks"], ... }`)
//! - Validation that every alias maps to exactly one code
//!
//! Two tables are kept. Every alias, including the bare code, resolves an isolated team
//! field. Only multi-word aliases (full names) are used to scan event titles, since
//! codes and nicknames ("min", "heat", "magic") are also ordinary words.
//!
//! Loaded once at startup and shared behind an `Arc`; never mutated afterwards.

use super::normalize;
use crate::error::VocabularyError;
use crate::models::TeamCode;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Format: code -> aliases (full names, alternate names, nickname). All lowercase.
const NBA_TEAMS: &[(&str, &[&str])] = &[
    ("ATL", &["atlanta hawks", "hawks"]),
    ("BOS", &["boston celtics", "celtics"]),
    ("BKN", &["brooklyn nets", "nets"]),
    ("CHA", &["charlotte hornets", "hornets"]),
    ("CHI", &["chicago bulls", "bulls"]),
    ("CLE", &["cleveland cavaliers", "cavaliers", "cavs"]),
    ("DAL", &["dallas mavericks", "mavericks", "mavs"]),
    ("DEN", &["denver nuggets", "nuggets"]),
    ("DET", &["detroit pistons", "pistons"]),
    ("GSW", &["golden state warriors", "warriors"]),
    ("HOU", &["houston rockets", "rockets"]),
    ("IND", &["indiana pacers", "pacers"]),
    ("LAC", &["los angeles clippers", "la clippers", "clippers"]),
    ("LAL", &["los angeles lakers", "la lakers", "lakers"]),
    ("MEM", &["memphis grizzlies", "grizzlies"]),
    ("MIA", &["miami heat", "heat"]),
    ("MIL", &["milwaukee bucks", "bucks"]),
    ("MIN", &["minnesota timberwolves", "timberwolves", "wolves"]),
    ("NOP", &["new orleans pelicans", "pelicans"]),
    ("NYK", &["new york knicks", "ny knicks", "knicks"]),
    ("OKC", &["oklahoma city thunder", "thunder"]),
    ("ORL", &["orlando magic", "magic"]),
    ("PHI", &["philadelphia 76ers", "philadelphia sixers", "76ers", "sixers"]),
    ("PHX", &["phoenix suns", "suns"]),
    ("POR", &["portland trail blazers", "trail blazers", "blazers"]),
    ("SAC", &["sacramento kings", "kings"]),
    ("SAS", &["san antonio spurs", "spurs"]),
    ("TOR", &["toronto raptors", "raptors"]),
    ("UTA", &["utah jazz", "jazz"]),
    ("WAS", &["washington wizards", "wizards"]),
];

/// Immutable alias -> code lookup.
#[derive(Debug, Clone)]
pub struct TeamVocabulary {
    /// normalized alias -> code
    aliases: FxHashMap<String, TeamCode>,
    /// Multi-word subset of `aliases` used for title scanning
    title_aliases: FxHashMap<String, TeamCode>,
    codes: Vec<TeamCode>,
    max_alias_words: usize,
    /// Word count of the longest title alias; bounds the title scan window.
    max_title_words: usize,
}

impl TeamVocabulary {
    /// Built-in NBA vocabulary.
    pub fn nba() -> Self {
        let entries = NBA_TEAMS
            .iter()
            .map(|(code, aliases)| (code.to_string(), aliases.iter().map(|a| a.to_string()).collect()));
        // Validated by test_builtin_table_is_valid
        Self::from_entries(entries).unwrap_or_else(|_| Self::empty())
    }

    fn empty() -> Self {
        Self {
            aliases: FxHashMap::default(),
            title_aliases: FxHashMap::default(),
            codes: Vec::new(),
            max_alias_words: 0,
            max_title_words: 0,
        }
    }

    /// Build from `(code, aliases)` entries. The code itself is always an alias.
    pub fn from_entries<I>(entries: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut vocab = Self::empty();

        for (raw_code, aliases) in entries {
            let code = TeamCode::new(&raw_code);
            if code.as_str().is_empty() {
                return Err(VocabularyError::EmptyCode);
            }

            for alias in std::iter::once(raw_code.clone()).chain(aliases) {
                let alias_norm = normalize(&alias);
                if alias_norm.is_empty() {
                    return Err(VocabularyError::EmptyAlias {
                        code: code.to_string(),
                        alias,
                    });
                }

                match vocab.aliases.get(&alias_norm) {
                    Some(existing) if existing != &code => {
                        return Err(VocabularyError::DuplicateAlias {
                            alias: alias_norm,
                            first: existing.to_string(),
                            second: code.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        let words = alias_norm.split(' ').count();
                        vocab.max_alias_words = vocab.max_alias_words.max(words);
                        if words > 1 {
                            vocab.max_title_words = vocab.max_title_words.max(words);
                            vocab.title_aliases.insert(alias_norm.clone(), code.clone());
                        }
                        vocab.aliases.insert(alias_norm, code.clone());
                    }
                }
            }

            if !vocab.codes.contains(&code) {
                vocab.codes.push(code);
            }
        }

        vocab.codes.sort();
        Ok(vocab)
    }

    /// Parse the JSON form: `{ "CODE": ["alias", ...], ... }`.
    pub fn from_json_str(content: &str) -> Result<Self, VocabularyError> {
        // BTreeMap keeps duplicate-alias errors deterministic
        let data: BTreeMap<String, Vec<String>> = serde_json::from_str(content)?;
        Self::from_entries(data)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VocabularyError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let vocab = Self::from_json_str(&content)?;
        info!(
            "Loaded team vocabulary from {}: {} teams, {} aliases",
            path.display(),
            vocab.codes.len(),
            vocab.aliases.len()
        );
        Ok(vocab)
    }

    /// Look up an already-normalized alias.
    pub fn lookup(&self, normalized: &str) -> Option<&TeamCode> {
        self.aliases.get(normalized)
    }

    /// Look up an already-normalized phrase among the title aliases.
    pub fn lookup_title(&self, normalized: &str) -> Option<&TeamCode> {
        self.title_aliases.get(normalized)
    }

    /// All `(normalized alias, code)` pairs.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &TeamCode)> {
        self.aliases.iter().map(|(a, c)| (a.as_str(), c))
    }

    /// Canonical codes, sorted.
    pub fn codes(&self) -> &[TeamCode] {
        &self.codes
    }

    pub fn max_alias_words(&self) -> usize {
        self.max_alias_words
    }

    pub fn max_title_words(&self) -> usize {
        self.max_title_words
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for TeamVocabulary {
    fn default() -> Self {
        Self::nba()
    }
}
