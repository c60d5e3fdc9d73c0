//! Team Resolver
//!
//! Two entry points:
//! - [`TeamResolver::resolve_exact`] for feeds that already isolate a team field
//! - [`TeamResolver::resolve_pair`] for feeds that isolate both team fields
//! - [`TeamResolver::extract_matchup`] for combined event titles ("X vs Y"); only
//!   multi-word team names are recognised there
//!
//! Both are pure lookups over the shared vocabulary. Anything short of an unambiguous
//! answer is an error: a wrong mapping would silently corrupt a game key.

use super::{normalize, tokenize, TeamVocabulary};
use crate::error::{IngestError, ResolutionFailure};
use crate::models::TeamCode;
use std::sync::Arc;
use strsim::jaro_winkler;

/// Minimum Jaro-Winkler score for an alias to be offered as a suggestion
const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Teams extracted from an event title.
///
/// Titles are read as "HOME vs AWAY": the first team found is home, the second away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    pub home: TeamCode,
    pub away: TeamCode,
}

#[derive(Debug, Clone)]
pub struct TeamResolver {
    vocabulary: Arc<TeamVocabulary>,
}

impl TeamResolver {
    pub fn new(vocabulary: Arc<TeamVocabulary>) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &TeamVocabulary {
        &self.vocabulary
    }

    /// Resolve an isolated team name (`"Atlanta Hawks"`, `"atlanta hawks"`, `"ATL"`).
    pub fn resolve_exact(&self, name: &str) -> Result<TeamCode, IngestError> {
        self.vocabulary
            .lookup(&normalize(name))
            .cloned()
            .ok_or_else(|| IngestError::TeamResolution {
                text: name.to_string(),
                failure: ResolutionFailure::UnknownTeam,
            })
    }

    /// Resolve isolated home and away fields; both must be known and distinct.
    pub fn resolve_pair(&self, home: &str, away: &str) -> Result<Matchup, IngestError> {
        let home_code = self.resolve_exact(home)?;
        let away_code = self.resolve_exact(away)?;
        if home_code == away_code {
            return Err(IngestError::TeamResolution {
                text: format!("{} vs {}", home, away),
                failure: ResolutionFailure::SameTeamTwice {
                    code: home_code.to_string(),
                },
            });
        }
        Ok(Matchup {
            home: home_code,
            away: away_code,
        })
    }

    /// Extract exactly two distinct teams from free text.
    ///
    /// Scans contiguous word windows, longest first at each position; a match consumes
    /// its words so matches never overlap.
    pub fn extract_matchup(&self, text: &str) -> Result<Matchup, IngestError> {
        let matched = self.scan(text);

        let fail = |failure| IngestError::TeamResolution {
            text: text.to_string(),
            failure,
        };

        match matched.as_slice() {
            [home, away] if home == away => Err(fail(ResolutionFailure::SameTeamTwice {
                code: home.to_string(),
            })),
            [home, away] => Ok(Matchup {
                home: home.clone(),
                away: away.clone(),
            }),
            _ => Err(fail(ResolutionFailure::AmbiguousOrMissingTeams {
                matched: matched.len(),
            })),
        }
    }

    /// All non-overlapping full-name matches in order of appearance.
    fn scan(&self, text: &str) -> Vec<TeamCode> {
        let words = tokenize(text);
        let max_window = self.vocabulary.max_title_words();
        let mut matched = Vec::new();

        let mut i = 0;
        'outer: while i < words.len() {
            let longest = max_window.min(words.len() - i);
            for len in (2..=longest).rev() {
                let candidate = words[i..i + len].join(" ");
                if let Some(code) = self.vocabulary.lookup_title(&candidate) {
                    matched.push(code.clone());
                    i += len;
                    continue 'outer;
                }
            }
            i += 1;
        }

        matched
    }

    /// Closest known alias to any phrase in `text`, for vocabulary-maintenance logs.
    pub fn closest_alias(&self, text: &str) -> Option<(String, TeamCode)> {
        let words = tokenize(text);
        let max_window = self.vocabulary.max_alias_words();
        let mut best: Option<(f64, &str, &TeamCode)> = None;

        for start in 0..words.len() {
            for len in 1..=max_window.min(words.len() - start) {
                let phrase = words[start..start + len].join(" ");
                for (alias, code) in self.vocabulary.aliases() {
                    if alias == phrase {
                        continue;
                    }
                    let score = jaro_winkler(&phrase, alias);
                    if score >= SUGGESTION_THRESHOLD
                        && best.map_or(true, |(best_score, _, _)| score > best_score)
                    {
                        best = Some((score, alias, code));
                    }
                }
            }
        }

        best.map(|(_, alias, code)| (alias.to_string(), code.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TeamResolver {
        TeamResolver::new(Arc::new(TeamVocabulary::nba()))
    }

    fn code(c: &str) -> TeamCode {
        TeamCode::new(c)
    }

    #[test]
    fn test_every_alias_resolves_exactly() {
        let resolver = resolver();
        let vocab = resolver.vocabulary().clone();
        for (alias, expected) in vocab.aliases() {
            assert_eq!(&resolver.resolve_exact(alias).unwrap(), expected, "alias {}", alias);
            assert_eq!(
                &resolver.resolve_exact(&alias.to_uppercase()).unwrap(),
                expected,
                "alias {}",
                alias
            );
        }
    }

    #[test]
    fn test_resolve_exact_vocabularies_agree() {
        let resolver = resolver();
        for name in ["Atlanta Hawks", "atlanta hawks", "ATL", " Atlanta Hawks. "] {
            assert_eq!(resolver.resolve_exact(name).unwrap(), code("ATL"));
        }
    }

    #[test]
    fn test_resolve_exact_unknown() {
        let err = resolver().resolve_exact("Seattle SuperSonics").unwrap_err();
        match err {
            IngestError::TeamResolution { text, failure } => {
                assert_eq!(text, "Seattle SuperSonics");
                assert_eq!(failure, ResolutionFailure::UnknownTeam);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_resolve_exact_does_not_partially_match() {
        assert!(resolver().resolve_exact("Atlanta Hawks Tickets").is_err());
    }

    #[test]
    fn test_extract_matchup_home_first() {
        let matchup = resolver().extract_matchup("Atlanta Hawks vs Miami Heat").unwrap();
        assert_eq!(matchup.home, code("ATL"));
        assert_eq!(matchup.away, code("MIA"));
    }

    #[test]
    fn test_extract_matchup_prefers_longest_alias() {
        let matchup = resolver()
            .extract_matchup("Los Angeles Lakers vs. Portland Trail Blazers")
            .unwrap();
        assert_eq!(matchup.home, code("LAL"));
        assert_eq!(matchup.away, code("POR"));
    }

    #[test]
    fn test_extract_matchup_with_prose() {
        let matchup = resolver()
            .extract_matchup("NBA Regular Season: Philadelphia 76ers vs. Golden State Warriors (Rivalry Night)")
            .unwrap();
        assert_eq!(matchup.home, code("PHI"));
        assert_eq!(matchup.away, code("GSW"));
    }

    #[test]
    fn test_extract_matchup_single_team_fails() {
        let err = resolver().extract_matchup("Atlanta Hawks vs TBD").unwrap_err();
        assert!(matches!(
            err,
            IngestError::TeamResolution {
                failure: ResolutionFailure::AmbiguousOrMissingTeams { matched: 1 },
                ..
            }
        ));
    }

    #[test]
    fn test_extract_matchup_three_teams_fails() {
        let err = resolver()
            .extract_matchup("Atlanta Hawks vs Miami Heat, then Boston Celtics")
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::TeamResolution {
                failure: ResolutionFailure::AmbiguousOrMissingTeams { matched: 3 },
                ..
            }
        ));
    }

    #[test]
    fn test_extract_matchup_same_team_twice_fails() {
        let err = resolver().extract_matchup("Atlanta Hawks vs atlanta hawks").unwrap_err();
        assert!(matches!(
            err,
            IngestError::TeamResolution {
                failure: ResolutionFailure::SameTeamTwice { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_prose_words_never_count_as_teams() {
        let resolver = resolver();
        for title in [
            "Atlanta Hawks Watch Party - doors open 30 min early",
            "Heat Check Night: Atlanta Hawks",
            "Atlanta Hawks Magic Giveaway Night",
            "Kings of the Court feat. Atlanta Hawks",
        ] {
            let err = resolver.extract_matchup(title).unwrap_err();
            assert!(
                matches!(
                    err,
                    IngestError::TeamResolution {
                        failure: ResolutionFailure::AmbiguousOrMissingTeams { matched: 1 },
                        ..
                    }
                ),
                "title {:?} gave {:?}",
                title,
                err
            );
        }
    }

    #[test]
    fn test_nicknames_alone_do_not_resolve_titles() {
        assert!(resolver().extract_matchup("Hawks vs Heat").is_err());
    }

    #[test]
    fn test_resolve_pair() {
        let matchup = resolver().resolve_pair("atlanta hawks", "MIA").unwrap();
        assert_eq!(matchup.home, code("ATL"));
        assert_eq!(matchup.away, code("MIA"));
    }

    #[test]
    fn test_resolve_pair_same_team_fails() {
        let err = resolver().resolve_pair("ATL", "Atlanta Hawks").unwrap_err();
        match err {
            IngestError::TeamResolution { text, failure } => {
                assert_eq!(text, "ATL vs Atlanta Hawks");
                assert_eq!(
                    failure,
                    ResolutionFailure::SameTeamTwice {
                        code: "ATL".to_string()
                    }
                );
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_extract_matchup_empty_text() {
        assert!(resolver().extract_matchup("").is_err());
    }

    #[test]
    fn test_closest_alias_suggests_typo_fix() {
        let (alias, team) = resolver().closest_alias("Atlanta Hawkz vs TBD").unwrap();
        assert_eq!(alias, "atlanta hawks");
        assert_eq!(team, code("ATL"));
    }

    #[test]
    fn test_closest_alias_none_for_unrelated_text() {
        assert!(resolver().closest_alias("zzzz qqqq").is_none());
    }
}
