//! Odds facts: update-only.
//!
//! Wire format:
//! `{"away_team":"Minnesota Timberwolves","home_team":"Sacramento Kings",
//!   "start_time":"Saturday, Nov 16, 2024 at 3:00am",
//!   "betting_prices":{"Minnesota Timberwolves":"-105","Sacramento Kings":"-115"}}`

use super::ResolvedFact;
use crate::error::IngestError;
use crate::identity::GameKeyBuilder;
use crate::matching::{normalize, TeamResolver};
use crate::models::{fields, GameFields, Topic};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct OddsMessage {
    away_team: String,
    home_team: String,
    start_time: String,
    betting_prices: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OddsFact {
    pub home_team: String,
    pub away_team: String,
    pub start_time: String,
    /// American moneyline price, e.g. "-115"
    pub home_price: String,
    pub away_price: Option<String>,
}

/// Render a price as sent: strings verbatim, numbers with an explicit sign.
fn price_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(v) if v > 0 => Some(format!("+{}", v)),
            Some(v) => Some(v.to_string()),
            None => Some(n.to_string()),
        },
        _ => None,
    }
}

/// Prices are keyed by the team name as sent; fall back to a normalized comparison,
/// which must pick out a single key.
fn price_for<'a>(
    prices: &'a BTreeMap<String, Value>,
    team: &str,
) -> Result<Option<&'a Value>, IngestError> {
    if let Some(value) = prices.get(team) {
        return Ok(Some(value));
    }

    let wanted = normalize(team);
    let mut candidates = prices.iter().filter(|(name, _)| normalize(name) == wanted);
    match (candidates.next(), candidates.next()) {
        (Some((_, value)), None) => Ok(Some(value)),
        (None, _) => Ok(None),
        (Some(_), Some(_)) => Err(IngestError::decode(
            Topic::Odds,
            format!("ambiguous price keys for `{}`", team),
        )),
    }
}

impl OddsFact {
    pub fn decode(payload: &[u8]) -> Result<Self, IngestError> {
        let msg: OddsMessage = serde_json::from_slice(payload)
            .map_err(|e| IngestError::decode(Topic::Odds, e.to_string()))?;

        let home_price = price_for(&msg.betting_prices, &msg.home_team)?
            .and_then(price_text)
            .ok_or_else(|| {
                IngestError::decode(
                    Topic::Odds,
                    format!("no price for home team `{}`", msg.home_team),
                )
            })?;

        let away_price = match price_for(&msg.betting_prices, &msg.away_team)? {
            Some(value) => Some(price_text(value).ok_or_else(|| {
                IngestError::decode(
                    Topic::Odds,
                    format!("invalid price for away team `{}`", msg.away_team),
                )
            })?),
            None => None,
        };

        Ok(Self {
            home_team: msg.home_team,
            away_team: msg.away_team,
            start_time: msg.start_time,
            home_price,
            away_price,
        })
    }

    pub fn resolve(
        &self,
        resolver: &TeamResolver,
        keys: &GameKeyBuilder,
    ) -> Result<ResolvedFact, IngestError> {
        let matchup = resolver.resolve_pair(&self.home_team, &self.away_team)?;
        let (home, away) = (matchup.home, matchup.away);
        let start = keys.parse_start(&self.start_time)?;
        let key = keys.build(&home, &away, start);

        let mut game_fields = GameFields::new();
        game_fields.insert(fields::HOME_TEAM_ODDS.to_string(), self.home_price.clone());
        if let Some(price) = &self.away_price {
            game_fields.insert(fields::AWAY_TEAM_ODDS.to_string(), price.clone());
        }

        Ok(ResolvedFact {
            topic: Topic::Odds,
            key,
            home,
            start,
            fields: game_fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolutionFailure;
    use crate::matching::TeamVocabulary;
    use std::sync::Arc;

    const ODDS: &[u8] = br#"{"away_team":"Minnesota Timberwolves","home_team":"Sacramento Kings","start_time":"Saturday, Nov 16, 2024 at 3:00am","betting_prices":{"Minnesota Timberwolves":"-105","Sacramento Kings":"-115"}}"#;

    fn resolver() -> TeamResolver {
        TeamResolver::new(Arc::new(TeamVocabulary::nba()))
    }

    #[test]
    fn test_decode_odds() {
        let fact = OddsFact::decode(ODDS).unwrap();
        assert_eq!(fact.home_team, "Sacramento Kings");
        assert_eq!(fact.home_price, "-115");
        assert_eq!(fact.away_price.as_deref(), Some("-105"));
    }

    #[test]
    fn test_decode_numeric_prices() {
        let payload = br#"{"away_team":"MIA","home_team":"ATL","start_time":"2025-02-25T00:30:00Z","betting_prices":{"ATL":-110,"MIA":155}}"#;
        let fact = OddsFact::decode(payload).unwrap();
        assert_eq!(fact.home_price, "-110");
        assert_eq!(fact.away_price.as_deref(), Some("+155"));
    }

    #[test]
    fn test_price_lookup_tolerates_case() {
        let payload = br#"{"away_team":"Miami Heat","home_team":"Atlanta Hawks","start_time":"2025-02-25T00:30:00Z","betting_prices":{"atlanta hawks":"-110"}}"#;
        let fact = OddsFact::decode(payload).unwrap();
        assert_eq!(fact.home_price, "-110");
        assert!(fact.away_price.is_none());
    }

    #[test]
    fn test_exact_price_key_beats_normalized_ones() {
        let payload = br#"{"away_team":"Miami Heat","home_team":"Atlanta Hawks","start_time":"2025-02-25T00:30:00Z","betting_prices":{"atlanta hawks":"-120","Atlanta Hawks":"-110"}}"#;
        assert_eq!(OddsFact::decode(payload).unwrap().home_price, "-110");
    }

    #[test]
    fn test_colliding_price_keys_are_rejected() {
        let payload = br#"{"away_team":"Miami Heat","home_team":"ATLANTA HAWKS","start_time":"2025-02-25T00:30:00Z","betting_prices":{"atlanta hawks":"-110","Atlanta Hawks!":"-120"}}"#;
        match OddsFact::decode(payload) {
            Err(IngestError::Decode { topic, reason }) => {
                assert_eq!(topic, Topic::Odds);
                assert!(reason.contains("ambiguous"), "reason was {}", reason);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_decode_fails_closed() {
        let cases: &[&[u8]] = &[
            b"{}",
            br#"{"away_team":"Miami Heat","home_team":"Atlanta Hawks","start_time":"2025-02-25T00:30:00Z"}"#,
            br#"{"away_team":"Miami Heat","home_team":"Atlanta Hawks","start_time":"2025-02-25T00:30:00Z","betting_prices":{"Miami Heat":"+120"}}"#,
            br#"{"away_team":"Miami Heat","home_team":"Atlanta Hawks","start_time":"2025-02-25T00:30:00Z","betting_prices":{"Atlanta Hawks":null}}"#,
            br#"{"away_team":"Miami Heat","home_team":"Atlanta Hawks","start_time":"2025-02-25T00:30:00Z","betting_prices":{"Atlanta Hawks":"-110","Miami Heat":[1]}}"#,
            br#"{"away_team":7,"home_team":"Atlanta Hawks","start_time":"2025-02-25T00:30:00Z","betting_prices":{}}"#,
        ];
        for payload in cases {
            assert!(
                matches!(
                    OddsFact::decode(payload),
                    Err(IngestError::Decode { topic: Topic::Odds, .. })
                ),
                "payload {:?} should fail decode",
                String::from_utf8_lossy(payload)
            );
        }
    }

    #[test]
    fn test_resolve_odds() {
        let resolved = OddsFact::decode(ODDS)
            .unwrap()
            .resolve(&resolver(), &GameKeyBuilder::utc())
            .unwrap();
        assert_eq!(resolved.key.as_str(), "SAC MIN 11.16.2024");
        assert!(!resolved.is_seeding());
        assert_eq!(resolved.fields.len(), 2);
        assert_eq!(resolved.fields[fields::HOME_TEAM_ODDS], "-115");
        assert_eq!(resolved.fields[fields::AWAY_TEAM_ODDS], "-105");
    }

    #[test]
    fn test_resolve_same_team_both_sides() {
        let payload = br#"{"away_team":"Atlanta Hawks","home_team":"ATL","start_time":"2025-02-25T00:30:00Z","betting_prices":{"ATL":"-110"}}"#;
        let err = OddsFact::decode(payload)
            .unwrap()
            .resolve(&resolver(), &GameKeyBuilder::utc())
            .unwrap_err();
        match err {
            IngestError::TeamResolution { failure, .. } => {
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
    fn test_resolve_unknown_team() {
        let payload = br#"{"away_team":"Seattle SuperSonics","home_team":"Atlanta Hawks","start_time":"2025-02-25T00:30:00Z","betting_prices":{"Atlanta Hawks":"-110"}}"#;
        let err = OddsFact::decode(payload)
            .unwrap()
            .resolve(&resolver(), &GameKeyBuilder::utc())
            .unwrap_err();
        match err {
            IngestError::TeamResolution { text, failure } => {
                assert_eq!(text, "Seattle SuperSonics");
                assert_eq!(failure, ResolutionFailure::UnknownTeam);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
