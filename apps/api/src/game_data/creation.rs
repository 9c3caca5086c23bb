//! Character-creation hints derived from race and class reference data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game_data::{ApiReference, GameDataClient, GameDataError, ReferenceCategory};

#[derive(Debug, Clone, Deserialize)]
pub struct AbilityBonus {
    pub ability_score: ApiReference,
    pub bonus: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RaceDetail {
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub speed: Option<i64>,
    #[serde(default)]
    pub ability_bonuses: Vec<AbilityBonus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassDetail {
    pub index: String,
    pub name: String,
    pub hit_die: i64,
    #[serde(default)]
    pub saving_throws: Vec<ApiReference>,
}

/// Suggested starting values for a race/class pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreationHints {
    pub race: String,
    pub class: String,
    pub speed: Option<i64>,
    /// Keyed by ability index (`str`, `dex`, `con`, ...).
    pub ability_bonuses: BTreeMap<String, i64>,
    pub hit_die: i64,
    pub saving_throws: Vec<String>,
    /// Level-1 hit points, present when a constitution score was given.
    pub suggested_hit_points: Option<i64>,
}

/// Standard ability modifier: `floor((score - 10) / 2)`. Saturates at the
/// `i64` bounds.
pub fn ability_modifier(score: i64) -> i64 {
    score.saturating_sub(10).div_euclid(2)
}

pub fn derive_hints(race: &RaceDetail, class: &ClassDetail, constitution: Option<i64>) -> CreationHints {
    let ability_bonuses = race
        .ability_bonuses
        .iter()
        .map(|b| (b.ability_score.index.clone(), b.bonus))
        .collect();

    CreationHints {
        race: race.name.clone(),
        class: class.name.clone(),
        speed: race.speed,
        ability_bonuses,
        hit_die: class.hit_die,
        saving_throws: class
            .saving_throws
            .iter()
            .map(|s| s.name.clone())
            .collect(),
        suggested_hit_points: constitution
            .map(|con| class.hit_die.saturating_add(ability_modifier(con)).max(1)),
    }
}

/// Fetches race and class concurrently and derives hints from both.
pub async fn creation_hints(
    client: &GameDataClient,
    race: &str,
    class: &str,
    constitution: Option<i64>,
) -> Result<CreationHints, GameDataError> {
    let (race, class) = tokio::try_join!(
        client.get_typed::<RaceDetail>(ReferenceCategory::Races, race),
        client.get_typed::<ClassDetail>(ReferenceCategory::Classes, class),
    )?;
    Ok(derive_hints(&race, &class, constitution))
}
