//! Vocabulary of the ranking API: routing values, queues, tiers and divisions
//!
//! Orderings here come from explicit rank tables rather than declaration order,
//! so reordering the variants can never change crawl or selection order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Platform routing value (the host that serves league endpoints)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Br1,
    Eun1,
    Euw1,
    Jp1,
    Kr,
    La1,
    La2,
    Me1,
    Na1,
    Oc1,
    Ru,
    Sg2,
    Tr1,
    Tw2,
    Vn2,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Br1 => "br1",
            Self::Eun1 => "eun1",
            Self::Euw1 => "euw1",
            Self::Jp1 => "jp1",
            Self::Kr => "kr",
            Self::La1 => "la1",
            Self::La2 => "la2",
            Self::Me1 => "me1",
            Self::Na1 => "na1",
            Self::Oc1 => "oc1",
            Self::Ru => "ru",
            Self::Sg2 => "sg2",
            Self::Tr1 => "tr1",
            Self::Tw2 => "tw2",
            Self::Vn2 => "vn2",
        }
    }

    /// Regional routing group that serves match endpoints for this platform
    pub fn group(&self) -> RegionGroup {
        match self {
            Self::Br1 | Self::La1 | Self::La2 | Self::Na1 => RegionGroup::Americas,
            Self::Eun1 | Self::Euw1 | Self::Me1 | Self::Ru | Self::Tr1 => RegionGroup::Europe,
            Self::Jp1 | Self::Kr => RegionGroup::Asia,
            Self::Oc1 | Self::Sg2 | Self::Tw2 | Self::Vn2 => RegionGroup::Sea,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regional routing value (the host that serves match endpoints)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionGroup {
    Americas,
    Asia,
    Europe,
    Sea,
}

impl RegionGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Americas => "americas",
            Self::Asia => "asia",
            Self::Europe => "europe",
            Self::Sea => "sea",
        }
    }
}

impl fmt::Display for RegionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranked queue as named by the league endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Queue {
    #[serde(rename = "RANKED_SOLO_5x5")]
    RankedSolo5x5,
    #[serde(rename = "RANKED_FLEX_SR")]
    RankedFlexSr,
    #[serde(rename = "RANKED_FLEX_TT")]
    RankedFlexTt,
}

impl Queue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RankedSolo5x5 => "RANKED_SOLO_5x5",
            Self::RankedFlexSr => "RANKED_FLEX_SR",
            Self::RankedFlexTt => "RANKED_FLEX_TT",
        }
    }

    /// Numeric queue id used by the match endpoints
    pub fn id(&self) -> QueueId {
        match self {
            Self::RankedSolo5x5 => QueueId::RankedSolo5x5,
            Self::RankedFlexSr => QueueId::RankedFlexSr,
            Self::RankedFlexTt => QueueId::RankedFlexTt,
        }
    }

    /// Looks up the queue for a numeric id found in a match document
    pub fn from_id(id: u32) -> Option<Self> {
        QueueId::from_id(id).map(QueueId::queue)
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric queue id (see the upstream `queues.json` reference)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueId {
    RankedSolo5x5,
    RankedFlexSr,
    RankedFlexTt,
}

impl QueueId {
    pub fn value(&self) -> u32 {
        match self {
            Self::RankedSolo5x5 => 420,
            Self::RankedFlexSr => 440,
            Self::RankedFlexTt => 450,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            420 => Some(Self::RankedSolo5x5),
            440 => Some(Self::RankedFlexSr),
            450 => Some(Self::RankedFlexTt),
            _ => None,
        }
    }

    pub fn queue(self) -> Queue {
        match self {
            Self::RankedSolo5x5 => Queue::RankedSolo5x5,
            Self::RankedFlexSr => Queue::RankedFlexSr,
            Self::RankedFlexTt => Queue::RankedFlexTt,
        }
    }
}

/// Match type filter for the match-id endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    Ranked,
    Normal,
    Tourney,
    Tutorial,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ranked => "ranked",
            Self::Normal => "normal",
            Self::Tourney => "tourney",
            Self::Tutorial => "tutorial",
        }
    }
}

/// Competitive tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Challenger,
    Grandmaster,
    Master,
    Diamond,
    Emerald,
    Platinum,
    Gold,
    Silver,
    Bronze,
    Iron,
}

impl Tier {
    /// All tiers, best first
    pub const ALL: [Tier; 10] = [
        Tier::Challenger,
        Tier::Grandmaster,
        Tier::Master,
        Tier::Diamond,
        Tier::Emerald,
        Tier::Platinum,
        Tier::Gold,
        Tier::Silver,
        Tier::Bronze,
        Tier::Iron,
    ];

    /// Position in the ladder; 0 is the best tier
    pub fn rank(&self) -> u8 {
        match self {
            Self::Challenger => 0,
            Self::Grandmaster => 1,
            Self::Master => 2,
            Self::Diamond => 3,
            Self::Emerald => 4,
            Self::Platinum => 5,
            Self::Gold => 6,
            Self::Silver => 7,
            Self::Bronze => 8,
            Self::Iron => 9,
        }
    }

    /// Apex tiers are not subdivided; the API only serves division I for them
    pub fn is_apex(&self) -> bool {
        matches!(self, Self::Challenger | Self::Grandmaster | Self::Master)
    }

    /// Divisions that hold players in this tier, best first
    pub fn divisions(&self) -> &'static [Division] {
        const APEX: &[Division] = &[Division::I];
        const SUBDIVIDED: &[Division] = &Division::ALL;
        if self.is_apex() {
            APEX
        } else {
            SUBDIVIDED
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Challenger => "CHALLENGER",
            Self::Grandmaster => "GRANDMASTER",
            Self::Master => "MASTER",
            Self::Diamond => "DIAMOND",
            Self::Emerald => "EMERALD",
            Self::Platinum => "PLATINUM",
            Self::Gold => "GOLD",
            Self::Silver => "SILVER",
            Self::Bronze => "BRONZE",
            Self::Iron => "IRON",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Division within a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Division {
    I,
    II,
    III,
    IV,
}

impl Division {
    /// All divisions, best first
    pub const ALL: [Division; 4] = [Division::I, Division::II, Division::III, Division::IV];

    /// Position within a tier; 0 is the best division
    pub fn rank(&self) -> u8 {
        match self {
            Self::I => 0,
            Self::II => 1,
            Self::III => 2,
            Self::IV => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::IV => "IV",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One player's rank record as returned by the roster endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueEntry {
    pub puuid: String,
    pub tier: Tier,
    #[serde(rename = "rank")]
    pub division: Division,
    #[serde(rename = "queueType", default, skip_serializing_if = "Option::is_none")]
    pub queue_type: Option<String>,
    /// Every other field, kept so the raw record can be persisted as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Query parameters for the match-id endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchIdQuery {
    /// Epoch seconds
    pub start_time: Option<i64>,
    /// Epoch seconds
    pub end_time: Option<i64>,
    pub queue: Option<QueueId>,
    pub match_type: Option<MatchType>,
    pub start: u32,
    pub count: u32,
}

impl Default for MatchIdQuery {
    fn default() -> Self {
        Self {
            start_time: None,
            end_time: None,
            queue: None,
            match_type: None,
            start: 0,
            count: MAX_MATCH_PAGE,
        }
    }
}

/// Largest page the match-id endpoint will return
pub const MAX_MATCH_PAGE: u32 = 100;

impl MatchIdQuery {
    /// Query-string pairs; absent optional filters are left out entirely
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start_time) = self.start_time {
            params.push(("startTime", start_time.to_string()));
        }
        if let Some(end_time) = self.end_time {
            params.push(("endTime", end_time.to_string()));
        }
        if let Some(queue) = self.queue {
            params.push(("queue", queue.value().to_string()));
        }
        if let Some(match_type) = self.match_type {
            params.push(("type", match_type.as_str().to_string()));
        }
        params.push(("start", self.start.to_string()));
        params.push(("count", self.count.to_string()));
        params
    }
}
