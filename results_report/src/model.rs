// ********* Election data structures ***********
//
// These objects are built by an external loader and consumed read-only by the
// derived views and the renderer. All the totals are pre-computed upstream:
// nothing in this crate tallies ballots.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// A piece of text translated into one or more languages, keyed by language
/// code ("en", "es", ...).
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct I18nText(pub BTreeMap<String, String>);

impl I18nText {
    /// Builds a text with a single English translation.
    pub fn from_en(text: &str) -> I18nText {
        let mut m = BTreeMap::new();
        m.insert("en".to_string(), text.to_string());
        I18nText(m)
    }

    /// The text for the requested language, falling back to English and then
    /// to any available translation.
    pub fn get(&self, lang: &str) -> &str {
        self.0
            .get(lang)
            .or_else(|| self.0.get("en"))
            .or_else(|| self.0.values().next())
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

/// A generic result statistic carried alongside the vote totals
/// (registration, ballots cast, continuing ballots, turnout, ...).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultStatType {
    pub id: String,
    pub heading: I18nText,
    /// Percent-valued stats are stored in hundredths of a percent and
    /// rendered as percentages instead of plain numbers.
    pub is_percent: bool,
}

/// A reporting group for vote totals (total, election day, vote by mail, ...).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VotingGroup {
    pub id: String,
    pub heading: I18nText,
}

/// A candidate or measure choice within a contest.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Choice {
    pub id: String,
    pub title: I18nText,
    /// Whether the external results computation flagged this choice as a
    /// winner of the contest. More than one choice may carry the flag.
    pub is_winner: bool,
    /// 0-based position of the choice within the contest.
    pub index: usize,
}

/// A grouping label preceding one or more contests on the summary page.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Header {
    pub id: String,
    pub title: I18nText,
    /// Nesting level, 1 or 2.
    pub level: u8,
}

/// Positions of stats and choices within a single totals row.
///
/// A totals row lays out all the result stats first, then one column per
/// choice in ballot order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultsMapping {
    stat_count: usize,
    choice_count: usize,
}

impl ResultsMapping {
    pub fn new(stat_count: usize, choice_count: usize) -> ResultsMapping {
        ResultsMapping {
            stat_count,
            choice_count,
        }
    }

    /// Column of the stat at the given position in the contest's stat list.
    pub fn stat_index(&self, stat_pos: usize) -> usize {
        stat_pos
    }

    pub fn choice_index(&self, choice: &Choice) -> usize {
        self.stat_count + choice.index
    }

    /// Total number of value columns in a row.
    pub fn width(&self) -> usize {
        self.stat_count + self.choice_count
    }
}

/// A single contest with its pre-computed results.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Contest {
    pub id: String,
    /// Contest kind as declared by the input data ("office", "measure", ...).
    pub type_name: String,
    pub title: I18nText,
    pub subtitle: I18nText,
    /// Voting instruction shown under the title ("Vote for 1", ...).
    pub vote_for_msg: Option<String>,
    /// Grouping headers for this contest, outermost (level 1) first.
    pub headers: Vec<Header>,
    pub total_precincts: Option<u32>,
    pub precincts_reporting: Option<u32>,
    /// Whether this contest is decided by ranked-choice voting.
    pub is_rcv: bool,
    pub choices: Vec<Choice>,
    pub stats: Vec<ResultStatType>,
    pub voting_groups: Vec<VotingGroup>,
    pub mapping: ResultsMapping,
    /// One totals row per voting group, in voting-group order.
    pub results: Vec<Vec<i64>>,
    /// For RCV contests, one totals row per round starting with round 1.
    /// `None` marks a candidate already eliminated in that round.
    pub rcv_totals: Vec<Vec<Option<i64>>>,
}

impl Contest {
    /// Position of a stat in the contest's stat list, by stat id.
    pub fn stat_position(&self, stat_id: &str) -> Option<usize> {
        self.stats.iter().position(|s| s.id == stat_id)
    }

    /// A value from the results grid.
    pub fn value(&self, group_idx: usize, col: usize) -> i64 {
        self.results[group_idx][col]
    }

    pub fn choice_votes(&self, group_idx: usize, choice: &Choice) -> i64 {
        self.value(group_idx, self.mapping.choice_index(choice))
    }

    pub fn stat_value(&self, group_idx: usize, stat_pos: usize) -> i64 {
        self.value(group_idx, self.mapping.stat_index(stat_pos))
    }

    /// Sum of all choice columns for one voting group. Used as the
    /// denominator of the share column on summary tables.
    pub fn total_choice_votes(&self, group_idx: usize) -> i64 {
        self.choices
            .iter()
            .map(|c| self.choice_votes(group_idx, c))
            .sum()
    }

    pub fn num_rcv_rounds(&self) -> u32 {
        self.rcv_totals.len() as u32
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Election {
    pub ballot_title: I18nText,
    /// Election date, as an ISO "YYYY-MM-DD" string.
    pub date: String,
    pub election_area: I18nText,
    /// Contests in ballot order. Group headers are carried by the contests
    /// themselves (see [Contest::headers]).
    pub contests: Vec<Contest>,
}

/// Errors raised while deriving views over the model.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ModelError {
    /// The contest does not carry a stat with the given id.
    UnknownStat(String),
    /// A round number outside 1..=num_rounds was requested.
    RoundOutOfRange(u32),
}

impl Error for ModelError {}

impl Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::UnknownStat(id) => write!(f, "unknown result stat id {:?}", id),
            ModelError::RoundOutOfRange(n) => write!(f, "round number {} out of range", n),
        }
    }
}
