//! Loading the election definition and the per-contest results data.
//!
//! The inputs are a single `election.json` file plus a `resultdata/`
//! directory with a contest status file and one delimited totals file per
//! contest. Everything is resolved into the [results_report] model here:
//! result styles are expanded into per-contest stat and voting-group lists,
//! header chains are flattened, and the totals rows are validated against
//! the expected column layout.

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use snafu::prelude::*;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use results_report::{
    Choice, Contest, Election, Header, I18nText, ResultStatType, ResultsMapping, VotingGroup,
};

use crate::report::tsv::{self, TsvTable};
use crate::report::{
    InvalidNumberSnafu, MismatchedColumnsSnafu, MismatchedGroupsSnafu, MismatchedRcvRowSnafu,
    OpeningInputSnafu, ParsingJsonSnafu, ReportResult, UnknownIdSnafu,
};

/// Subdirectory of the input directory holding the results data.
pub const RESULTS_DIR: &str = "resultdata";

/// Name of the contest status file inside [RESULTS_DIR].
pub const CONTEST_STATUS_FILE: &str = "contest-status.json";

/// Name of the totals file for one contest inside [RESULTS_DIR].
pub fn contest_results_file(contest_id: &str) -> String {
    format!("results-{}.tsv", contest_id)
}

/// Number of label columns preceding the value columns in a totals row.
const LABEL_COLUMNS: usize = 2;

type RawText = BTreeMap<String, String>;

// ********* JSON shapes of the input files ***********

#[derive(Debug, Clone, Deserialize)]
pub struct ElectionFile {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub translations: BTreeMap<String, RawText>,
    pub result_stat_types: Vec<ResultStatTypeJson>,
    pub voting_groups: Vec<VotingGroupJson>,
    pub result_styles: Vec<ResultStyleJson>,
    pub election: ElectionJson,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultStatTypeJson {
    #[serde(rename = "_id")]
    pub id: String,
    pub heading: RawText,
    #[serde(default)]
    pub is_percent: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VotingGroupJson {
    #[serde(rename = "_id")]
    pub id: String,
    pub heading: RawText,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultStyleJson {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub is_rcv: bool,
    /// Space-separated ids into the top-level voting group list.
    pub voting_group_ids: String,
    /// Space-separated ids into the top-level stat type list.
    pub result_stat_type_ids: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderJson {
    #[serde(rename = "_id")]
    pub id: String,
    pub ballot_title: RawText,
    pub level: u8,
    /// Id of the enclosing header, for level 2 headers.
    #[serde(default)]
    pub header_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceJson {
    #[serde(rename = "_id")]
    pub id: String,
    pub ballot_title: RawText,
    #[serde(default)]
    pub is_winner: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContestJson {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub type_name: String,
    pub ballot_title: RawText,
    #[serde(default)]
    pub ballot_subtitle: RawText,
    #[serde(default)]
    pub vote_for_msg: Option<String>,
    #[serde(default)]
    pub header_id: Option<String>,
    pub result_style: String,
    pub choices: Vec<ChoiceJson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElectionJson {
    pub ballot_title: RawText,
    pub election_date: String,
    #[serde(default)]
    pub election_area: RawText,
    #[serde(default)]
    pub headers: Vec<HeaderJson>,
    pub contests: Vec<ContestJson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContestStatusJson {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub total_precincts: Option<u32>,
    #[serde(default)]
    pub precincts_reporting: Option<u32>,
    #[serde(default)]
    pub rcv_rounds: Option<u32>,
}

// ********* Loading and resolution ***********

/// The resolved election plus the presentation data that lives outside the
/// model: the declared languages and the translated phrases.
#[derive(Debug, Clone)]
pub struct LoadedElection {
    pub election: Election,
    pub languages: Vec<String>,
    pub translations: BTreeMap<String, I18nText>,
}

pub fn load_election(input_dir: &Path) -> ReportResult<LoadedElection> {
    let file: ElectionFile = read_json(&input_dir.join("election.json"))?;
    let results_dir = input_dir.join(RESULTS_DIR);
    let statuses: Vec<ContestStatusJson> = read_json(&results_dir.join(CONTEST_STATUS_FILE))?;
    let mut tables: Vec<TsvTable> = Vec::with_capacity(file.election.contests.len());
    for contest in &file.election.contests {
        tables.push(tsv::read_table(
            &results_dir.join(contest_results_file(&contest.id)),
        )?);
    }
    info!(
        "Loaded {} result tables from {}",
        tables.len(),
        results_dir.display()
    );
    build_election(file, &statuses, tables)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ReportResult<T> {
    let path_str = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningInputSnafu {
        path: path_str.clone(),
    })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu { path: path_str })
}

/// Resolves the parsed inputs into the model. `tables` carries one totals
/// table per contest, in contest order.
pub fn build_election(
    file: ElectionFile,
    statuses: &[ContestStatusJson],
    tables: Vec<TsvTable>,
) -> ReportResult<LoadedElection> {
    let stats_by_id: BTreeMap<&str, &ResultStatTypeJson> = file
        .result_stat_types
        .iter()
        .map(|s| (s.id.as_str(), s))
        .collect();
    let groups_by_id: BTreeMap<&str, &VotingGroupJson> = file
        .voting_groups
        .iter()
        .map(|g| (g.id.as_str(), g))
        .collect();
    let styles_by_id: BTreeMap<&str, &ResultStyleJson> = file
        .result_styles
        .iter()
        .map(|s| (s.id.as_str(), s))
        .collect();
    let headers_by_id: BTreeMap<&str, &HeaderJson> = file
        .election
        .headers
        .iter()
        .map(|h| (h.id.as_str(), h))
        .collect();
    let status_by_id: BTreeMap<&str, &ContestStatusJson> =
        statuses.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut contests: Vec<Contest> = Vec::with_capacity(file.election.contests.len());
    for (cj, table) in file.election.contests.iter().zip(tables.into_iter()) {
        let style = styles_by_id
            .get(cj.result_style.as_str())
            .context(UnknownIdSnafu {
                kind: "result style",
                id: cj.result_style.clone(),
                referrer: format!("contest {}", cj.id),
            })?;
        let stats: Vec<ResultStatType> = style
            .result_stat_type_ids
            .split_whitespace()
            .map(|id| {
                stats_by_id
                    .get(id)
                    .map(|s| ResultStatType {
                        id: s.id.clone(),
                        heading: I18nText(s.heading.clone()),
                        is_percent: s.is_percent,
                    })
                    .context(UnknownIdSnafu {
                        kind: "result stat type",
                        id,
                        referrer: format!("result style {}", style.id),
                    })
            })
            .collect::<ReportResult<_>>()?;
        let voting_groups: Vec<VotingGroup> = style
            .voting_group_ids
            .split_whitespace()
            .map(|id| {
                groups_by_id
                    .get(id)
                    .map(|g| VotingGroup {
                        id: g.id.clone(),
                        heading: I18nText(g.heading.clone()),
                    })
                    .context(UnknownIdSnafu {
                        kind: "voting group",
                        id,
                        referrer: format!("result style {}", style.id),
                    })
            })
            .collect::<ReportResult<_>>()?;
        let choices: Vec<Choice> = cj
            .choices
            .iter()
            .enumerate()
            .map(|(index, ch)| Choice {
                id: ch.id.clone(),
                title: I18nText(ch.ballot_title.clone()),
                is_winner: ch.is_winner,
                index,
            })
            .collect();
        let headers = header_chain(&cj.header_id, &headers_by_id, &cj.id)?;
        let status = status_by_id.get(cj.id.as_str());
        let rcv_rounds = status.and_then(|s| s.rcv_rounds).unwrap_or(0);
        let mapping = ResultsMapping::new(stats.len(), choices.len());
        let (rcv_totals, results) =
            parse_results_table(&table, mapping.width(), rcv_rounds, voting_groups.len())?;
        debug!(
            "contest {}: {} stats, {} choices, {} groups, {} RCV rounds",
            cj.id,
            stats.len(),
            choices.len(),
            voting_groups.len(),
            rcv_rounds
        );
        contests.push(Contest {
            id: cj.id.clone(),
            type_name: cj.type_name.clone(),
            title: I18nText(cj.ballot_title.clone()),
            subtitle: I18nText(cj.ballot_subtitle.clone()),
            vote_for_msg: cj.vote_for_msg.clone(),
            headers,
            total_precincts: status.and_then(|s| s.total_precincts),
            precincts_reporting: status.and_then(|s| s.precincts_reporting),
            is_rcv: style.is_rcv,
            choices,
            stats,
            voting_groups,
            mapping,
            results,
            rcv_totals,
        });
    }

    let election = Election {
        ballot_title: I18nText(file.election.ballot_title),
        date: file.election.election_date,
        election_area: I18nText(file.election.election_area),
        contests,
    };
    let translations = file
        .translations
        .into_iter()
        .map(|(key, raw)| (key, I18nText(raw)))
        .collect();
    Ok(LoadedElection {
        election,
        languages: file.languages,
        translations,
    })
}

/// Flattens the header chain of a contest, outermost header first.
fn header_chain(
    header_id: &Option<String>,
    headers_by_id: &BTreeMap<&str, &HeaderJson>,
    contest_id: &str,
) -> ReportResult<Vec<Header>> {
    let mut chain: Vec<Header> = Vec::new();
    let mut current = header_id.clone();
    while let Some(id) = current {
        let hj = headers_by_id.get(id.as_str()).context(UnknownIdSnafu {
            kind: "header",
            id: id.clone(),
            referrer: format!("contest {}", contest_id),
        })?;
        chain.push(Header {
            id: hj.id.clone(),
            title: I18nText(hj.ballot_title.clone()),
            level: hj.level,
        });
        if chain.len() > headers_by_id.len() {
            whatever!("Cycle in the header chain starting at {:?}", id);
        }
        current = hj.header_id.clone();
    }
    chain.reverse();
    Ok(chain)
}

/// Splits a totals table into the RCV round rows and the per-group rows.
///
/// RCV rows come first, labeled `RCV{n}` from the last round down to round 1,
/// with an empty cell for a choice already eliminated. The remaining rows
/// carry one totals row per voting group.
fn parse_results_table(
    table: &TsvTable,
    width: usize,
    rcv_rounds: u32,
    group_count: usize,
) -> ReportResult<(Vec<Vec<Option<i64>>>, Vec<Vec<i64>>)> {
    let expected_width = LABEL_COLUMNS + width;
    ensure!(
        table.header.len() == expected_width,
        MismatchedColumnsSnafu {
            path: table.path.clone(),
            lineno: 1usize,
            expected: expected_width,
            found: table.header.len(),
        }
    );

    let rcv_rounds = rcv_rounds as usize;
    ensure!(
        table.rows.len() == rcv_rounds + group_count,
        MismatchedGroupsSnafu {
            path: table.path.clone(),
            expected: rcv_rounds + group_count,
            found: table.rows.len(),
        }
    );

    let mut rcv_totals: Vec<Vec<Option<i64>>> = Vec::with_capacity(rcv_rounds);
    let mut results: Vec<Vec<i64>> = Vec::with_capacity(group_count);
    for (idx, row) in table.rows.iter().enumerate() {
        // The header occupies line 1.
        let lineno = idx + 2;
        ensure!(
            row.len() == expected_width,
            MismatchedColumnsSnafu {
                path: table.path.clone(),
                lineno,
                expected: expected_width,
                found: row.len(),
            }
        );
        if idx < rcv_rounds {
            // Rounds are listed last round first.
            let expected_label = format!("RCV{}", rcv_rounds - idx);
            ensure!(
                row[0] == expected_label,
                MismatchedRcvRowSnafu {
                    path: table.path.clone(),
                    lineno,
                    expected: expected_label,
                    found: row[0].clone(),
                }
            );
            let values: Vec<Option<i64>> = row[LABEL_COLUMNS..]
                .iter()
                .map(|cell| parse_optional_cell(cell, &table.path, lineno))
                .collect::<ReportResult<_>>()?;
            rcv_totals.push(values);
        } else {
            let values: Vec<i64> = row[LABEL_COLUMNS..]
                .iter()
                .map(|cell| parse_cell(cell, &table.path, lineno))
                .collect::<ReportResult<_>>()?;
            results.push(values);
        }
    }
    rcv_totals.reverse();
    Ok((rcv_totals, results))
}

fn parse_cell(cell: &str, path: &str, lineno: usize) -> ReportResult<i64> {
    cell.trim().parse::<i64>().ok().context(InvalidNumberSnafu {
        path,
        lineno,
        value: cell,
    })
}

fn parse_optional_cell(cell: &str, path: &str, lineno: usize) -> ReportResult<Option<i64>> {
    if cell.trim().is_empty() {
        Ok(None)
    } else {
        parse_cell(cell, path, lineno).map(Some)
    }
}
