//! HTML rendering of election results.
//!
//! The renderer is a pure, single-pass transformation: it walks the election
//! object graph and emits page text. It never mutates the model and assumes
//! the loader already validated the grid shapes.

use log::debug;

use crate::format::{format_number, format_percent, format_signed, percent_of, Phrases};
use crate::model::{Choice, Contest, Election, Header, ModelError};
use crate::rcv::RcvResults;

/// Escapes text for inclusion in HTML element content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// File name of the detail page for a contest.
pub fn contest_detail_path(contest: &Contest) -> String {
    format!("results-detail-{}.html", contest.id)
}

/// File name of the round-by-round page for an RCV contest.
pub fn contest_rcv_path(contest: &Contest) -> String {
    format!("rcv-{}.html", contest.id)
}

/// Renders the pages of one election for one output language.
pub struct Renderer<'a> {
    pub election: &'a Election,
    pub phrases: &'a Phrases,
    /// Id of the stat carrying the continuing-ballots count per RCV round.
    pub continuing_stat_id: &'a str,
}

impl Renderer<'_> {
    fn rcv_results<'c>(&self, contest: &'c Contest) -> Result<RcvResults<'c>, ModelError> {
        RcvResults::new(contest, self.continuing_stat_id)
    }

    /// The election summary page: group headings, one block per contest.
    pub fn election_page(&self) -> Result<String, ModelError> {
        let title = self.phrases.text(&self.election.ballot_title);
        debug!("rendering election page: {}", title);
        let mut body = String::new();
        body.push_str(&format!(
            "<h1>{} &mdash; {}</h1>\n<p class=\"election-date\">{}</p>\n",
            escape(title),
            escape(self.phrases.text(&self.election.election_area)),
            escape(&self.election.date)
        ));

        // Emit a heading whenever the header chain changes between contests.
        let mut current: Vec<&str> = Vec::new();
        for contest in &self.election.contests {
            for (depth, header) in contest.headers.iter().enumerate() {
                if current.get(depth).copied() != Some(header.id.as_str()) {
                    current.truncate(depth);
                    current.push(&header.id);
                    body.push_str(&self.header_heading(header));
                }
            }
            current.truncate(contest.headers.len());
            body.push_str(&self.contest_block(contest)?);
        }
        Ok(page(title, &body))
    }

    /// The detail page of a contest: the full table plus cross-links.
    pub fn contest_detail_page(&self, contest: &Contest) -> Result<String, ModelError> {
        let title = self.phrases.text(&contest.title);
        let mut body = String::new();
        body.push_str(&self.contest_heading(contest, 1));
        body.push_str(&self.summary_table(contest));
        if contest.is_rcv {
            body.push_str(&format!(
                "<p><a href=\"{}\">{}</a></p>\n",
                contest_rcv_path(contest),
                escape(&self.phrases.tr("round_by_round"))
            ));
        }
        Ok(page(title, &body))
    }

    /// The round-by-round page of an RCV contest.
    pub fn contest_rcv_page(&self, contest: &Contest) -> Result<String, ModelError> {
        let title = self.phrases.text(&contest.title);
        let rcv = self.rcv_results(contest)?;
        let mut body = String::new();
        body.push_str(&self.contest_heading(contest, 1));
        body.push_str(&self.rcv_rounds_table(&rcv));
        body.push_str(&self.rcv_summary_table(&rcv));
        Ok(page(title, &body))
    }

    fn header_heading(&self, header: &Header) -> String {
        // Level 1 headers render as h2, level 2 as h3.
        let tag = if header.level <= 1 { "h2" } else { "h3" };
        format!(
            "<{tag} class=\"contest-header\">{}</{tag}>\n",
            escape(self.phrases.text(&header.title))
        )
    }

    /// One contest block on the summary page: heading, table, cross-links.
    fn contest_block(&self, contest: &Contest) -> Result<String, ModelError> {
        let mut out = String::new();
        out.push_str(&format!(
            "<div class=\"contest\" id=\"contest-{}\">\n",
            escape(&contest.id)
        ));
        out.push_str(&self.contest_heading(contest, 4));
        if contest.is_rcv {
            let rcv = self.rcv_results(contest)?;
            out.push_str(&self.rcv_summary_table(&rcv));
        } else {
            out.push_str(&self.summary_table(contest));
        }
        out.push_str(&format!(
            "<p><a href=\"{}\">{}</a>",
            contest_detail_path(contest),
            escape(&self.phrases.tr("detailed_results"))
        ));
        if contest.is_rcv {
            out.push_str(&format!(
                " &middot; <a href=\"{}\">{}</a>",
                contest_rcv_path(contest),
                escape(&self.phrases.tr("round_by_round"))
            ));
        }
        out.push_str("</p>\n</div>\n");
        Ok(out)
    }

    fn contest_heading(&self, contest: &Contest, level: u8) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "<h{level}>{}</h{level}>\n",
            escape(self.phrases.text(&contest.title))
        ));
        let subtitle = self.phrases.text(&contest.subtitle);
        if !subtitle.is_empty() {
            out.push_str(&format!(
                "<p class=\"contest-subtitle\">{}</p>\n",
                escape(subtitle)
            ));
        }
        if let Some(msg) = &contest.vote_for_msg {
            out.push_str(&format!("<p class=\"vote-for\">{}</p>\n", escape(msg)));
        }
        if let (Some(reporting), Some(total)) =
            (contest.precincts_reporting, contest.total_precincts)
        {
            out.push_str(&format!(
                "<p class=\"precincts\">{} of {} {}</p>\n",
                format_number(reporting as i64),
                format_number(total as i64),
                escape(&self.phrases.tr("precincts_reporting"))
            ));
        }
        out
    }

    /// The voting-group table: one column per voting group plus a share
    /// column, one row per choice, then one row per generic stat.
    fn summary_table(&self, contest: &Contest) -> String {
        let mut out = String::new();
        out.push_str("<table class=\"results\">\n<thead>\n<tr><th></th>");
        for group in &contest.voting_groups {
            out.push_str(&format!(
                "<th>{}</th>",
                escape(self.phrases.text(&group.heading))
            ));
        }
        out.push_str(&format!(
            "<th>{}</th></tr>\n</thead>\n<tbody>\n",
            escape(&self.phrases.tr("percent"))
        ));

        // The share column is computed against the first voting group, which
        // carries the overall totals.
        let total_votes = if contest.voting_groups.is_empty() {
            0
        } else {
            contest.total_choice_votes(0)
        };
        for choice in &contest.choices {
            out.push_str(&choice_row_open(choice));
            out.push_str(&format!(
                "<td>{}</td>",
                escape(self.phrases.text(&choice.title))
            ));
            for group_idx in 0..contest.voting_groups.len() {
                out.push_str(&format!(
                    "<td class=\"votes\">{}</td>",
                    format_number(contest.choice_votes(group_idx, choice))
                ));
            }
            let share = if contest.voting_groups.is_empty() {
                String::new()
            } else {
                percent_of(contest.choice_votes(0, choice), total_votes)
            };
            out.push_str(&format!("<td class=\"percent\">{}</td></tr>\n", share));
        }

        for (stat_pos, stat) in contest.stats.iter().enumerate() {
            out.push_str(&format!(
                "<tr class=\"stat\"><td>{}</td>",
                escape(self.phrases.text(&stat.heading))
            ));
            for group_idx in 0..contest.voting_groups.len() {
                let value = contest.stat_value(group_idx, stat_pos);
                let text = if stat.is_percent {
                    // Percent-valued stats are stored in hundredths.
                    format_percent(value as f64 / 100.0)
                } else {
                    format_number(value)
                };
                out.push_str(&format!("<td class=\"votes\">{}</td>", text));
            }
            out.push_str("<td class=\"percent\"></td></tr>\n");
        }
        out.push_str("</tbody>\n</table>\n");
        out
    }

    /// The per-round RCV table: a two-tier header with one Transfer/Votes/%
    /// column group per round, one row per candidate in display order.
    pub fn rcv_rounds_table(&self, rcv: &RcvResults<'_>) -> String {
        let num_rounds = rcv.num_rounds();
        let mut out = String::new();
        out.push_str("<table class=\"rcv-rounds\">\n<thead>\n<tr><th rowspan=\"2\">");
        out.push_str(&escape(&self.phrases.tr("candidate")));
        out.push_str("</th>");
        for round_num in 1..=num_rounds {
            out.push_str(&format!(
                "<th colspan=\"3\">{} {}</th>",
                escape(&self.phrases.tr("round")),
                round_num
            ));
        }
        out.push_str("</tr>\n<tr>");
        let transfer = escape(&self.phrases.tr("transfer"));
        let votes = escape(&self.phrases.tr("votes"));
        let percent = escape(&self.phrases.tr("percent"));
        for _ in 0..num_rounds {
            out.push_str(&format!(
                "<th>{}</th><th>{}</th><th>{}</th>",
                transfer, votes, percent
            ));
        }
        out.push_str("</tr>\n</thead>\n<tbody>\n");

        for choice in rcv.candidate_order() {
            out.push_str(&choice_row_open(choice));
            out.push_str(&format!(
                "<td>{}</td>",
                escape(self.phrases.text(&choice.title))
            ));
            let rounds = rcv.candidate_rounds(choice);
            for round in &rounds {
                if round.after_eliminated {
                    // Placeholder round: show the outgoing transfer without
                    // the explicit plus sign, and no percentage.
                    out.push_str(&format!(
                        "<td class=\"transfer eliminated\">{}</td>\
                         <td class=\"votes eliminated\">{}</td>\
                         <td class=\"percent eliminated\"></td>",
                        format_number(round.transfer),
                        format_number(round.votes)
                    ));
                } else {
                    out.push_str(&format!(
                        "<td class=\"transfer\">{}</td>\
                         <td class=\"votes\">{}</td>\
                         <td class=\"percent\">{}</td>",
                        format_signed(round.transfer),
                        format_number(round.votes),
                        format_percent(round.percent())
                    ));
                }
            }
            for _ in rounds.len()..num_rounds as usize {
                out.push_str(
                    "<td class=\"transfer eliminated\"></td>\
                     <td class=\"votes eliminated\"></td>\
                     <td class=\"percent eliminated\"></td>",
                );
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>\n");
        out
    }

    /// The condensed RCV table: the round and vote count at which each
    /// candidate's final status was determined.
    pub fn rcv_summary_table(&self, rcv: &RcvResults<'_>) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "<table class=\"rcv-summary\">\n<thead>\n\
             <tr><th>{}</th><th>{}</th><th>{}</th><th>{}</th></tr>\n\
             </thead>\n<tbody>\n",
            escape(&self.phrases.tr("candidate")),
            escape(&self.phrases.tr("final_round")),
            escape(&self.phrases.tr("votes")),
            escape(&self.phrases.tr("percent"))
        ));
        for (choice, final_round) in rcv.summary() {
            out.push_str(&choice_row_open(choice));
            out.push_str(&format!(
                "<td>{}</td><td class=\"round\">{}</td>\
                 <td class=\"votes\">{}</td><td class=\"percent\">{}</td></tr>\n",
                escape(self.phrases.text(&choice.title)),
                final_round.round_num,
                format_number(final_round.votes),
                format_percent(final_round.percent())
            ));
        }
        out.push_str("</tbody>\n</table>\n");
        out
    }
}

fn choice_row_open(choice: &Choice) -> String {
    if choice.is_winner {
        "<tr class=\"winning-choice\">".to_string()
    } else {
        "<tr>".to_string()
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{I18nText, ResultStatType, ResultsMapping, VotingGroup};
    use std::collections::BTreeMap;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    fn phrases() -> Phrases {
        Phrases::new("en", BTreeMap::new())
    }

    fn make_choice(id: &str, title: &str, is_winner: bool, index: usize) -> Choice {
        Choice {
            id: id.to_string(),
            title: I18nText::from_en(title),
            is_winner,
            index,
        }
    }

    fn make_stat(id: &str, heading: &str, is_percent: bool) -> ResultStatType {
        ResultStatType {
            id: id.to_string(),
            heading: I18nText::from_en(heading),
            is_percent,
        }
    }

    fn make_summary_contest() -> Contest {
        let choices = vec![
            make_choice("yes", "Yes", true, 0),
            make_choice("no", "No", false, 1),
        ];
        let stats = vec![
            make_stat("RSBal", "Ballots Cast", false),
            make_stat("RSTrn", "Turnout", true),
        ];
        let voting_groups = vec![
            VotingGroup {
                id: "TO".to_string(),
                heading: I18nText::from_en("Total"),
            },
            VotingGroup {
                id: "ED".to_string(),
                heading: I18nText::from_en("Election Day"),
            },
        ];
        Contest {
            id: "measure-a".to_string(),
            type_name: "measure".to_string(),
            title: I18nText::from_en("Measure A"),
            subtitle: I18nText::from_en("School Bonds"),
            vote_for_msg: Some("Vote Yes or No".to_string()),
            headers: Vec::new(),
            total_precincts: Some(450),
            precincts_reporting: Some(450),
            is_rcv: false,
            mapping: ResultsMapping::new(stats.len(), choices.len()),
            choices,
            stats,
            voting_groups,
            // Columns: ballots, turnout (hundredths of a percent), yes, no.
            results: vec![vec![1100, 5412, 600, 400], vec![500, 2500, 300, 200]],
            rcv_totals: Vec::new(),
        }
    }

    fn make_rcv_contest() -> Contest {
        let choices = vec![
            make_choice("100", "ALICE GOMEZ", false, 0),
            make_choice("101", "BOB CHIN", true, 1),
            make_choice("102", "CATHY SMITH", false, 2),
            make_choice("103", "DAVID WEST", false, 3),
        ];
        let stats = vec![
            make_stat("RSReg", "Registered", false),
            make_stat("RSCon", "Continuing", false),
        ];
        Contest {
            id: "mayor".to_string(),
            type_name: "office".to_string(),
            title: I18nText::from_en("Mayor"),
            subtitle: I18nText::default(),
            vote_for_msg: None,
            headers: Vec::new(),
            total_precincts: None,
            precincts_reporting: None,
            is_rcv: true,
            mapping: ResultsMapping::new(stats.len(), choices.len()),
            choices,
            stats,
            voting_groups: vec![VotingGroup {
                id: "TO".to_string(),
                heading: I18nText::from_en("Total"),
            }],
            results: vec![vec![10000, 2000, 600, 800, 400, 200]],
            rcv_totals: vec![
                vec![
                    Some(10000),
                    Some(2000),
                    Some(600),
                    Some(800),
                    Some(400),
                    Some(200),
                ],
                vec![Some(10000), Some(1900), Some(650), Some(820), Some(430), None],
                vec![Some(10000), Some(1850), None, Some(1120), Some(730), None],
            ],
        }
    }

    #[test]
    fn escaping() {
        assert_eq!(escape("A & B <i>\"q\"</i>"), "A &amp; B &lt;i&gt;&quot;q&quot;&lt;/i&gt;");
    }

    #[test]
    fn page_paths() {
        let contest = make_summary_contest();
        assert_eq!(contest_detail_path(&contest), "results-detail-measure-a.html");
        assert_eq!(contest_rcv_path(&contest), "rcv-measure-a.html");
    }

    #[test]
    fn summary_table_shape() {
        let contest = make_summary_contest();
        let election = Election {
            ballot_title: I18nText::from_en("General Election"),
            date: "2024-11-05".to_string(),
            election_area: I18nText::from_en("City and County"),
            contests: vec![contest],
        };
        let phrases = phrases();
        let renderer = Renderer {
            election: &election,
            phrases: &phrases,
            continuing_stat_id: "RSCon",
        };
        let table = renderer.summary_table(&election.contests[0]);

        // One row per choice, one per stat, plus the header row.
        assert_eq!(count(&table, "<tr"), 1 + 2 + 2);
        // One column heading per voting group plus the leading and share cells.
        assert!(table.contains("<th>Total</th><th>Election Day</th><th>%</th>"));
        // Winner row is marked, loser row is not.
        assert_eq!(count(&table, "<tr class=\"winning-choice\">"), 1);
        // Share of the first voting group: 600 of 1000.
        assert!(table.contains("<td class=\"percent\">60.00%</td>"));
        assert!(table.contains("<td class=\"percent\">40.00%</td>"));
        // Percent-valued stat rendered from hundredths.
        assert!(table.contains("54.12%"));
        // Plain stat with grouping.
        assert!(table.contains("1,100"));
    }

    #[test]
    fn rcv_rounds_table_shape() {
        let contest = make_rcv_contest();
        let election = Election {
            ballot_title: I18nText::from_en("General Election"),
            date: "2024-11-05".to_string(),
            election_area: I18nText::from_en("City and County"),
            contests: vec![contest],
        };
        let phrases = phrases();
        let renderer = Renderer {
            election: &election,
            phrases: &phrases,
            continuing_stat_id: "RSCon",
        };
        let rcv = RcvResults::new(&election.contests[0], "RSCon").unwrap();
        let table = renderer.rcv_rounds_table(&rcv);

        // One column group per round.
        assert_eq!(count(&table, "colspan=\"3\""), 3);
        // One row per candidate plus the two header rows.
        assert_eq!(count(&table, "<tr"), 4 + 2);
        // The winner leads the table.
        let bob = table.find("BOB CHIN").unwrap();
        let alice = table.find("ALICE GOMEZ").unwrap();
        assert!(bob < alice);
        // Alice's elimination round: no plus sign, no percentage.
        assert!(table.contains("<td class=\"transfer eliminated\">-650</td>"));
        assert!(table.contains("<td class=\"percent eliminated\"></td>"));
        // A live round keeps the explicit plus sign.
        assert!(table.contains("<td class=\"transfer\">+800</td>"));
        // David was eliminated entering round 2; round 3 renders as empty
        // eliminated cells.
        assert!(table.contains("<td class=\"transfer eliminated\"></td>"));
    }

    #[test]
    fn rcv_summary_table_shape() {
        let contest = make_rcv_contest();
        let election = Election {
            ballot_title: I18nText::from_en("General Election"),
            date: "2024-11-05".to_string(),
            election_area: I18nText::from_en("City and County"),
            contests: vec![contest],
        };
        let phrases = phrases();
        let renderer = Renderer {
            election: &election,
            phrases: &phrases,
            continuing_stat_id: "RSCon",
        };
        let rcv = RcvResults::new(&election.contests[0], "RSCon").unwrap();
        let table = renderer.rcv_summary_table(&rcv);

        assert_eq!(count(&table, "<tr"), 4 + 1);
        assert_eq!(count(&table, "winning-choice"), 1);
        // Bob's final round placement: round 3, 1,120 votes of 1,850.
        assert!(table.contains("<td class=\"round\">3</td>"));
        assert!(table.contains("1,120"));
        assert!(table.contains("60.54%"));
    }

    #[test]
    fn election_page_emits_headers_on_change() {
        let header_city = Header {
            id: "city".to_string(),
            title: I18nText::from_en("City Offices"),
            level: 1,
        };
        let header_district = Header {
            id: "district".to_string(),
            title: I18nText::from_en("District Offices"),
            level: 2,
        };
        let mut first = make_summary_contest();
        first.headers = vec![header_city.clone()];
        let mut second = make_rcv_contest();
        second.headers = vec![header_city.clone(), header_district];
        let mut third = make_summary_contest();
        third.id = "measure-b".to_string();
        third.headers = vec![header_city];

        let election = Election {
            ballot_title: I18nText::from_en("General Election"),
            date: "2024-11-05".to_string(),
            election_area: I18nText::from_en("City and County"),
            contests: vec![first, second, third],
        };
        let phrases = phrases();
        let renderer = Renderer {
            election: &election,
            phrases: &phrases,
            continuing_stat_id: "RSCon",
        };
        let html = renderer.election_page().unwrap();

        // The level-1 header is emitted once even though all three contests
        // share it; the level-2 header appears between them.
        assert_eq!(count(&html, "<h2 class=\"contest-header\">City Offices</h2>"), 1);
        assert_eq!(
            count(&html, "<h3 class=\"contest-header\">District Offices</h3>"),
            1
        );
        assert_eq!(count(&html, "<div class=\"contest\""), 3);
        // The RCV contest links to its round-by-round page.
        assert!(html.contains("rcv-mayor.html"));
        assert!(html.contains("results-detail-measure-a.html"));
    }

    #[test]
    fn detail_and_rcv_pages() {
        let contest = make_rcv_contest();
        let election = Election {
            ballot_title: I18nText::from_en("General Election"),
            date: "2024-11-05".to_string(),
            election_area: I18nText::from_en("City and County"),
            contests: vec![contest],
        };
        let phrases = phrases();
        let renderer = Renderer {
            election: &election,
            phrases: &phrases,
            continuing_stat_id: "RSCon",
        };
        let detail = renderer.contest_detail_page(&election.contests[0]).unwrap();
        assert!(detail.contains("<table class=\"results\">"));
        assert!(detail.contains("rcv-mayor.html"));

        let rcv_page = renderer.contest_rcv_page(&election.contests[0]).unwrap();
        assert!(rcv_page.contains("<table class=\"rcv-rounds\">"));
        assert!(rcv_page.contains("<table class=\"rcv-summary\">"));
        assert!(rcv_page.starts_with("<!DOCTYPE html>"));
    }
}
