//! Derived views over the raw ranked-choice round totals of a contest.
//!
//! The round totals are inputs: the elimination and transfer computation
//! happens upstream. This module only reshapes the per-round grid into
//! per-candidate sequences, final-round placements and a display ordering.

use log::debug;

use crate::model::{Choice, Contest, ModelError};

/// One candidate's standing in one round.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct CandidateRound {
    pub round_num: u32,
    pub votes: i64,
    /// Votes gained (or lost, at elimination) since the previous round.
    pub transfer: i64,
    /// Continuing ballots in this round, the denominator for [percent].
    pub continuing: i64,
    /// Whether this is a placeholder round after the candidate has been
    /// eliminated. It is kept so the negative transfer at elimination can be
    /// displayed.
    pub after_eliminated: bool,
}

impl CandidateRound {
    /// The candidate's share of the continuing ballots, in percent.
    pub fn percent(&self) -> f64 {
        if self.continuing == 0 {
            return 0.0;
        }
        100.0 * (self.votes as f64) / (self.continuing as f64)
    }
}

/// A view over a contest's RCV totals, keyed by the stat that carries the
/// continuing-ballots count for each round.
#[derive(Debug)]
pub struct RcvResults<'a> {
    contest: &'a Contest,
    continuing_col: usize,
}

impl<'a> RcvResults<'a> {
    pub fn new(contest: &'a Contest, continuing_stat_id: &str) -> Result<RcvResults<'a>, ModelError> {
        let pos = contest
            .stat_position(continuing_stat_id)
            .ok_or_else(|| ModelError::UnknownStat(continuing_stat_id.to_string()))?;
        Ok(RcvResults {
            contest,
            continuing_col: contest.mapping.stat_index(pos),
        })
    }

    pub fn num_rounds(&self) -> u32 {
        self.contest.num_rcv_rounds()
    }

    fn round_totals(&self, round_num: u32) -> Result<&[Option<i64>], ModelError> {
        self.contest
            .rcv_totals
            .get((round_num as usize).wrapping_sub(1))
            .map(|row| row.as_slice())
            .ok_or(ModelError::RoundOutOfRange(round_num))
    }

    /// The continuing-ballots total for a round.
    pub fn continuing_total(&self, round_num: u32) -> Result<i64, ModelError> {
        let totals = self.round_totals(round_num)?;
        Ok(totals[self.continuing_col].unwrap_or(0))
    }

    /// A candidate's vote total in a round. `None` once the candidate has
    /// been eliminated.
    pub fn candidate_total(
        &self,
        choice: &Choice,
        round_num: u32,
    ) -> Result<Option<i64>, ModelError> {
        let totals = self.round_totals(round_num)?;
        Ok(totals[self.contest.mapping.choice_index(choice)])
    }

    /// The rounds for one candidate, starting with round 1 and ending either
    /// with the last round or with the placeholder round that records the
    /// negative transfer at elimination.
    pub fn candidate_rounds(&self, choice: &Choice) -> Vec<CandidateRound> {
        let col = self.contest.mapping.choice_index(choice);
        let mut rounds = Vec::new();
        let mut prev_total = 0i64;
        for (idx, totals) in self.contest.rcv_totals.iter().enumerate() {
            let round_num = (idx + 1) as u32;
            let (votes, after_eliminated) = match totals[col] {
                Some(t) => (t, false),
                None => (0, true),
            };
            let continuing = totals[self.continuing_col].unwrap_or(0);
            rounds.push(CandidateRound {
                round_num,
                votes,
                transfer: votes - prev_total,
                continuing,
                after_eliminated,
            });
            if after_eliminated {
                break;
            }
            prev_total = votes;
        }
        rounds
    }

    /// The round at which the candidate's final status was determined: the
    /// last round they were still counted in. A candidate who was never
    /// counted in any round has no final round.
    pub fn final_round(&self, choice: &Choice) -> Option<CandidateRound> {
        let rounds = self.candidate_rounds(choice);
        match rounds.as_slice() {
            [] => None,
            [only] if only.after_eliminated => None,
            // Skip the post-elimination placeholder when there is one.
            [.., before_last, last] if last.after_eliminated => Some(*before_last),
            [.., last] => Some(*last),
        }
    }

    /// Candidates paired with their final round, sorted for display: highest
    /// final round first, then highest vote total, then lowest id.
    pub fn summary(&self) -> Vec<(&'a Choice, CandidateRound)> {
        let mut pairs: Vec<(&Choice, CandidateRound)> = self
            .contest
            .choices
            .iter()
            .filter_map(|c| self.final_round(c).map(|r| (c, r)))
            .collect();
        pairs.sort_by(|(a, ra), (b, rb)| {
            rb.round_num
                .cmp(&ra.round_num)
                .then(rb.votes.cmp(&ra.votes))
                .then(a.id.cmp(&b.id))
        });
        debug!(
            "rcv summary for contest {}: {:?}",
            self.contest.id,
            pairs
                .iter()
                .map(|(c, r)| (c.id.as_str(), r.round_num, r.votes))
                .collect::<Vec<_>>()
        );
        pairs
    }

    /// The display order of the candidates, starting with the winner.
    pub fn candidate_order(&self) -> Vec<&'a Choice> {
        self.summary().iter().map(|(c, _)| *c).collect()
    }
}
