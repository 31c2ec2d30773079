//! Passage voting: progress broadcasts, round resolution, tie-break and unanimity streak.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use rand::Rng;

use crate::config::room::{
    SERVER_VOTER_LABEL, UNANIMOUS_ACHIEVEMENT_KEY, UNANIMOUS_ACHIEVEMENT_LABEL,
    UNANIMOUS_STREAK_TARGET,
};
use crate::server::messages::{ServerEvent, VoteResult, VotersByChoice};
use super::machine::RoomMachine;
use super::outbound::Outbound;
use super::types::{Achievement, ChoiceId, ConnectionId, Player};

/// Picks the winner among tied choices.
pub trait TieBreaker: Send {
    /// Index in `0..candidates`. `candidates` is at least 2.
    fn pick(&mut self, candidates: usize) -> usize;
}

/// Uniform random tie-break.
#[derive(Debug, Default)]
pub struct RandomTieBreaker;

impl TieBreaker for RandomTieBreaker {
    fn pick(&mut self, candidates: usize) -> usize {
        rand::rng().random_range(0..candidates.max(1))
    }
}

/// Live votes of the open round, grouped by choice.
struct Tally {
    counts: BTreeMap<ChoiceId, u32>,
    voters: VotersByChoice,
    cast: usize,
    total: usize,
}

impl Tally {
    fn collect(live: &[&Player], votes: &HashMap<ConnectionId, ChoiceId>) -> Self {
        let mut counts = BTreeMap::new();
        let mut voters = VotersByChoice::new();
        let mut cast = 0;
        for player in live {
            if let Some(choice) = votes.get(&player.id) {
                *counts.entry(choice.clone()).or_insert(0) += 1;
                voters
                    .entry(choice.clone())
                    .or_insert_with(Vec::new)
                    .push(player.username.clone());
                cast += 1;
            }
        }
        Self {
            counts,
            voters,
            cast,
            total: live.len(),
        }
    }

    fn is_complete(&self) -> bool {
        self.total > 0 && self.cast == self.total
    }

    /// Every choice sharing the highest count, in choice order.
    fn top_choices(&self) -> Vec<ChoiceId> {
        let Some(max) = self.counts.values().copied().max() else {
            return Vec::new();
        };
        self.counts
            .iter()
            .filter(|(_, count)| **count == max)
            .map(|(choice, _)| choice.clone())
            .collect()
    }
}

impl RoomMachine {
    /// Record a vote, publish progress and resolve the round once every live player voted.
    pub fn submit_vote(&mut self, voter: ConnectionId, choice: ChoiceId) -> Vec<Outbound> {
        let mut out: Vec<Outbound> = self.prune_and_announce().into_iter().collect();
        if !self.room.is_member(&voter) {
            debug!("[Room {}] Vote from non-member {} dropped", self.room.code, voter);
            return out;
        }
        debug!("[Room {}] {} voted {}", self.room.code, voter, choice);
        self.room.votes.insert(voter, choice);

        let tally = self.tally();
        out.push(self.broadcast(ServerEvent::VoteUpdate {
            votes: tally.cast,
            total: tally.total,
            voters_by_choice: tally.voters,
        }));
        out.extend(self.try_resolve());
        out
    }

    fn tally(&self) -> Tally {
        let live: Vec<&Player> = self
            .room
            .players
            .iter()
            .filter(|p| self.registry.is_live(&p.id))
            .collect();
        Tally::collect(&live, &self.room.votes)
    }

    /// Close the round if every live player has voted.
    pub(super) fn try_resolve(&mut self) -> Option<Outbound> {
        let tally = self.tally();
        if !tally.is_complete() {
            return None;
        }
        let unanimous = tally.counts.len() == 1;

        let (choice, counts, voters) = if tally.total == 1 {
            // Lone player: their vote decides, no tie is possible.
            let choice = tally.counts.keys().next()?.clone();
            (choice, tally.counts, tally.voters)
        } else {
            self.decide(tally)?
        };

        self.room.unanimous_streak = if unanimous {
            self.room.unanimous_streak.saturating_add(1)
        } else {
            0
        };
        let achievement = (self.room.unanimous_streak >= UNANIMOUS_STREAK_TARGET).then(|| Achievement {
            key: UNANIMOUS_ACHIEVEMENT_KEY.to_string(),
            label: UNANIMOUS_ACHIEVEMENT_LABEL.to_string(),
        });

        self.room.votes.clear();
        self.room.current_passage += 1;
        info!(
            "[Room {}] Round resolved: {} (passage {}, streak {})",
            self.room.code, choice, self.room.current_passage, self.room.unanimous_streak
        );

        Some(self.broadcast(ServerEvent::VoteResult(VoteResult {
            next_passage: choice.clone(),
            choice,
            vote_counts: counts,
            voters_by_choice: voters,
            achievement,
        })))
    }

    /// Majority winner, or a server-picked one among the tied choices.
    ///
    /// The server's pick shows up as an extra vote from `SERVER_VOTER_LABEL`.
    fn decide(&mut self, tally: Tally) -> Option<(ChoiceId, BTreeMap<ChoiceId, u32>, VotersByChoice)> {
        let top = tally.top_choices();
        let Tally {
            mut counts,
            mut voters,
            ..
        } = tally;

        let choice = match top.as_slice() {
            [] => return None,
            [only] => only.clone(),
            tied => {
                let index = self.tie_breaker.pick(tied.len()).min(tied.len() - 1);
                let winner = tied[index].clone();
                *counts.entry(winner.clone()).or_insert(0) += 1;
                voters
                    .entry(winner.clone())
                    .or_insert_with(Vec::new)
                    .push(SERVER_VOTER_LABEL.to_string());
                info!(
                    "[Room {}] Tie between {:?} broken by server vote for {}",
                    self.room.code, tied, winner
                );
                winner
            }
        };
        Some((choice, counts, voters))
    }
}
