// Interactive draft loop.
//
// States: AwaitingFirstPickDecision -> RoundInProgress (repeats) -> Terminated.
// Each round records the players other teams took, asks the completion
// service for advice, and records the user's own pick.

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};

use pickwise_core::config::{AdvisorConfig, LeagueConfig};
use pickwise_core::draft::{DraftPick, DraftSession};
use pickwise_llm::prompt::{build_messages, format_roster_for_prompt, AdviceHistory};
use pickwise_llm::ChatCompletion;

use crate::console::Console;

/// Literal token that ends the session when entered as the taken batch.
pub const EXIT_TOKEN: &str = "exit";

const FIRST_PICK_PROMPT: &str = "Do you have the first pick? (y/n)";
const TAKEN_PROMPT: &str = "Players taken since your last pick (comma-separated, or 'exit'):";
const PICK_PROMPT: &str = "Which player did you pick?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    AwaitingFirstPickDecision,
    RoundInProgress,
    Terminated,
}

/// One line of opponents' picks, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakenBatch {
    Exit,
    Names(Vec<String>),
}

/// Split a comma-separated line into trimmed names.
///
/// The batch is an exit request if any entry is exactly `exit`
/// (case-sensitive). Blank entries are dropped. Names sharing a line with
/// `exit` are not recorded as taken.
pub fn parse_taken_batch(line: &str) -> TakenBatch {
    let names: Vec<String> = line
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();

    if names.iter().any(|n| n == EXIT_TOKEN) {
        TakenBatch::Exit
    } else {
        TakenBatch::Names(names)
    }
}

/// Whether a first-pick answer means yes.
fn is_yes(answer: &str) -> bool {
    answer.trim_start().starts_with(['y', 'Y'])
}

enum RoundOutcome {
    Picked(DraftPick),
    InputClosed,
}

/// Drives one draft session over a console and a completion service.
pub struct DraftLoop<C, L> {
    session: DraftSession,
    console: C,
    completion: L,
    league: LeagueConfig,
    candidate_limit: usize,
    history: AdviceHistory,
    state: LoopState,
}

impl<C: Console, L: ChatCompletion> DraftLoop<C, L> {
    pub fn new(
        session: DraftSession,
        console: C,
        completion: L,
        league: LeagueConfig,
        advisor: &AdvisorConfig,
    ) -> Self {
        Self {
            session,
            console,
            completion,
            league,
            candidate_limit: advisor.candidate_limit,
            history: AdviceHistory::new(advisor.history_rounds),
            state: LoopState::AwaitingFirstPickDecision,
        }
    }

    /// Run until the user exits or input closes, then print the final
    /// roster and pick log. Returns the finished session.
    ///
    /// Completion failures end the session with an error.
    pub async fn run(mut self) -> anyhow::Result<DraftSession> {
        info!("draft loop started");

        while self.state != LoopState::Terminated {
            self.state = self.step().await?;
        }

        self.print_summary()?;
        info!(picks = self.session.picks().len(), "draft loop finished");
        Ok(self.session)
    }

    async fn step(&mut self) -> anyhow::Result<LoopState> {
        match self.state {
            LoopState::AwaitingFirstPickDecision => {
                let Some(answer) = self.console.prompt(FIRST_PICK_PROMPT).await? else {
                    return Ok(LoopState::Terminated);
                };
                if is_yes(&answer) {
                    info!("user holds the first pick");
                    if let RoundOutcome::InputClosed = self.advise_and_pick().await? {
                        return Ok(LoopState::Terminated);
                    }
                }
                Ok(LoopState::RoundInProgress)
            }
            LoopState::RoundInProgress => {
                let Some(line) = self.console.prompt(TAKEN_PROMPT).await? else {
                    return Ok(LoopState::Terminated);
                };
                match parse_taken_batch(&line) {
                    TakenBatch::Exit => {
                        info!("exit requested");
                        Ok(LoopState::Terminated)
                    }
                    TakenBatch::Names(names) => {
                        self.session.record_taken(&names);
                        match self.advise_and_pick().await? {
                            RoundOutcome::Picked(pick) => {
                                info!(pick = pick.pick_number, "round complete");
                                Ok(LoopState::RoundInProgress)
                            }
                            RoundOutcome::InputClosed => Ok(LoopState::Terminated),
                        }
                    }
                }
            }
            LoopState::Terminated => Ok(LoopState::Terminated),
        }
    }

    /// Ask for advice, show it, then record the user's pick.
    async fn advise_and_pick(&mut self) -> anyhow::Result<RoundOutcome> {
        let candidates = self.session.candidates(self.candidate_limit);
        if candidates.is_empty() {
            warn!("no eligible candidates for this round");
        }
        let mut messages =
            build_messages(&self.league, &self.history, self.session.roster(), &candidates);
        info!(
            candidates = candidates.len(),
            history = self.history.rounds(),
            "requesting pick advice"
        );

        self.console.heading("Advice")?;

        let (tx, mut rx) = mpsc::channel::<String>(64);
        let console = &mut self.console;
        let request = self.completion.complete(&messages, tx);
        let drain = async {
            let mut streamed = false;
            while let Some(fragment) = rx.recv().await {
                console.stream_fragment(&fragment)?;
                streamed = true;
            }
            Ok::<bool, anyhow::Error>(streamed)
        };
        let (reply, streamed) = tokio::join!(request, drain);
        let reply = reply.context("completion request failed")?;
        let streamed = streamed?;

        if let Some(prompt) = messages.pop() {
            self.history.record(prompt, &reply);
        }

        if streamed {
            self.console.say("")?;
        } else {
            self.console.say(&reply)?;
        }

        loop {
            let Some(name) = self.console.prompt(PICK_PROMPT).await? else {
                return Ok(RoundOutcome::InputClosed);
            };
            if name.trim().is_empty() {
                continue;
            }
            match self.session.pick_player(&name) {
                Ok(pick) => {
                    self.console.say(&format!(
                        "Drafted {} ({}) into {}.",
                        pick.player_name, pick.position, pick.slot
                    ))?;
                    return Ok(RoundOutcome::Picked(pick));
                }
                Err(e) => {
                    self.console
                        .warn(&format!("{e}. Check the spelling and try again."))?;
                }
            }
        }
    }

    fn print_summary(&mut self) -> anyhow::Result<()> {
        self.console.heading("Final roster")?;
        let roster = format_roster_for_prompt(self.session.roster());
        self.console.say(roster.trim_end())?;
        let overflow = self.session.roster().bench_overflow();
        if overflow > 0 {
            self.console
                .say(&format!("  {overflow} bench player(s) past capacity"))?;
        }

        self.console.heading("Your picks")?;
        if self.session.picks().is_empty() {
            self.console.say("  (none)")?;
        }
        let lines: Vec<String> = self
            .session
            .picks()
            .iter()
            .map(|p| {
                format!(
                    "  {:>2}. {} ({}) -> {} at {}",
                    p.pick_number,
                    p.player_name,
                    p.position,
                    p.slot,
                    p.picked_at.format("%H:%M:%S")
                )
            })
            .collect();
        for line in lines {
            self.console.say(&line)?;
        }
        Ok(())
    }
}
