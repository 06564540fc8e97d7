// Prompt templates for pick advice.
//
// The advisory prompt lists the user's roster, the slots still open, and a
// bounded set of eligible players with their provider projections. The
// model is asked to weigh the candidates; all filtering has already
// happened before the prompt is built.

use pickwise_core::config::LeagueConfig;
use pickwise_core::draft::roster::Roster;
use pickwise_core::projections::PlayerRecord;

use crate::client::ChatMessage;

// ---------------------------------------------------------------------------
// System prompt
// ---------------------------------------------------------------------------

/// Static strategy instructions for every advisory call.
pub fn system_prompt(league: &LeagueConfig) -> String {
    let roster = Roster::new(&league.roster);
    let shape = roster
        .groups
        .iter()
        .filter(|g| g.capacity > 0)
        .map(|g| format!("{} x{}", g.slot.display_str(), g.capacity))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a fantasy football snake draft advisor for \"{}\", a {}-team league.\n\
         \n\
         Roster: {}.\n\
         Projections come from several providers; the same player may be scored differently by each.\n\
         \n\
         For each request you will get my current roster, the slots I still need to fill, \
         and the players still available that fit those slots.\n\
         Answer with:\n\
         1. PICK: the single player I should take now, spelled exactly as listed\n\
         2. WHY: two or three sentences on value, positional scarcity, and roster fit\n\
         3. BACKUPS: two alternatives in order, in case the pick is gone\n\
         \n\
         Only recommend players from the AVAILABLE PLAYERS list. Be concise and direct.",
        league.name, league.num_teams, shape,
    )
}

// ---------------------------------------------------------------------------
// Advisory prompt
// ---------------------------------------------------------------------------

/// Build the user message for one advisory round.
pub fn build_advisory_prompt(roster: &Roster, candidates: &[&PlayerRecord]) -> String {
    let mut prompt = String::with_capacity(1024 + candidates.len() * 96);

    prompt.push_str("## MY ROSTER\n");
    prompt.push_str(&format_roster_for_prompt(roster));
    prompt.push_str(&format!(
        "{} of {} spots filled\n\n",
        roster.filled_count(),
        roster.total_capacity(),
    ));

    prompt.push_str("## NEEDED SLOTS\n");
    let needed = roster.needed_slots();
    if needed.is_empty() {
        prompt.push_str("  (roster is full)\n\n");
    } else {
        let list = needed
            .iter()
            .map(|s| s.display_str())
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!("  {}\n\n", list));
    }

    prompt.push_str("## AVAILABLE PLAYERS\n");
    prompt.push_str(&format_candidates(candidates));
    prompt.push('\n');

    prompt.push_str(
        "## WHAT SHOULD I PICK?\n\
         Recommend one player from the list above, with a short reason and two backups.",
    );

    prompt
}

/// Messages for one advisory round: the system prompt, the replayed
/// history, then this round's user prompt.
pub fn build_messages(
    league: &LeagueConfig,
    history: &AdviceHistory,
    roster: &Roster,
    candidates: &[&PlayerRecord],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.messages().len() + 2);
    messages.push(ChatMessage::system(system_prompt(league)));
    messages.extend_from_slice(history.messages());
    messages.push(ChatMessage::user(build_advisory_prompt(roster, candidates)));
    messages
}

// ---------------------------------------------------------------------------
// Conversation history
// ---------------------------------------------------------------------------

/// Earlier advisory rounds as user/assistant pairs, oldest first.
///
/// Only the most recent `max_rounds` rounds are kept.
#[derive(Debug, Clone, Default)]
pub struct AdviceHistory {
    max_rounds: usize,
    messages: Vec<ChatMessage>,
}

impl AdviceHistory {
    pub fn new(max_rounds: usize) -> Self {
        AdviceHistory {
            max_rounds,
            messages: Vec::with_capacity(max_rounds * 2),
        }
    }

    /// Remember a completed round, dropping the oldest past the cap.
    pub fn record(&mut self, prompt: ChatMessage, reply: &str) {
        if self.max_rounds == 0 {
            return;
        }
        self.messages.push(prompt);
        self.messages.push(ChatMessage::assistant(reply));

        let keep = self.max_rounds * 2;
        if self.messages.len() > keep {
            let excess = self.messages.len() - keep;
            self.messages.drain(..excess);
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn rounds(&self) -> usize {
        self.messages.len() / 2
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format the user's roster, one line per spot.
///
/// Open spots show `[EMPTY]`; bench players past the nominal capacity are
/// marked as overflow.
pub fn format_roster_for_prompt(roster: &Roster) -> String {
    let mut s = String::new();

    for group in &roster.groups {
        let lines = group.capacity.max(group.players.len());
        for i in 0..lines {
            let status = match group.players.get(i) {
                Some(name) if i >= group.capacity => format!("{} (overflow)", name),
                Some(name) => name.clone(),
                None => "[EMPTY]".to_string(),
            };
            s.push_str(&format!("  {:>7}: {}\n", group.slot.display_str(), status));
        }
    }

    s
}

/// Format candidates as a numbered list with their projection stats.
pub fn format_candidates(candidates: &[&PlayerRecord]) -> String {
    if candidates.is_empty() {
        return "  (no eligible players)\n".to_string();
    }

    let mut s = String::new();
    for (i, player) in candidates.iter().enumerate() {
        s.push_str(&format!(
            "  {:>2}. {} ({}, {})",
            i + 1,
            player.name,
            player.position,
            player.source,
        ));
        for (metric, value) in &player.stats {
            s.push_str(&format!(" {}={}", metric, format_stat(*value)));
        }
        s.push('\n');
    }
    s
}

/// Whole numbers print without a fraction; everything else to one decimal.
fn format_stat(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
