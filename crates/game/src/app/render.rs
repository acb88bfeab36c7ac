//! Plain-text views of the session. Everything returns lines so the loop can
//! decide where they go.

use engine::badges::BADGE_COUNT;
use engine::state::STAT_MAX;
use engine::{BadgeId, GamePhase};

use super::session::{GameSession, Outcome};

const PROGRESS_BAR_WIDTH: usize = 20;

pub(crate) fn look(session: &GameSession) -> Vec<String> {
    match session.state().game_phase {
        GamePhase::Title => title_screen(),
        GamePhase::ActIntro => act_intro(session),
        GamePhase::Playing => scene(session),
        GamePhase::Recap => recap(session),
        GamePhase::Badges => badges(session),
    }
}

fn title_screen() -> Vec<String> {
    vec![
        "~~~ PIRATES OF THE CODERIBBEAN ~~~".to_string(),
        "Learn to code on the high seas, matey!".to_string(),
        "Type 'start' to begin yer voyage.".to_string(),
    ]
}

fn act_intro(session: &GameSession) -> Vec<String> {
    let act_id = session.state().current_act;
    let mut lines = Vec::new();
    match session.acts().get(act_id) {
        Some(act) => {
            lines.push(format!("=== Act {}: {} ===", act.id, act.title));
            lines.push(act.subtitle.clone());
            lines.push(act.description.clone());
            lines.push(format!("Concepts: {}", act.concepts.join(", ")));
        }
        None => lines.push(format!("=== Act {act_id} ===")),
    }
    lines.push("Type 'begin' to set sail.".to_string());
    lines
}

fn scene(session: &GameSession) -> Vec<String> {
    let view = session.current_scene();
    let mut lines = vec![format!("== {} ==", view.placeholder_label())];
    if view.hotspots.is_empty() {
        lines.push("Nothing here catches yer eye.".to_string());
    }
    for hotspot in &view.hotspots {
        lines.push(format!("  {} {} ({})", hotspot.icon, hotspot.label, hotspot.id));
    }
    if session.state().pseudocode.visible {
        lines.push("[pseudocode on screen, type 'code' to read it]".to_string());
    }
    lines
}

/// The active line in full, without the typewriter.
pub(crate) fn dialogue(session: &GameSession) -> Vec<String> {
    let dialogue = &session.state().dialogue;
    if !dialogue.active {
        return Vec::new();
    }
    let mut lines = vec![format!("{}: {}", dialogue.speaker, dialogue.text)];
    lines.extend(queued_lines(session));
    lines
}

pub(crate) fn queued_lines(session: &GameSession) -> Option<String> {
    let queued = session.state().dialogue.queue.len();
    (queued > 0).then(|| format!("  ({queued} more, type 'next')"))
}

pub(crate) fn choices(session: &GameSession) -> Vec<String> {
    let choices = &session.state().choices;
    if !choices.active {
        return Vec::new();
    }
    let mut lines = vec!["Choose:".to_string()];
    for (index, option) in choices.options.iter().enumerate() {
        lines.push(format!("  {}. {} ({})", index + 1, option.text, option.id));
    }
    lines
}

fn recap(session: &GameSession) -> Vec<String> {
    let earned = session.earned_badges().len();
    let rank = session.progress().rank();
    let mut lines = vec![
        "*** VOYAGE COMPLETE! ***".to_string(),
        format!("Badges earned: {earned}/{BADGE_COUNT}"),
        format!(
            "Final rank: {} {} ({} XP)",
            rank.emoji,
            rank.title,
            session.progress().xp()
        ),
    ];
    if session.all_badges_earned() {
        lines.push("Every concept mastered. Ye are a true Code Pirate!".to_string());
    }
    lines.push("Type 'badges' to admire yer collection, or 'reset' to sail again.".to_string());
    lines
}

pub(crate) fn badges(session: &GameSession) -> Vec<String> {
    let earned = session.earned_badges();
    let mut lines = vec![format!("Badges ({}/{BADGE_COUNT})", earned.len())];
    for badge in earned {
        lines.push(format!(
            "  {} {} [{}] {}",
            badge.icon, badge.name, badge.concept, badge.description
        ));
    }
    for badge in session.locked_badges() {
        lines.push(format!("  \u{1F512} {} [{}] locked", badge.name, badge.concept));
    }
    lines
}

pub(crate) fn status(session: &GameSession) -> Vec<String> {
    let state = session.state();
    let player = &state.player;
    let mut lines = vec![
        format!(
            "{} | Health {}/{STAT_MAX} | Gold {} | Reputation {}/{STAT_MAX}",
            player.name, player.health, player.gold, player.reputation
        ),
        format!(
            "Act {} | Scene {} | Phase {}",
            state.current_act, state.current_scene, state.game_phase
        ),
    ];
    if let Some(badge) = session.recent_badge() {
        lines.push(format!("Newest badge: {} {}", badge.icon, badge.name));
    }
    if session.sound().is_muted() {
        lines.push("Sound: muted".to_string());
    }
    lines
}

pub(crate) fn inventory(session: &GameSession) -> Vec<String> {
    let inventory = &session.state().inventory;
    if inventory.is_empty() {
        return vec!["Yer pockets are empty.".to_string()];
    }
    let items: Vec<&str> = inventory.iter().map(String::as_str).collect();
    vec![format!("Inventory: {}", items.join(", "))]
}

pub(crate) fn rank(session: &GameSession) -> Vec<String> {
    let progress = session.progress();
    let rank = progress.rank();
    let mut lines = vec![format!("{} {} ({} XP)", rank.emoji, rank.title, progress.xp())];
    match progress.next_rank() {
        Some(next) => {
            lines.push(format!(
                "{} {} XP to {}",
                progress_bar(progress.xp_progress()),
                progress.xp_to_next(),
                next.title
            ));
        }
        None => lines.push("Top rank reached!".to_string()),
    }
    lines
}

fn progress_bar(percent: f64) -> String {
    let share = percent.clamp(0.0, 100.0) / 100.0;
    let filled = (share * PROGRESS_BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(PROGRESS_BAR_WIDTH - filled))
}

pub(crate) fn code(session: &GameSession) -> Vec<String> {
    let state = session.state();
    if !state.pseudocode.visible {
        return vec!["No pseudocode on screen.".to_string()];
    }
    let Some(snippet) = session.pseudocode().current_snippet(state) else {
        return vec!["(the parchment is blank)".to_string()];
    };
    let mut lines = vec![format!("--- {} [{}] ---", snippet.title, snippet.concept)];
    let highlighted = state.pseudocode.highlight_line;
    for (index, line) in session
        .pseudocode()
        .rendered_lines(state)
        .into_iter()
        .enumerate()
    {
        let marker = if usize::try_from(highlighted).ok() == Some(index) {
            '>'
        } else {
            ' '
        };
        lines.push(format!("{marker}{index:>2} | {line}"));
    }
    lines
}

pub(crate) fn highlighted_line(session: &GameSession) -> Option<String> {
    let state = session.state();
    let index = usize::try_from(state.pseudocode.highlight_line).ok()?;
    let line = session.pseudocode().rendered_lines(state).into_iter().nth(index)?;
    Some(format!(">{index:>2} | {line}"))
}

pub(crate) fn outcome(outcome: &Outcome) -> Vec<String> {
    let mut lines = Vec::new();
    if outcome.xp_gained > 0 {
        lines.push(format!("+{} XP", outcome.xp_gained));
    }
    for id in &outcome.new_badges {
        lines.push(badge_award(*id));
    }
    lines
}

fn badge_award(id: BadgeId) -> String {
    let badge = id.badge();
    format!("Badge earned! {} {} ({})", badge.icon, badge.name, badge.concept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(50.0), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(250.0), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn outcome_lists_xp_then_badges() {
        let outcome = Outcome {
            new_badges: vec![BadgeId::Variables],
            xp_gained: 10,
        };
        let lines = super::outcome(&outcome);
        assert_eq!(lines[0], "+10 XP");
        assert!(lines[1].contains("Variable Voyager"), "{}", lines[1]);
    }

    #[test]
    fn empty_outcome_prints_nothing() {
        assert!(super::outcome(&Outcome::default()).is_empty());
    }
}
