use std::time::Duration;

use engine::content::dangling_references;
use engine::progress::PROGRESS_STORAGE_KEY;
use engine::{GamePhase, KeyValueStore, MemoryKeyValueStore, TracingAudio};

use super::bootstrap::LoopConfig;
use super::commands::CommandRegistry;
use super::content::load_game_content;
use super::loop_runner::ConsoleLoop;
use super::session::GameSession;

const FULL_VOYAGE: &str = "\
start
begin
click wooden-crate
click shop-door
click treasure-map
click shopkeeper
choose 1
click back-to-port
click ship-at-dock
choose sail-choice
click captain-decision
choose sail-now
begin
click ancient-cannon
click skeleton-crew
choose go-encounter
click ghost-challenge
choose fight-ghost
choose loop-until-defeated
click continue-to-act3
begin
click riddle-door
choose answer-15
click broken-mechanism
choose fix-42
click continue-to-act4
begin
click cave-mouth
click chest-array
choose chest-2
click complete-adventure
";

fn console_with(storage: MemoryKeyValueStore) -> ConsoleLoop {
    let config = LoopConfig {
        pace_output: false,
        ..LoopConfig::default()
    };
    let content = load_game_content().expect("embedded content parses");
    let session = GameSession::new(content, &config, storage, Box::new(TracingAudio));
    let commands = CommandRegistry::with_game_commands().expect("commands register");
    ConsoleLoop::new(session, commands, config)
}

fn console() -> ConsoleLoop {
    console_with(MemoryKeyValueStore::new())
}

fn play(console: &mut ConsoleLoop, script: &str) -> String {
    let mut out = Vec::new();
    console.run(script.as_bytes(), &mut out).expect("console io");
    String::from_utf8(out).expect("utf-8 output")
}

#[test]
fn embedded_content_is_consistent() {
    let content = load_game_content().expect("embedded content parses");
    assert_eq!(content.registry.len(), 12);
    assert_eq!(content.acts.len(), 4);
    assert_eq!(content.snippets.len(), 8);
    let dangling = dangling_references(&content.registry, &content.snippets, &content.acts);
    assert!(dangling.is_empty(), "{dangling:?}");
}

#[test]
fn legacy_handler_hotspot_is_migrated() {
    let content = load_game_content().expect("embedded content parses");
    let decision = content
        .registry
        .get("port-decision")
        .and_then(|scene| scene.hotspot("captain-decision"))
        .expect("captain-decision hotspot");
    assert!(!decision.action.is_empty());
}

#[test]
fn full_voyage_earns_every_badge() {
    let storage = MemoryKeyValueStore::new();
    let mut console = console_with(storage.clone());
    let output = play(&mut console, &format!("{FULL_VOYAGE}badges\n"));

    assert!(!output.contains("error:"), "{output}");
    assert_eq!(output.matches("Badge earned!").count(), 6, "{output}");
    assert!(output.contains("*** VOYAGE COMPLETE! ***"), "{output}");

    let session = console.session();
    assert!(session.all_badges_earned());
    assert_eq!(session.state().game_phase, GamePhase::Badges);
    assert_eq!(session.state().current_act, 4);
    assert_eq!(session.state().current_scene, "cave-treasure");
    assert!(session.state().has_item("map"));
    assert!(session.state().has_item("compass"));
    assert_eq!(session.state().player.gold, 5);
    assert!(session.state().flag_is_set("foundTreasureRoom"));

    assert_eq!(session.progress().xp(), 270);
    assert_eq!(session.progress().rank().title, "Captain");
    assert_eq!(
        storage.get(PROGRESS_STORAGE_KEY).expect("get").as_deref(),
        Some(r#"{"xp":270}"#)
    );
}

#[test]
fn reset_returns_to_title_and_keeps_experience() {
    let storage = MemoryKeyValueStore::new();
    let mut console = console_with(storage.clone());
    play(&mut console, &format!("{FULL_VOYAGE}reset\n"));

    let session = console.session();
    assert_eq!(session.state().game_phase, GamePhase::Title);
    assert!(session.earned_badges().is_empty());
    assert_eq!(session.progress().xp(), 270);

    let mut next_voyage = console_with(storage);
    play(&mut next_voyage, "");
    assert_eq!(next_voyage.session().progress().xp(), 270);
}

#[test]
fn commands_out_of_phase_are_refused() {
    let mut console = console();
    let output = play(&mut console, "click wooden-crate\nchoose 1\nhint\nstart\nstart\n");

    assert!(output.contains("error: that can't be done during the title phase"), "{output}");
    assert!(output.contains("error: there is no choice to make right now"), "{output}");
    assert!(output.contains("error: that can't be done during the act-intro phase"), "{output}");
    assert_eq!(console.session().state().game_phase, GamePhase::ActIntro);
}

#[test]
fn dialogue_is_typed_out_in_full() {
    let mut console = console();
    let output = play(&mut console, "start\nbegin\nclick wooden-crate\nnext\n");

    assert!(output.contains("Narrator: Ye search the old wooden crate with yer cutlass..."));
    assert!(output.contains("(2 more, type 'next')"), "{output}");
    assert!(output.contains("Narrator: Inside ye find 10 gold coins!"), "{output}");
    assert!(!console.session().dialogue().is_typing());
}

#[test]
fn searched_crate_disappears_from_the_scene() {
    let mut console = console();
    let output = play(&mut console, "start\nbegin\nclick wooden-crate\nlook\n");

    assert_eq!(output.matches("(wooden-crate)").count(), 1, "{output}");
    let (_, last_look) = output.rsplit_once("== Port Compile ==").expect("scene shown");
    assert!(!last_look.contains("(wooden-crate)"), "{output}");
    assert!(last_look.contains("(old-parrot)"), "{output}");
    assert_eq!(console.session().state().player.gold, 10);
}

#[test]
fn shopkeeper_without_gold_offers_nothing() {
    let mut console = console();
    let output = play(&mut console, "start\nbegin\nclick shop-door\nclick shopkeeper\nnext\n");

    assert!(output.contains("short on coin"), "{output}");
    assert!(!console.session().state().choices.active);
}

#[test]
fn choice_index_out_of_range_is_reported() {
    let mut console = console();
    let output = play(
        &mut console,
        "start\nbegin\nclick wooden-crate\nclick shop-door\nclick shopkeeper\nchoose 3\nchoose 2\n",
    );

    assert!(output.contains("error: no choice '3' is on offer"), "{output}");
    assert!(output.contains("Suit yerself"), "{output}");
    assert!(!console.session().state().has_item("compass"));
}

#[test]
fn hint_costs_experience() {
    let mut console = console();
    let output = play(
        &mut console,
        "start\nbegin\nclick wooden-crate\nhint\nhint\nhint\n",
    );

    assert!(output.contains("Hint: Search the wooden crate"), "{output}");
    assert!(output.contains("error: a hint costs 5 XP and ye only have 0"), "{output}");
    assert_eq!(console.session().progress().xp(), 0);
}

#[test]
fn animate_steps_through_interpolated_lines() {
    let mut console = console();
    let output = play(&mut console, "start\nbegin\nclick wooden-crate\nanimate 1 2\n");

    assert!(output.contains("> 1 | pirateGold = 10"), "{output}");
    assert!(output.contains("> 2 | pirateHealth = 100"), "{output}");
    assert_eq!(console.session().state().pseudocode.highlight_line, -1);
}

#[test]
fn code_requires_a_snippet_on_screen() {
    let mut console = console();
    let output = play(&mut console, "start\nbegin\nhighlight 1\ncode\n");

    assert!(output.contains("error: no pseudocode is on screen"), "{output}");
    assert!(output.contains("No pseudocode on screen."), "{output}");
}

#[test]
fn mute_preference_is_saved() {
    let storage = MemoryKeyValueStore::new();
    let mut console = console_with(storage.clone());
    let output = play(&mut console, "mute\n");

    assert!(output.contains("Sound muted."), "{output}");
    assert!(console.session().sound().is_muted());
    assert_eq!(
        storage.get("pirates-muted").expect("get").as_deref(),
        Some("true")
    );

    let reloaded = console_with(storage);
    assert!(reloaded.session().sound().is_muted());
}

#[test]
fn dump_prints_state_as_json() {
    let mut console = console();
    let output = play(&mut console, "start\ndump\nquit\nlook\n");

    assert!(output.contains("\"current_scene\": \"port-arrival\""), "{output}");
    assert!(output.contains("\"game_phase\": \"act-intro\""), "{output}");
    assert!(output.contains("Fair winds, Captain!"));
    assert_eq!(output.matches("Type 'begin' to set sail.").count(), 1, "{output}");
}

#[test]
fn new_snippet_stops_the_previous_highlight_sequence() {
    let config = LoopConfig::default();
    let content = load_game_content().expect("embedded content parses");
    let mut session = GameSession::new(
        content,
        &config,
        MemoryKeyValueStore::new(),
        Box::new(TracingAudio),
    );
    session.start_game().expect("start");
    session.begin_act().expect("begin");
    for hotspot in ["wooden-crate", "shop-door", "treasure-map", "back-to-port"] {
        session.click(hotspot).expect(hotspot);
    }

    session
        .animate(vec![0, 1, 2, 3], Some(Duration::from_secs(1)))
        .expect("animate");
    assert!(session.pseudocode().is_animating());

    session.click("ship-at-dock").expect("ship");
    assert_eq!(
        session.state().pseudocode.snippet_id.as_deref(),
        Some("if_else_sail")
    );
    assert!(!session.pseudocode().is_animating());

    session.update(Duration::from_secs(5));
    assert_eq!(session.state().pseudocode.highlight_line, -1);
}
