use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use engine::pseudocode::DEFAULT_SEQUENCE_DELAY;
use engine::GamePhase;
use tracing::{debug, error, info};

use super::bootstrap::{AppWiring, LoopConfig};
use super::commands::{ChoiceRef, Command, CommandRegistry};
use super::render;
use super::session::{GameSession, Outcome, SessionError};

const PROMPT: &str = "> ";

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let mut console = ConsoleLoop::new(app.session, app.commands, app.config);
    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(err) = console.run(stdin.lock(), &mut stdout.lock()) {
        error!(error = %err, "console_io_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Reads one command per line and plays out its effects.
///
/// Wall time between commands drives the session timers. Typewriter text and
/// highlight sequences are played out in fixed steps right after the command
/// that started them, sleeping only when output is paced.
pub(crate) struct ConsoleLoop {
    session: GameSession,
    commands: CommandRegistry,
    config: LoopConfig,
}

impl ConsoleLoop {
    pub(crate) fn new(
        session: GameSession,
        commands: CommandRegistry,
        config: LoopConfig,
    ) -> Self {
        Self {
            session,
            commands,
            config,
        }
    }

    #[cfg(test)]
    pub(crate) fn session(&self) -> &GameSession {
        &self.session
    }

    pub(crate) fn run<R, W>(&mut self, mut input: R, out: &mut W) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
    {
        print_lines(out, render::look(&self.session))?;
        let mut last_input = Instant::now();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }

            let elapsed = clamp_frame_delta(last_input.elapsed(), self.config.max_frame_delta);
            self.session.update(elapsed);
            let flow = self.process_line(&line, out)?;
            last_input = Instant::now();
            if flow == Flow::Quit {
                break;
            }
        }
        info!("console_closed");
        Ok(())
    }

    fn process_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        match self.commands.parse_line(line) {
            Ok(Some(command)) => {
                debug!(command = ?command, "command_received");
                self.execute(command, out)
            }
            Ok(None) => Ok(Flow::Continue),
            Err(message) => {
                writeln!(out, "{message}")?;
                Ok(Flow::Continue)
            }
        }
    }

    fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<Flow> {
        let before_scene = self.session.state().current_scene.clone();
        let before_phase = self.session.state().game_phase;

        let result: Result<Option<Outcome>, SessionError> = match command {
            Command::Help => {
                print_lines(out, self.commands.help_lines())?;
                Ok(None)
            }
            Command::Look => {
                print_lines(out, render::look(&self.session))?;
                print_lines(out, render::dialogue(&self.session))?;
                print_lines(out, render::choices(&self.session))?;
                Ok(None)
            }
            Command::Status => {
                print_lines(out, render::status(&self.session))?;
                Ok(None)
            }
            Command::Inventory => {
                print_lines(out, render::inventory(&self.session))?;
                Ok(None)
            }
            Command::Badges => {
                self.session.show_badges();
                print_lines(out, render::badges(&self.session))?;
                Ok(None)
            }
            Command::Rank => {
                print_lines(out, render::rank(&self.session))?;
                Ok(None)
            }
            Command::Start => self.session.start_game().map(Some),
            Command::Begin => self.session.begin_act().map(Some),
            Command::Click { hotspot } => self.session.click(&hotspot).map(Some),
            Command::Choose { choice } => self.choose(&choice).map(Some),
            Command::Next => {
                self.session.next_dialogue();
                if self.session.state().dialogue.active {
                    self.play_dialogue(out)?;
                } else {
                    writeln!(out, "(the conversation is over)")?;
                }
                Ok(None)
            }
            Command::Code => {
                print_lines(out, render::code(&self.session))?;
                Ok(None)
            }
            Command::Highlight { line } => match self.session.highlight(line) {
                Ok(()) => {
                    print_lines(out, render::highlighted_line(&self.session))?;
                    Ok(None)
                }
                Err(err) => Err(err),
            },
            Command::Animate { lines } => match self.session.animate(lines, None) {
                Ok(()) => {
                    self.play_sequence(out)?;
                    Ok(None)
                }
                Err(err) => Err(err),
            },
            Command::Hint => match self.session.hint() {
                Ok(hint) => {
                    writeln!(out, "Hint: {hint}")?;
                    Ok(None)
                }
                Err(err) => Err(err),
            },
            Command::Mute => {
                let muted = self.session.toggle_mute();
                writeln!(out, "{}", if muted { "Sound muted." } else { "Sound on." })?;
                Ok(None)
            }
            Command::Reset => {
                self.session.reset();
                Ok(Some(Outcome::default()))
            }
            Command::Dump => {
                match serde_json::to_string_pretty(self.session.state()) {
                    Ok(json) => writeln!(out, "{json}")?,
                    Err(err) => writeln!(out, "error: failed to encode state: {err}")?,
                }
                Ok(None)
            }
            Command::Quit => {
                writeln!(out, "Fair winds, Captain!")?;
                return Ok(Flow::Quit);
            }
        };

        match result {
            Ok(Some(outcome)) => self.report(&outcome, &before_scene, before_phase, out)?,
            Ok(None) => {}
            Err(err) => writeln!(out, "error: {err}")?,
        }
        Ok(Flow::Continue)
    }

    /// Options are printed from 1.
    fn choose(&mut self, choice: &ChoiceRef) -> Result<Outcome, SessionError> {
        let option_id = match choice {
            ChoiceRef::Id(id) => id.clone(),
            ChoiceRef::Index(index) => {
                let choices = &self.session.state().choices;
                if !choices.active {
                    return Err(SessionError::NoChoices);
                }
                match index.checked_sub(1).and_then(|at| choices.options.get(at)) {
                    Some(option) => option.id.clone(),
                    None => return Err(SessionError::UnknownChoice(index.to_string())),
                }
            }
        };
        self.session.choose(&option_id)
    }

    fn report<W: Write>(
        &mut self,
        outcome: &Outcome,
        before_scene: &str,
        before_phase: GamePhase,
        out: &mut W,
    ) -> io::Result<()> {
        self.play_dialogue(out)?;
        print_lines(out, render::outcome(outcome))?;
        let state = self.session.state();
        if state.current_scene != before_scene || state.game_phase != before_phase {
            print_lines(out, render::look(&self.session))?;
        }
        print_lines(out, render::choices(&self.session))
    }

    /// Types the active line out one tick at a time.
    fn play_dialogue<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let dialogue = &self.session.state().dialogue;
        if !dialogue.active {
            return Ok(());
        }
        write!(out, "{}: ", dialogue.speaker)?;

        let mut shown = 0;
        loop {
            let fresh: String = self
                .session
                .dialogue()
                .displayed_text()
                .chars()
                .skip(shown)
                .collect();
            shown += fresh.chars().count();
            write!(out, "{fresh}")?;
            out.flush()?;

            if !self.session.dialogue().is_typing() {
                break;
            }
            let tick = self.session.dialogue().speed();
            if self.config.pace_output {
                thread::sleep(tick);
            }
            self.session.update(tick);
        }
        writeln!(out)?;
        print_lines(out, render::queued_lines(&self.session))
    }

    fn play_sequence<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        loop {
            print_lines(out, render::highlighted_line(&self.session))?;
            out.flush()?;
            if !self.session.pseudocode().is_animating() {
                return Ok(());
            }
            if self.config.pace_output {
                thread::sleep(DEFAULT_SEQUENCE_DELAY);
            }
            self.session.update(DEFAULT_SEQUENCE_DELAY);
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn print_lines<W: Write>(out: &mut W, lines: impl IntoIterator<Item = String>) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
