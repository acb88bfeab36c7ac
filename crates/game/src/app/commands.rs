use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChoiceRef {
    /// 1-based position in the panel, as printed.
    Index(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    Look,
    Status,
    Inventory,
    Badges,
    Rank,
    Start,
    Begin,
    Click { hotspot: String },
    Choose { choice: ChoiceRef },
    Next,
    Code,
    Highlight { line: i32 },
    Animate { lines: Vec<i32> },
    Hint,
    Mute,
    Reset,
    Dump,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandParseError {
    reason: String,
    usage: String,
}

impl CommandParseError {
    fn new(reason: impl Into<String>, usage: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            usage: usage.into(),
        }
    }
}

type ParseFn = dyn Fn(&[String]) -> Result<Command, CommandParseError>;

struct CommandSpec {
    name: String,
    help: String,
    arg_schema: String,
    parse: Box<ParseFn>,
}

/// Player commands, looked up case-insensitively. Help lists them in
/// registration order.
pub(crate) struct CommandRegistry {
    specs: Vec<CommandSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl CommandRegistry {
    pub(crate) fn new() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub(crate) fn with_game_commands() -> Result<Self, String> {
        let mut registry = Self::new();
        registry.register("help", "List commands", "", |args| {
            no_args(args, "help", Command::Help)
        })?;
        registry.register("look", "Describe the current screen", "", |args| {
            no_args(args, "look", Command::Look)
        })?;
        registry.register("status", "Show health, gold and reputation", "", |args| {
            no_args(args, "status", Command::Status)
        })?;
        registry.register("inventory", "List what ye carry", "", |args| {
            no_args(args, "inventory", Command::Inventory)
        })?;
        registry.register("badges", "Show earned and locked badges", "", |args| {
            no_args(args, "badges", Command::Badges)
        })?;
        registry.register("rank", "Show experience and pirate rank", "", |args| {
            no_args(args, "rank", Command::Rank)
        })?;
        registry.register("start", "Start a new voyage", "", |args| {
            no_args(args, "start", Command::Start)
        })?;
        registry.register("begin", "Begin the current act", "", |args| {
            no_args(args, "begin", Command::Begin)
        })?;
        registry.register(
            "click",
            "Interact with a hotspot",
            "<hotspot_id:string>",
            parse_click_command,
        )?;
        registry.register(
            "choose",
            "Pick an option from the open choice",
            "<option:number|id>",
            parse_choose_command,
        )?;
        registry.register("next", "Skip or advance the dialogue", "", |args| {
            no_args(args, "next", Command::Next)
        })?;
        registry.register("code", "Show the pseudocode panel", "", |args| {
            no_args(args, "code", Command::Code)
        })?;
        registry.register(
            "highlight",
            "Highlight a pseudocode line",
            "<line:i32>",
            parse_highlight_command,
        )?;
        registry.register(
            "animate",
            "Step the highlight through lines",
            "<line:i32...>",
            parse_animate_command,
        )?;
        registry.register("hint", "Buy a hint for 5 XP", "", |args| {
            no_args(args, "hint", Command::Hint)
        })?;
        registry.register("mute", "Toggle sound", "", |args| {
            no_args(args, "mute", Command::Mute)
        })?;
        registry.register("reset", "Abandon the voyage and return to the title", "", |args| {
            no_args(args, "reset", Command::Reset)
        })?;
        registry.register("dump", "Print the game state as JSON", "", |args| {
            no_args(args, "dump", Command::Dump)
        })?;
        registry.register("quit", "Leave the game", "", |args| {
            no_args(args, "quit", Command::Quit)
        })?;
        Ok(registry)
    }

    pub(crate) fn register<F>(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        parse: F,
    ) -> Result<(), String>
    where
        F: Fn(&[String]) -> Result<Command, CommandParseError> + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("command name cannot be empty".to_string());
        }
        let lower = name.to_ascii_lowercase();
        if self.lookup_by_lower_name.contains_key(&lower) {
            return Err(format!("duplicate command registration: {name}"));
        }

        self.specs.push(CommandSpec {
            name,
            help: help.into(),
            arg_schema: arg_schema.into(),
            parse: Box::new(parse),
        });
        self.lookup_by_lower_name.insert(lower, self.specs.len() - 1);
        Ok(())
    }

    fn lookup(&self, input_name: &str) -> Option<&CommandSpec> {
        let lower = input_name.to_ascii_lowercase();
        let index = self.lookup_by_lower_name.get(&lower)?;
        self.specs.get(*index)
    }

    pub(crate) fn help_lines(&self) -> Vec<String> {
        self.specs
            .iter()
            .map(|spec| {
                if spec.arg_schema.is_empty() {
                    format!("{} - {}", spec.name, spec.help)
                } else {
                    format!("{} {} - {}", spec.name, spec.arg_schema, spec.help)
                }
            })
            .collect()
    }

    /// `Ok(None)` for blank input. Errors are ready to print.
    pub(crate) fn parse_line(&self, raw_line: &str) -> Result<Option<Command>, String> {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let tokens =
            tokenize_line(trimmed).map_err(|reason| format!("error: {reason}. usage: help"))?;
        let Some((command_name, args)) = tokens.split_first() else {
            return Ok(None);
        };
        let Some(spec) = self.lookup(command_name) else {
            return Err(format!("error: unknown command '{command_name}'. try: help"));
        };
        (spec.parse)(args)
            .map(Some)
            .map_err(|error| format!("error: {}. usage: {}", error.reason, error.usage))
    }
}

fn tokenize_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            _ => {
                current.push(ch);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn no_args(args: &[String], usage: &str, command: Command) -> Result<Command, CommandParseError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(CommandParseError::new("unexpected extra arguments", usage))
    }
}

fn parse_click_command(args: &[String]) -> Result<Command, CommandParseError> {
    let [hotspot] = args else {
        return Err(CommandParseError::new(
            "expected exactly one argument <hotspot_id>",
            "click <hotspot_id>",
        ));
    };
    Ok(Command::Click {
        hotspot: hotspot.clone(),
    })
}

fn parse_choose_command(args: &[String]) -> Result<Command, CommandParseError> {
    let [option] = args else {
        return Err(CommandParseError::new(
            "expected exactly one argument <option>",
            "choose <option>",
        ));
    };
    let choice = match option.parse::<usize>() {
        Ok(0) => {
            return Err(CommandParseError::new(
                "options are numbered from 1",
                "choose <option>",
            ));
        }
        Ok(index) => ChoiceRef::Index(index),
        Err(_) => ChoiceRef::Id(option.clone()),
    };
    Ok(Command::Choose { choice })
}

fn parse_highlight_command(args: &[String]) -> Result<Command, CommandParseError> {
    let [raw] = args else {
        return Err(CommandParseError::new(
            "expected exactly one argument <line>",
            "highlight <line>",
        ));
    };
    let line = parse_line_number(raw, "highlight <line>")?;
    Ok(Command::Highlight { line })
}

fn parse_animate_command(args: &[String]) -> Result<Command, CommandParseError> {
    if args.is_empty() {
        return Err(CommandParseError::new(
            "missing required argument <line...>",
            "animate <line...>",
        ));
    }
    let lines = args
        .iter()
        .map(|raw| parse_line_number(raw, "animate <line...>"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Command::Animate { lines })
}

fn parse_line_number(raw: &str, usage: &str) -> Result<i32, CommandParseError> {
    raw.parse::<i32>().map_err(|_| {
        CommandParseError::new(format!("invalid line '{raw}' (expected i32)"), usage)
    })
}
