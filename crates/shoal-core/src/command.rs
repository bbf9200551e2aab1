use std::collections::HashMap;
use std::time::Instant;

use crate::bus::EventBus;
use crate::console::Console;
use crate::event::Event;
use crate::fps::FpsCounter;

/// Output from a command execution.
#[derive(Debug, PartialEq)]
pub enum CommandOutput {
    /// Lines to display in the console.
    Lines(Vec<String>),
    /// Signal that the app should quit.
    Quit,
}

/// Read-only view of the school for console commands.
pub trait Roster {
    fn fish_count(&self) -> usize;
    /// One-line summary of a fish, `None` for an unknown id.
    fn describe(&self, fish_id: usize) -> Option<String>;
}

/// Context available to commands during execution.
pub struct CommandContext<'a> {
    pub console: &'a mut Console,
    pub bus: &'a EventBus,
    pub roster: &'a dyn Roster,
    pub fps: &'a FpsCounter,
    pub started_at: Instant,
}

/// A console command.
pub trait Command {
    fn name(&self) -> &str;
    fn aliases(&self) -> &[&str] {
        &[]
    }
    fn description(&self) -> &str;
    fn usage(&self) -> &str {
        self.name()
    }
    fn execute(&self, args: &[&str], ctx: &mut CommandContext) -> CommandOutput;
}

const HELP_NAMES: [&str; 2] = ["help", "?"];

/// Registry of console commands. `help` is answered by the registry
/// itself since it needs the full command table.
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
    lookup: HashMap<String, usize>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn register(&mut self, cmd: Box<dyn Command>) {
        let idx = self.commands.len();
        self.lookup.insert(cmd.name().to_string(), idx);
        for alias in cmd.aliases() {
            self.lookup.insert(alias.to_string(), idx);
        }
        self.commands.push(cmd);
    }

    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandOutput {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return CommandOutput::Lines(vec![]);
        };

        if HELP_NAMES.contains(&name) {
            return CommandOutput::Lines(self.help_lines(args.first().copied()));
        }

        match self.lookup.get(name) {
            Some(&idx) => self.commands[idx].execute(args, ctx),
            None => CommandOutput::Lines(vec![format!(
                "unknown command: '{}'. Type 'help' for available commands.",
                name
            )]),
        }
    }

    pub fn commands(&self) -> &[Box<dyn Command>] {
        &self.commands
    }

    fn help_lines(&self, topic: Option<&str>) -> Vec<String> {
        let Some(topic) = topic else {
            let mut lines = vec!["  help [command]  List commands or show specific help".to_string()];
            lines.extend(
                self.commands
                    .iter()
                    .map(|cmd| format!("  {:<15} {}", cmd.usage(), cmd.description())),
            );
            return lines;
        };
        match self.lookup.get(topic) {
            Some(&idx) => {
                let cmd = &self.commands[idx];
                let mut lines = vec![format!("usage: {}", cmd.usage()), format!("  {}", cmd.description())];
                if !cmd.aliases().is_empty() {
                    lines.push(format!("  aliases: {}", cmd.aliases().join(", ")));
                }
                lines
            }
            None if HELP_NAMES.contains(&topic) => vec!["usage: help [command]".into()],
            None => vec![format!("no such command: '{}'", topic)],
        }
    }
}

// ── Built-in commands ──

pub struct ClearCommand;

impl Command for ClearCommand {
    fn name(&self) -> &str {
        "clear"
    }
    fn aliases(&self) -> &[&str] {
        &["cls"]
    }
    fn description(&self) -> &str {
        "Clear console log"
    }

    fn execute(&self, _args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        ctx.console.clear_logs();
        CommandOutput::Lines(vec![])
    }
}

pub struct FishCommand;

impl Command for FishCommand {
    fn name(&self) -> &str {
        "fish"
    }
    fn aliases(&self) -> &[&str] {
        &["ls"]
    }
    fn description(&self) -> &str {
        "List fish, or describe one"
    }
    fn usage(&self) -> &str {
        "fish [id]"
    }

    fn execute(&self, args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        if let Some(arg) = args.first() {
            let line = match arg.parse::<usize>() {
                Ok(id) => ctx
                    .roster
                    .describe(id)
                    .unwrap_or_else(|| format!("error: no fish with id {}", id)),
                Err(_) => format!("error: '{}' is not a fish id", arg),
            };
            return CommandOutput::Lines(vec![line]);
        }
        let lines = (0..ctx.roster.fish_count())
            .filter_map(|id| ctx.roster.describe(id))
            .collect();
        CommandOutput::Lines(lines)
    }
}

pub struct PokeCommand;

impl Command for PokeCommand {
    fn name(&self) -> &str {
        "poke"
    }
    fn description(&self) -> &str {
        "Startle a fish into a rush"
    }
    fn usage(&self) -> &str {
        "poke <id|all>"
    }

    fn execute(&self, args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        let Some(&target) = args.first() else {
            return CommandOutput::Lines(vec!["usage: poke <id|all>".into()]);
        };
        let count = ctx.roster.fish_count();
        if target == "all" {
            for fish_id in 0..count {
                ctx.bus.publish(Event::FishPoke { fish_id });
            }
            return CommandOutput::Lines(vec![format!("Poked {} fish", count)]);
        }
        match target.parse::<usize>() {
            Ok(fish_id) if fish_id < count => {
                ctx.bus.publish(Event::FishPoke { fish_id });
                CommandOutput::Lines(vec![format!("Poked fish {}", fish_id)])
            }
            Ok(fish_id) => CommandOutput::Lines(vec![format!("error: no fish with id {}", fish_id)]),
            Err(_) => CommandOutput::Lines(vec!["usage: poke <id|all>".into()]),
        }
    }
}

pub struct QuitCommand;

impl Command for QuitCommand {
    fn name(&self) -> &str {
        "quit"
    }
    fn aliases(&self) -> &[&str] {
        &["exit", "q"]
    }
    fn description(&self) -> &str {
        "Exit shoal"
    }

    fn execute(&self, _args: &[&str], _ctx: &mut CommandContext) -> CommandOutput {
        CommandOutput::Quit
    }
}

pub struct UptimeCommand;

impl Command for UptimeCommand {
    fn name(&self) -> &str {
        "uptime"
    }
    fn description(&self) -> &str {
        "Show runtime uptime"
    }

    fn execute(&self, _args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        let secs = ctx.started_at.elapsed().as_secs();
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let s = secs % 60;
        CommandOutput::Lines(vec![format!("Uptime: {:02}:{:02}:{:02}", hours, mins, s)])
    }
}

pub struct FpsCommand;

impl Command for FpsCommand {
    fn name(&self) -> &str {
        "fps"
    }
    fn aliases(&self) -> &[&str] {
        &["tps"]
    }
    fn description(&self) -> &str {
        "Show frames-per-second"
    }

    fn execute(&self, _args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        CommandOutput::Lines(vec![format!("FPS: {:.1}", ctx.fps.fps())])
    }
}

/// Create a CommandRegistry pre-loaded with all built-in commands.
pub fn builtin_registry() -> CommandRegistry {
    let mut reg = CommandRegistry::new();
    reg.register(Box::new(ClearCommand));
    reg.register(Box::new(FishCommand));
    reg.register(Box::new(PokeCommand));
    reg.register(Box::new(FpsCommand));
    reg.register(Box::new(UptimeCommand));
    reg.register(Box::new(QuitCommand));
    reg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogEntry;

    struct FakeRoster(usize);

    impl Roster for FakeRoster {
        fn fish_count(&self) -> usize {
            self.0
        }
        fn describe(&self, fish_id: usize) -> Option<String> {
            (fish_id < self.0).then(|| format!("#{} idle", fish_id))
        }
    }

    struct Parts {
        console: Console,
        bus: EventBus,
        roster: FakeRoster,
        fps: FpsCounter,
        started_at: Instant,
    }

    fn make_parts() -> Parts {
        Parts {
            console: Console::default(),
            bus: EventBus::new(),
            roster: FakeRoster(3),
            fps: FpsCounter::default(),
            started_at: Instant::now(),
        }
    }

    fn run(parts: &mut Parts, input: &str) -> CommandOutput {
        let reg = builtin_registry();
        let mut ctx = CommandContext {
            console: &mut parts.console,
            bus: &parts.bus,
            roster: &parts.roster,
            fps: &parts.fps,
            started_at: parts.started_at,
        };
        reg.execute(input, &mut ctx)
    }

    fn lines(output: CommandOutput) -> Vec<String> {
        match output {
            CommandOutput::Lines(lines) => lines,
            CommandOutput::Quit => panic!("expected Lines"),
        }
    }

    #[test]
    fn empty_input_returns_empty() {
        let mut parts = make_parts();
        assert!(lines(run(&mut parts, "   ")).is_empty());
    }

    #[test]
    fn unknown_command_returns_error() {
        let mut parts = make_parts();
        let out = lines(run(&mut parts, "swim"));
        assert!(out[0].contains("unknown command: 'swim'"));
    }

    #[test]
    fn help_lists_every_command() {
        let mut parts = make_parts();
        let out = lines(run(&mut parts, "help"));
        assert_eq!(out.len(), builtin_registry().commands().len() + 1);
        assert!(out.iter().any(|l| l.contains("poke <id|all>")));
        assert_eq!(lines(run(&mut parts, "?")), out);
    }

    #[test]
    fn help_for_one_command() {
        let mut parts = make_parts();
        let out = lines(run(&mut parts, "help ls"));
        assert_eq!(out[0], "usage: fish [id]");
        assert!(out[2].contains("ls"));

        let out = lines(run(&mut parts, "help nope"));
        assert!(out[0].contains("no such command"));
    }

    #[test]
    fn clear_command_clears_console() {
        let mut parts = make_parts();
        parts.console.push_log(LogEntry::info("test", "hello"));
        run(&mut parts, "cls");
        assert!(parts.console.log_lines().is_empty());
    }

    #[test]
    fn fish_lists_roster() {
        let mut parts = make_parts();
        let out = lines(run(&mut parts, "fish"));
        assert_eq!(out, vec!["#0 idle", "#1 idle", "#2 idle"]);
    }

    #[test]
    fn fish_with_id() {
        let mut parts = make_parts();
        assert_eq!(lines(run(&mut parts, "ls 1")), vec!["#1 idle"]);
        assert!(lines(run(&mut parts, "fish 9"))[0].contains("no fish"));
        assert!(lines(run(&mut parts, "fish x"))[0].contains("not a fish id"));
    }

    #[test]
    fn poke_publishes_one_event() {
        let mut parts = make_parts();
        let out = lines(run(&mut parts, "poke 2"));
        assert_eq!(out, vec!["Poked fish 2"]);
        assert_eq!(parts.bus.dispatch(), vec![Event::FishPoke { fish_id: 2 }]);
    }

    #[test]
    fn poke_all_publishes_per_fish() {
        let mut parts = make_parts();
        run(&mut parts, "poke all");
        assert_eq!(parts.bus.dispatch().len(), 3);
    }

    #[test]
    fn poke_rejects_bad_targets() {
        let mut parts = make_parts();
        assert!(lines(run(&mut parts, "poke"))[0].starts_with("usage"));
        assert!(lines(run(&mut parts, "poke 7"))[0].contains("no fish"));
        assert!(lines(run(&mut parts, "poke many"))[0].starts_with("usage"));
        assert!(!parts.bus.has_pending());
    }

    #[test]
    fn quit_and_aliases() {
        let mut parts = make_parts();
        for name in ["quit", "exit", "q"] {
            assert_eq!(run(&mut parts, name), CommandOutput::Quit);
        }
    }

    #[test]
    fn uptime_command() {
        let mut parts = make_parts();
        assert!(lines(run(&mut parts, "uptime"))[0].starts_with("Uptime: 00:00:"));
    }

    #[test]
    fn fps_and_alias() {
        let mut parts = make_parts();
        assert_eq!(lines(run(&mut parts, "fps")), vec!["FPS: 0.0"]);
        assert_eq!(lines(run(&mut parts, "tps")), vec!["FPS: 0.0"]);
    }
}
