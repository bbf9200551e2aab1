use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyCode, KeyEvent,
        KeyEventKind, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, symbols::Marker, Terminal};

use shoal_config::ShoalConfig;
use shoal_core::{
    bus::EventBus,
    command::{self, CommandContext, CommandOutput, CommandRegistry},
    console::Console,
    event::Event,
    fps::{FpsCounter, FrameClock},
    geometry::Vec2,
    logging::{self, LogBuffer, LogEntry, LogOptions},
};
use shoal_fish::Shoal;
use shoal_ui::{
    aquarium::{render_aquarium, TankScale},
    console::render_console,
    layout::aquarium_layout,
    marker::detect_marker,
    shell::{render_shell, ShellView},
};

const HUD_HEIGHT: u16 = 6;
const CONSOLE_LINES: usize = 1000;
/// Where the pointer goes when it leaves the tank, so hovers end cleanly.
const OFF_TANK: Vec2 = Vec2::new(-1.0e6, -1.0e6);

struct App {
    shoal: Shoal,
    bus: EventBus,
    console: Console,
    commands: CommandRegistry,
    log_buffer: LogBuffer,
    clock: FrameClock,
    fps: FpsCounter,
    scale: TankScale,
    marker: Marker,
    tank: Rect,
    started_at: Instant,
}

impl App {
    fn new(config: &ShoalConfig, log_buffer: LogBuffer, screen: Rect) -> Result<Self> {
        let scale = TankScale {
            pixels_per_column: config.display.pixels_per_column as f64,
            pixels_per_row: config.display.pixels_per_row as f64,
        };
        let tank = aquarium_layout(screen, HUD_HEIGHT).tank;
        let bus = EventBus::new();
        let mut shoal = Shoal::new(config, scale.world_size(tank), bus.clone())?;
        let started_at = Instant::now();
        shoal.start(started_at)?;

        Ok(Self {
            shoal,
            bus,
            console: Console::new(CONSOLE_LINES),
            commands: command::builtin_registry(),
            log_buffer,
            clock: FrameClock::default(),
            fps: FpsCounter::default(),
            scale,
            marker: detect_marker(config.display.marker),
            tank,
            started_at,
        })
    }

    /// Drain new entries from the shared log buffer into the console.
    fn sync_logs(&mut self) {
        if let Ok(mut buf) = self.log_buffer.lock() {
            for entry in buf.drain(..) {
                self.console.push_log(entry);
            }
        }
    }

    /// Execute a console command. Returns `true` when the app should quit.
    fn dispatch_command(&mut self, input: &str) -> bool {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.console.push_log(LogEntry::info("console", format!("> {}", trimmed)));

        let mut ctx = CommandContext {
            console: &mut self.console,
            bus: &self.bus,
            roster: &self.shoal,
            fps: &self.fps,
            started_at: self.started_at,
        };
        match self.commands.execute(trimmed, &mut ctx) {
            CommandOutput::Lines(lines) => {
                for line in lines {
                    self.console.push_log(LogEntry::info("console", line));
                }
                false
            }
            CommandOutput::Quit => true,
        }
    }

    /// Returns `true` when the key asks to quit.
    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        if matches!(key.code, KeyCode::Char('`') | KeyCode::Char('~')) {
            self.console.toggle(now);
            return false;
        }
        if self.console.is_focused() {
            match key.code {
                KeyCode::Enter => {
                    let input = self.console.submit_input();
                    return self.dispatch_command(&input);
                }
                KeyCode::Backspace => self.console.backspace(),
                KeyCode::Left => self.console.cursor_left(),
                KeyCode::Right => self.console.cursor_right(),
                KeyCode::PageUp => self.console.scroll_up(10),
                KeyCode::PageDown => self.console.scroll_down(10),
                KeyCode::Esc => self.console.close(now),
                KeyCode::Char(c) => self.console.insert_char(c),
                _ => {}
            }
            return false;
        }
        match key.code {
            KeyCode::Char('q') => self.bus.publish(Event::Quit),
            KeyCode::Char('p') => {
                tracing::info!(fish = self.shoal.len(), "poking the whole school");
                self.shoal.poke_all();
            }
            _ => {}
        }
        false
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let point = self
            .scale
            .cell_to_world(self.tank, mouse.column, mouse.row)
            .unwrap_or(OFF_TANK);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                self.shoal.pointer_move(point);
            }
            MouseEventKind::Up(_) => {
                self.shoal.pointer_up(point);
            }
            _ => {}
        }
    }

    /// Keep the school's viewport in step with the tank pane.
    fn fit_tank(&mut self, tank: Rect) {
        if tank != self.tank {
            self.tank = tank;
            self.shoal.resize(self.scale.world_size(tank));
        }
    }

    fn hud(&self) -> (Vec<String>, Vec<String>) {
        let mut left: Vec<String> = self
            .shoal
            .state_counts()
            .into_iter()
            .map(|(state, count)| format!("{:<15}{}", state.name(), count))
            .collect();
        left.push(format!("{:<15}{}", "rushing", self.shoal.rushing_count()));

        let uptime = Instant::now().saturating_duration_since(self.started_at).as_secs();
        let world = self.shoal.viewport();
        let right = vec![
            format!("FPS      {:.1}", self.fps.fps()),
            format!("UPTIME   {:02}:{:02}:{:02}", uptime / 3600, (uptime % 3600) / 60, uptime % 60),
            format!("TANK     {:.0} x {:.0} px", world.x, world.y),
            format!("FISH     {}", self.shoal.len()),
        ];
        (left, right)
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn main() -> Result<()> {
    let config = ShoalConfig::load().context("failed to load configuration")?;
    let log_buffer = logging::init(&LogOptions {
        filter: config.logging.filter.clone(),
        directory: config.logging.directory.clone(),
        retention_days: config.logging.retention_days,
    })?;
    tracing::info!(fish = config.school.fish_count, "shoal starting up");

    let mut terminal = setup_terminal()?;
    let res = run(&mut terminal, &config, log_buffer);
    restore_terminal(terminal)?;
    if let Err(err) = &res {
        tracing::error!(error = %err, "shoal exited with an error");
    }
    res
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    config: &ShoalConfig,
    log_buffer: LogBuffer,
) -> Result<()> {
    let size = terminal.size()?;
    let screen = Rect::new(0, 0, size.width, size.height);
    let mut app = App::new(config, log_buffer, screen)?;
    let frame_budget = Duration::from_secs_f64(1.0 / config.display.frame_rate.max(1) as f64);

    loop {
        let frame_start = Instant::now();

        // ── Sync logs from tracing into console ──
        app.sync_logs();

        // ── Simulate ──
        let dt = app.clock.tick(frame_start);
        app.fps.record(frame_start);
        app.console.update(frame_start);
        let events = app.shoal.update(frame_start, dt)?;
        for ev in &events {
            match ev {
                Event::Quit => return Ok(()),
                Event::Resize { cols, rows } => {
                    tracing::debug!(cols, rows, "terminal resized");
                }
                _ => {}
            }
        }

        // ── Render ──
        let (hud_left, hud_right) = app.hud();
        let shapes = app.shoal.world_shapes();
        let title = format!("school of {}", app.shoal.len());
        let mut tank = app.tank;
        terminal.draw(|f| {
            let rects = aquarium_layout(f.area(), HUD_HEIGHT);
            tank = rects.tank;
            let view = ShellView {
                title: &title,
                status_line: "p poke | ` console | q quit",
                hud_left,
                hud_right,
            };
            render_shell(f, rects, view, |f, area| {
                render_aquarium(f, area, &shapes, app.scale, app.marker);
            });
            if app.console.is_visible() {
                render_console(f, f.area(), &app.console, app.fps.fps());
            }
        })?;
        app.fit_tank(tank);

        // ── Poll → Publish ──
        let mut timeout = frame_budget.saturating_sub(frame_start.elapsed());
        while event::poll(timeout)? {
            timeout = Duration::ZERO;
            match event::read()? {
                CEvent::Key(key) => {
                    if app.handle_key(key, Instant::now()) {
                        return Ok(());
                    }
                }
                CEvent::Mouse(mouse) => app.handle_mouse(mouse),
                CEvent::Resize(cols, rows) => app.bus.publish(Event::Resize { cols, rows }),
                _ => {}
            }
        }
    }
}
