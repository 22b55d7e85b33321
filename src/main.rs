use anyhow::Context;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use pacman_ga::ghost::GhostKind;
use pacman_ga::grid::{Content, Tile};
use pacman_ga::{GameConfig, Grid, Outcome, Pos, Session, DEFAULT_LAYOUT};
use std::io::{self, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

const CELL_W: usize = 2;
const SPARKLINE_W: usize = 40;

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Ghost,
    Wall,
    Empty,
    Pellet,
    Teleporter,
}

impl Glyph {
    fn text(self) -> &'static str {
        match self {
            Glyph::Player => "😃",
            Glyph::Ghost => "👻",
            Glyph::Wall => "██",
            Glyph::Empty => "  ",
            Glyph::Pellet => "· ",
            Glyph::Teleporter => "<>",
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = GameConfig::from_env();
    let grid = Grid::load(DEFAULT_LAYOUT).context("loading built-in maze")?;
    let mut session = Session::new(grid, &config).context("invalid game configuration")?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &mut session, &config);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result?;

    print_summary(&session);
    Ok(())
}

fn run(stdout: &mut Stdout, session: &mut Session, config: &GameConfig) -> io::Result<()> {
    let grid = session.grid();
    let mut renderer = Renderer::new(grid.width(), grid.height());
    let tick = Duration::from_millis(config.tick_ms);
    let frame_time = Duration::from_micros(1_000_000 / config.render_fps.max(1));
    let mut last_tick = Instant::now();
    let mut paused = false;

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        info!(ticks = session.ticks(), "quit by user");
                        return Ok(());
                    }
                    KeyCode::Char('p') => paused = !paused,
                    _ => {}
                }
            }
        }

        if !paused && last_tick.elapsed() >= tick {
            last_tick = Instant::now();
            if session.tick() == Outcome::Won {
                return render_game_over(stdout, session);
            }
        }
        render(stdout, session, &mut renderer, paused)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn render(stdout: &mut Stdout, session: &Session, renderer: &mut Renderer, paused: bool) -> io::Result<()> {
    let grid = session.grid();
    let needed_h = (grid.height() + 2) as u16;
    let needed_w = (grid.width() * CELL_W) as u16;

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }

    let history = session.fitness_history();
    let hud = format!(
        "Score: {}  Level: {}/{}  Pellets: {}  Gen: {}  Best: {}{}",
        session.overall_score(),
        session.level(),
        session.levels(),
        grid.remaining_pellets(),
        history.len(),
        history.best().map_or_else(|| "-".to_string(), |b| b.to_string()),
        if paused { "  [paused]" } else { "  (p pause, q quit)" }
    );
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let cell = cell_for(session, Pos::new(x, y));
            let idx = y * grid.width() + x;
            if renderer.needs_full || cell != renderer.last[idx] {
                renderer.last[idx] = cell;
                draw_cell(stdout, renderer, x, y, cell)?;
            }
        }
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn cell_for(session: &Session, pos: Pos) -> Cell {
    if pos == session.player() {
        return Cell {
            glyph: Glyph::Player,
            color: Color::Yellow,
        };
    }
    if let Some(ghost) = session.ghosts().iter().find(|g| g.pos() == pos) {
        return Cell {
            glyph: Glyph::Ghost,
            color: ghost_color(ghost.kind()),
        };
    }
    let grid = session.grid();
    match grid.tile(pos) {
        Some(Tile::Wall) | None => Cell {
            glyph: Glyph::Wall,
            color: Color::Blue,
        },
        Some(Tile::Teleporter) => Cell {
            glyph: Glyph::Teleporter,
            color: Color::Cyan,
        },
        Some(Tile::Floor) => match grid.content(pos) {
            Content::Pellet => Cell {
                glyph: Glyph::Pellet,
                color: Color::White,
            },
            Content::Empty => Cell {
                glyph: Glyph::Empty,
                color: Color::Reset,
            },
        },
    }
}

fn ghost_color(kind: GhostKind) -> Color {
    match kind {
        GhostKind::Blinky => Color::Red,
        GhostKind::Pinky => Color::Magenta,
        GhostKind::Inky => Color::Cyan,
        GhostKind::Clyde => Color::DarkYellow,
    }
}

fn draw_cell(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let text = cell.glyph.text();
    let pad = CELL_W.saturating_sub(UnicodeWidthStr::width(text));
    stdout.queue(MoveTo(
        renderer.origin_x + (x * CELL_W) as u16,
        renderer.origin_y + y as u16,
    ))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(format!("{text}{:pad$}", "")))?;
    stdout.queue(ResetColor)?;
    Ok(())
}

/// End-of-session report, shared by the final screen and stdout.
fn summary_lines(session: &Session) -> Vec<String> {
    let cleared = if session.is_finished() {
        session.levels()
    } else {
        session.level() - 1
    };
    let mut lines = vec![format!(
        "levels cleared: {}/{}  score: {}  ticks: {}  collisions: {}",
        cleared,
        session.levels(),
        session.overall_score(),
        session.ticks(),
        session.collisions()
    )];
    let history = session.fitness_history();
    if let (Some(best), Some(mean)) = (history.best(), history.mean()) {
        lines.push(format!(
            "generations: {}  best fitness: {}  mean best: {:.1}",
            history.len(),
            best,
            mean
        ));
        lines.push(history.sparkline(SPARKLINE_W));
    }
    lines
}

/// Replaces the maze with the session report and waits for `q`.
fn render_game_over(stdout: &mut Stdout, session: &Session) -> io::Result<()> {
    let mut lines = vec!["All levels cleared.".to_string()];
    lines.extend(summary_lines(session));
    lines.push("press q to quit".to_string());

    let (term_w, term_h) = terminal::size()?;
    let width = lines.iter().map(|l| UnicodeWidthStr::width(l.as_str())).max().unwrap_or(0) as u16;
    let left = term_w.saturating_sub(width) / 2;
    let top = term_h.saturating_sub(lines.len() as u16) / 2;
    stdout.queue(Clear(ClearType::All))?;
    for (row, line) in lines.iter().enumerate() {
        stdout.queue(MoveTo(left, top + row as u16))?;
        stdout.queue(SetForegroundColor(if row == 0 { Color::Yellow } else { Color::White }))?;
        stdout.queue(Print(line))?;
    }
    stdout.queue(ResetColor)?;
    stdout.flush()?;

    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                return Ok(());
            }
        }
    }
}

fn print_summary(session: &Session) {
    for line in summary_lines(session) {
        println!("{line}");
    }
}
