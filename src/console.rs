use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue, terminal,
};
use lifers::{
    Brush, Cell, Engine, RunState, SPEED_RANGE, StatsRecorder, Subscription, screen_to_cell,
};
use std::{
    cell::{Cell as Flag, RefCell},
    io::{self, Write},
    rc::Rc,
    time::{Duration, Instant},
};
use tracing::debug;

/// How long to wait for input when nothing is scheduled.
const IDLE_POLL: Duration = Duration::from_millis(250);

pub enum ConsoleCommand {
    Exit,
    Handled,
}

/// Terminal front end: draws the visible part of the grid, hosts the input
/// layer and drives the engine's ticker from its event loop.
pub struct ConsoleRender {
    tl: Cell,
    brush: Brush,
    stats: Rc<RefCell<StatsRecorder>>,
    dirty: Rc<Flag<bool>>,
    subscriptions: [Subscription; 2],
}
impl ConsoleRender {
    pub fn new(engine: &mut Engine) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let stats = Rc::new(RefCell::new(StatsRecorder::new(engine.state())));
        let dirty = Rc::new(Flag::new(true));

        let sink = Rc::clone(&stats);
        let repaint = Rc::clone(&dirty);
        let state = engine.subscribe_state(move |state| {
            sink.borrow_mut().record(state);
            // the footer shows run state and speed
            repaint.set(true);
        });
        let repaint = Rc::clone(&dirty);
        let redraw = engine.subscribe_redraw(move |_| repaint.set(true));

        Ok(Self {
            tl: Cell::zero(),
            brush: Brush::new(),
            stats,
            dirty,
            subscriptions: [state, redraw],
        })
    }

    /// Runs until the user exits.
    pub fn run(&mut self, engine: &mut Engine) -> io::Result<()> {
        loop {
            engine.poll(Instant::now());

            if self.dirty.replace(false) || self.stats.borrow().has_report() {
                self.render(engine)?;
            }

            let timeout = engine
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_POLL)
                .min(IDLE_POLL);
            if !event::poll(timeout)? {
                continue;
            }
            if let ConsoleCommand::Exit = self.handle_event(engine, event::read()?) {
                for sub in self.subscriptions {
                    engine.unsubscribe(sub);
                }
                return Ok(());
            }
        }
    }

    fn render(&self, engine: &Engine) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        // last row is the footer
        let br = self.tl
            + Cell {
                x: cols as i32,
                y: rows.saturating_sub(1) as i32,
            };
        let mut stdout = io::stdout();
        queue!(stdout, terminal::Clear(terminal::ClearType::All))?;
        for cell in engine.window(self.tl, br).to_local() {
            queue!(stdout, cursor::MoveTo(cell.x as u16, cell.y as u16))?;
            stdout.write_all("█".as_bytes())?;
        }

        let report = self.stats.borrow_mut().report();
        queue!(stdout, cursor::MoveTo(0, rows.saturating_sub(1)))?;
        stdout.write_all(report.as_bytes())?;

        stdout.flush()
    }

    fn screen_cell(&self, column: u16, row: u16) -> Cell {
        // one terminal character per cell
        screen_to_cell(self.tl, column as f64, row as f64, 1.0)
    }

    fn handle_event(&mut self, engine: &mut Engine, event: Event) -> ConsoleCommand {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(engine, key),
            Event::Mouse(mouse) => {
                self.handle_mouse(engine, mouse);
                ConsoleCommand::Handled
            }
            Event::Resize(..) => {
                self.dirty.set(true);
                ConsoleCommand::Handled
            }
            _ => ConsoleCommand::Handled,
        }
    }

    fn handle_key(&mut self, engine: &mut Engine, key: KeyEvent) -> ConsoleCommand {
        match key {
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
            | KeyEvent {
                code: KeyCode::Char('q') | KeyCode::Esc,
                ..
            } => return ConsoleCommand::Exit,
            KeyEvent {
                code: KeyCode::Char(' '),
                ..
            } => match engine.run_state() {
                RunState::Running => engine.pause(),
                RunState::Paused | RunState::Stopped => engine.start(),
            },
            KeyEvent {
                code: KeyCode::Char('n'),
                ..
            } => engine.advance(),
            KeyEvent {
                code: KeyCode::Char('c'),
                ..
            } => engine.stop(),
            KeyEvent {
                code: KeyCode::Char(c @ ('+' | '=' | '-')),
                ..
            } => {
                let delta = if c == '-' { -1.0 } else { 1.0 };
                let speed = (engine.speed() + delta)
                    .clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end());
                if speed != engine.speed() {
                    engine.set_speed(speed);
                }
            }
            // arrows to move the view
            KeyEvent { code, .. } => {
                match code {
                    KeyCode::Up => self.tl.y -= 1,
                    KeyCode::Down => self.tl.y += 1,
                    KeyCode::Left => self.tl.x -= 1,
                    KeyCode::Right => self.tl.x += 1,
                    _ => return ConsoleCommand::Handled,
                }
                self.dirty.set(true);
            }
        }
        ConsoleCommand::Handled
    }

    fn handle_mouse(&mut self, engine: &mut Engine, mouse: MouseEvent) {
        let cell = self.screen_cell(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.brush.pointer_down(cell),
            MouseEventKind::Drag(MouseButton::Left) => self.brush.pointer_move(engine, cell),
            MouseEventKind::Up(MouseButton::Left) => {
                self.brush.pointer_move(engine, cell);
                self.brush.pointer_up(engine);
                debug!(x = cell.x, y = cell.y, "gesture ended");
            }
            _ => {}
        }
    }
}
impl Drop for ConsoleRender {
    fn drop(&mut self) {
        // if we could enable it, we should be able to disable it
        if let Err(err) = terminal::disable_raw_mode() {
            tracing::error!(?err, "failed to disable raw mode");
        }
        if let Err(err) = execute!(
            io::stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        ) {
            tracing::error!(?err, "failed to restore terminal");
        }
    }
}
