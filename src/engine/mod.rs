mod notify;
mod rule;
mod ticker;
mod window;

pub use self::notify::{Channel, Subscription};
pub use self::ticker::Ticker;
pub use self::window::EngineWindow;
use self::notify::Notifier;
use crate::Cell;
use std::{
    collections::HashSet,
    fmt,
    ops::RangeInclusive,
    time::{Duration, Instant},
};
use tracing::{debug, trace};

/// Generations per second a fresh engine runs at.
pub const DEFAULT_SPEED: f64 = 10.0;
/// Speeds a control surface should offer.
pub const SPEED_RANGE: RangeInclusive<f64> = 1.0..=15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Paused,
    Running,
}
impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Paused => "paused",
            Self::Running => "running",
        }
    }
}
impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a state observer gets to see after every change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineState {
    pub generation: u64,
    pub population: usize,
    pub run_state: RunState,
    pub speed: f64,
}

/// Sparse Game of Life simulation over an unbounded grid.
///
/// Only living cells are stored. Every mutation notifies the state
/// subscriber, and every change to the living set also notifies the redraw
/// subscriber, synchronously before the mutating call returns.
///
/// While running, the engine holds a [`Ticker`]; the host calls
/// [`Engine::poll`] to let due ticks advance the simulation.
#[derive(Debug)]
pub struct Engine {
    alive: HashSet<Cell>,
    generation: u64,
    run_state: RunState,
    speed: f64,
    ticker: Option<Ticker>,
    notifier: Notifier,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    #[inline]
    pub fn new() -> Self {
        Self::with_speed(DEFAULT_SPEED)
    }

    pub fn with_speed(speed: f64) -> Self {
        debug_assert!(speed.is_finite() && speed > 0.0, "speed must be positive");
        Self {
            alive: HashSet::new(),
            generation: 0,
            run_state: RunState::Stopped,
            speed,
            ticker: None,
            notifier: Notifier::default(),
        }
    }

    pub fn from_alive<I: IntoIterator<Item = Cell>>(alive: I) -> Self {
        let mut engine = Self::new();
        engine.alive.extend(alive);
        engine
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn population(&self) -> usize {
        self.alive.len()
    }

    #[inline]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Time between two scheduled generations at the current speed.
    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.speed)
    }

    #[inline]
    pub fn living_cells(&self) -> &HashSet<Cell> {
        &self.alive
    }

    /// The living cells in row-major order.
    pub fn sorted_cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.alive.iter().copied().collect();
        cells.sort_unstable();
        cells
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            generation: self.generation,
            population: self.alive.len(),
            run_state: self.run_state,
            speed: self.speed,
        }
    }

    pub fn window(&self, top_left: Cell, bottom_right: Cell) -> EngineWindow<'_> {
        EngineWindow::new(self, top_left, bottom_right)
    }

    #[inline]
    pub fn is_alive(&self, cell: Cell) -> bool {
        self.alive.contains(&cell)
    }

    pub fn add_cell(&mut self, cell: Cell) {
        self.alive.insert(cell);
        self.notify_all();
    }

    /// Inserts many cells with a single round of notifications.
    pub fn add_cells<I: IntoIterator<Item = Cell>>(&mut self, cells: I) {
        self.alive.extend(cells);
        self.notify_all();
    }

    pub fn remove_cell(&mut self, cell: Cell) {
        self.alive.remove(&cell);
        self.notify_all();
    }

    pub fn toggle(&mut self, cell: Cell) {
        if self.is_alive(cell) {
            self.remove_cell(cell);
        } else {
            self.add_cell(cell);
        }
    }

    /// Kills every cell and resets the generation counter. The run state is
    /// left alone.
    pub fn clear(&mut self) {
        self.reset();
        self.notify_all();
    }

    /// Computes the next generation and replaces the living set with it.
    ///
    /// The generation counter goes up by one even if nothing changed.
    pub fn advance(&mut self) {
        self.alive = rule::next_generation(&self.alive);
        self.generation += 1;
        trace!(
            generation = self.generation,
            population = self.alive.len(),
            "advanced"
        );
        self.notify_all();
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Like [`Engine::start`], with the first tick due one interval after `now`.
    pub fn start_at(&mut self, now: Instant) {
        if self.run_state == RunState::Running {
            return;
        }
        self.run_state = RunState::Running;
        self.schedule(now);
        debug!(speed = self.speed, "simulation started");
        self.notify_state();
    }

    pub fn pause(&mut self) {
        if self.run_state != RunState::Running {
            return;
        }
        self.ticker = None;
        self.run_state = RunState::Paused;
        debug!(generation = self.generation, "simulation paused");
        self.notify_state();
    }

    /// Cancels any scheduled tick, then kills every cell and resets the
    /// generation counter.
    pub fn stop(&mut self) {
        self.ticker = None;
        self.run_state = RunState::Stopped;
        self.reset();
        debug!("simulation stopped");
        self.notify_all();
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.set_speed_at(speed, Instant::now());
    }

    /// Like [`Engine::set_speed`]; a running ticker restarts at `now`.
    pub fn set_speed_at(&mut self, speed: f64, now: Instant) {
        debug_assert!(speed.is_finite() && speed > 0.0, "speed must be positive");
        self.speed = speed;
        if self.run_state == RunState::Running {
            self.schedule(now);
        }
        debug!(speed, "speed changed");
        self.notify_state();
    }

    /// Runs the scheduled generation if its tick is due at `now`.
    ///
    /// Returns whether a generation was computed. Hosts call this from their
    /// event loop, sleeping until [`Engine::next_deadline`] in between.
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = match &mut self.ticker {
            Some(ticker) if self.run_state == RunState::Running => ticker.fire(now),
            _ => false,
        };
        if due {
            self.advance();
        }
        due
    }

    /// When the next scheduled generation is due, if the engine is running.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.ticker.as_ref().map(Ticker::deadline)
    }

    pub fn subscribe_state<F>(&mut self, observer: F) -> Subscription
    where
        F: FnMut(&EngineState) + 'static,
    {
        self.notifier.subscribe_state(Box::new(observer))
    }

    pub fn subscribe_redraw<F>(&mut self, observer: F) -> Subscription
    where
        F: FnMut(&HashSet<Cell>) + 'static,
    {
        self.notifier.subscribe_redraw(Box::new(observer))
    }

    /// Returns false if the subscription had already been replaced.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        self.notifier.unsubscribe(sub)
    }

    pub fn has_subscriber(&self, channel: Channel) -> bool {
        self.notifier.has_subscriber(channel)
    }

    fn schedule(&mut self, now: Instant) {
        // replacing the ticker drops the previous one
        self.ticker = Some(Ticker::new(self.interval(), now));
    }

    fn reset(&mut self) {
        self.alive.clear();
        self.generation = 0;
    }

    fn notify_state(&mut self) {
        let state = self.state();
        self.notifier.state_changed(&state);
    }

    fn notify_all(&mut self) {
        self.notify_state();
        self.notifier.redraw_needed(&self.alive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    fn cells(coords: &[(i32, i32)]) -> HashSet<Cell> {
        coords.iter().copied().map(Cell::from).collect()
    }

    fn engine_with(coords: &[(i32, i32)]) -> Engine {
        Engine::from_alive(cells(coords))
    }

    #[test]
    fn add_then_is_alive() {
        let mut engine = Engine::new();
        engine.add_cell(Cell::new(4, -2));

        assert!(engine.is_alive(Cell::new(4, -2)));
        assert_eq!(engine.population(), 1);
    }

    #[test]
    fn add_is_idempotent() {
        let mut engine = Engine::new();
        engine.add_cell(Cell::new(1, 1));
        engine.add_cell(Cell::new(1, 1));

        assert_eq!(engine.population(), 1);
    }

    #[test]
    fn add_cells_notifies_once() {
        let count = Rc::new(RefCell::new(0));
        let mut engine = Engine::new();
        let sink = Rc::clone(&count);
        let _sub = engine.subscribe_redraw(move |_| *sink.borrow_mut() += 1);

        engine.add_cells(cells(&[(0, 0), (1, 0), (0, 0)]).into_iter());

        assert_eq!(engine.population(), 2);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn remove_then_not_alive() {
        let mut engine = engine_with(&[(0, 0)]);
        engine.remove_cell(Cell::new(0, 0));
        engine.remove_cell(Cell::new(9, 9));

        assert!(!engine.is_alive(Cell::new(0, 0)));
        assert_eq!(engine.population(), 0);
    }

    #[test]
    fn toggle_twice_restores_state() {
        let mut engine = engine_with(&[(0, 0)]);
        for cell in [Cell::new(0, 0), Cell::new(3, 3)] {
            let before = engine.is_alive(cell);
            engine.toggle(cell);
            assert_ne!(engine.is_alive(cell), before);
            engine.toggle(cell);
            assert_eq!(engine.is_alive(cell), before);
        }
    }

    #[test]
    fn lonely_cell_dies() {
        let mut engine = engine_with(&[(7, 7)]);
        engine.advance();

        assert_eq!(engine.population(), 0);
    }

    #[test]
    fn block_is_stable() {
        let block = cells(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
        let mut engine = Engine::from_alive(block.clone());
        for _ in 0..5 {
            engine.advance();
            assert_eq!(engine.living_cells(), &block);
        }
    }

    #[test]
    fn blinker_has_period_two() {
        let vertical = cells(&[(1, 0), (1, 1), (1, 2)]);
        let horizontal = cells(&[(0, 1), (1, 1), (2, 1)]);
        let mut engine = Engine::from_alive(vertical.clone());

        engine.advance();
        assert_eq!(engine.living_cells(), &horizontal);
        engine.advance();
        assert_eq!(engine.living_cells(), &vertical);
    }

    #[test]
    fn glider_moves_across_negative_coordinates() {
        let glider = [(-10, -10), (-9, -9), (-11, -8), (-10, -8), (-9, -8)];
        let mut engine = engine_with(&glider);
        for _ in 0..4 {
            engine.advance();
        }

        let moved: Vec<(i32, i32)> = glider.iter().map(|&(x, y)| (x + 1, y + 1)).collect();
        assert_eq!(engine.living_cells(), &cells(&moved));
    }

    #[test]
    fn far_away_cells_stay_dead() {
        let mut engine = engine_with(&[(0, 0), (1, 0), (2, 0)]);
        engine.advance();

        assert!(engine.living_cells().iter().all(|c| c.x.abs() <= 2 && c.y.abs() <= 2));
        assert!(!engine.is_alive(Cell::new(10, 10)));
    }

    #[test]
    fn advance_always_counts_a_generation() {
        let mut engine = Engine::new();
        engine.advance();
        engine.advance();
        assert_eq!(engine.generation(), 2);
        assert_eq!(engine.population(), 0);

        let mut engine = engine_with(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
        engine.advance();
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn clear_keeps_run_state() {
        let mut engine = engine_with(&[(0, 0)]);
        engine.start();
        engine.advance();
        engine.clear();

        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.population(), 0);
        assert_eq!(engine.run_state(), RunState::Running);
    }

    #[test]
    fn stop_resets_from_any_state() {
        let setups: [fn(&mut Engine); 3] = [
            |_| {},
            |e| e.start(),
            |e| {
                e.start();
                e.pause();
            },
        ];
        for setup in setups {
            let mut engine = engine_with(&[(0, 0), (1, 0), (2, 0)]);
            setup(&mut engine);
            engine.advance();
            engine.stop();

            assert_eq!(engine.generation(), 0);
            assert!(engine.living_cells().is_empty());
            assert_eq!(engine.run_state(), RunState::Stopped);
            assert!(engine.next_deadline().is_none());
        }
    }

    #[test]
    fn run_state_transitions() {
        let mut engine = Engine::new();
        engine.pause();
        assert_eq!(engine.run_state(), RunState::Stopped);

        engine.start();
        assert_eq!(engine.run_state(), RunState::Running);
        engine.pause();
        assert_eq!(engine.run_state(), RunState::Paused);
        engine.start();
        assert_eq!(engine.run_state(), RunState::Running);
    }

    #[test]
    fn start_while_running_keeps_ticker() {
        let now = Instant::now();
        let mut engine = Engine::new();
        engine.start_at(now);
        let deadline = engine.next_deadline();
        engine.start_at(now + Duration::from_millis(50));

        assert_eq!(engine.next_deadline(), deadline);
    }

    #[test]
    fn poll_advances_when_due() {
        let now = Instant::now();
        let mut engine = engine_with(&[(1, 0), (1, 1), (1, 2)]);
        engine.start_at(now);
        let interval = engine.interval();

        assert!(!engine.poll(now));
        assert!(engine.poll(now + interval));
        assert_eq!(engine.generation(), 1);
        assert!(engine.poll(now + interval * 2));
        assert_eq!(engine.generation(), 2);
    }

    #[test]
    fn pause_cancels_pending_tick() {
        let now = Instant::now();
        let mut engine = engine_with(&[(1, 0), (1, 1), (1, 2)]);
        engine.start_at(now);
        engine.pause();

        assert!(!engine.poll(now + Duration::from_secs(60)));
        assert_eq!(engine.generation(), 0);
        assert!(engine.next_deadline().is_none());
    }

    #[test]
    fn stopped_engine_never_ticks() {
        let mut engine = engine_with(&[(0, 0)]);

        assert!(!engine.poll(Instant::now() + Duration::from_secs(60)));
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn interval_follows_speed() {
        let engine = Engine::with_speed(4.0);
        assert_eq!(engine.interval(), Duration::from_millis(250));
    }

    #[test]
    fn set_speed_while_running_restarts_ticker() {
        let now = Instant::now();
        let mut engine = engine_with(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
        engine.start_at(now);
        engine.poll(now + engine.interval());
        assert_eq!(engine.generation(), 1);

        let later = now + Duration::from_millis(130);
        engine.set_speed_at(2.0, later);

        assert_eq!(engine.run_state(), RunState::Running);
        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.population(), 4);
        assert_eq!(engine.next_deadline(), Some(later + Duration::from_millis(500)));
        assert!(!engine.poll(later + Duration::from_millis(499)));
        assert!(engine.poll(later + Duration::from_millis(500)));
    }

    #[test]
    fn set_speed_while_paused_does_not_schedule() {
        let mut engine = Engine::new();
        engine.start();
        engine.pause();
        engine.set_speed(3.0);

        assert_eq!(engine.speed(), 3.0);
        assert_eq!(engine.run_state(), RunState::Paused);
        assert!(engine.next_deadline().is_none());
    }

    #[test]
    fn state_observer_sees_every_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut engine = Engine::new();
        let sink = Rc::clone(&seen);
        let _sub = engine.subscribe_state(move |state| sink.borrow_mut().push(*state));

        engine.add_cell(Cell::new(0, 0));
        engine.start();
        engine.set_speed(5.0);
        engine.advance();
        engine.pause();
        engine.stop();

        let seen = seen.borrow();
        let states: Vec<(u64, usize, RunState)> = seen
            .iter()
            .map(|s| (s.generation, s.population, s.run_state))
            .collect();
        assert_eq!(
            states,
            vec![
                (0, 1, RunState::Stopped),
                (0, 1, RunState::Running),
                (0, 1, RunState::Running),
                (1, 0, RunState::Running),
                (1, 0, RunState::Paused),
                (0, 0, RunState::Stopped),
            ]
        );
        assert_eq!(seen[2].speed, 5.0);
    }

    #[test]
    fn redraw_only_on_cell_changes() {
        let redraws = Rc::new(RefCell::new(Vec::new()));
        let mut engine = Engine::new();
        let sink = Rc::clone(&redraws);
        let _sub = engine.subscribe_redraw(move |alive| sink.borrow_mut().push(alive.len()));

        engine.add_cell(Cell::new(0, 0));
        engine.add_cell(Cell::new(1, 0));
        engine.start();
        engine.set_speed(2.0);
        engine.pause();
        engine.advance();
        engine.stop();

        assert_eq!(*redraws.borrow(), vec![1, 2, 0, 0]);
    }

    #[test]
    fn scheduled_ticks_notify() {
        let count = Rc::new(RefCell::new(0));
        let now = Instant::now();
        let mut engine = engine_with(&[(0, 0)]);
        let sink = Rc::clone(&count);
        let _sub = engine.subscribe_redraw(move |_| *sink.borrow_mut() += 1);

        engine.start_at(now);
        engine.poll(now + engine.interval());

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn last_subscriber_wins() {
        let first = Rc::new(RefCell::new(0));
        let second = Rc::new(RefCell::new(0));
        let mut engine = Engine::new();

        let sink = Rc::clone(&first);
        let old = engine.subscribe_state(move |_| *sink.borrow_mut() += 1);
        let sink = Rc::clone(&second);
        let new = engine.subscribe_state(move |_| *sink.borrow_mut() += 1);
        engine.advance();

        assert_eq!((*first.borrow(), *second.borrow()), (0, 1));

        // the stale handle must not remove the current subscriber
        assert!(!engine.unsubscribe(old));
        assert!(engine.has_subscriber(Channel::State));
        assert!(engine.unsubscribe(new));
        assert!(!engine.has_subscriber(Channel::State));

        engine.advance();
        assert_eq!(*second.borrow(), 1);
    }

    #[test]
    fn channels_are_independent() {
        let mut engine = Engine::new();
        let state = engine.subscribe_state(|_| {});
        let _redraw = engine.subscribe_redraw(|_| {});
        assert_eq!(state.channel(), Channel::State);

        assert!(engine.unsubscribe(state));
        assert!(engine.has_subscriber(Channel::Redraw));
    }
}
