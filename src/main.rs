use anyhow::{Context, Result};
use lifers::{Cell, Engine, RunLengthEncoded, StatsRecorder};
use std::{cell::RefCell, rc::Rc, thread, time::Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod console;
mod options;

fn args_to_alive(args: &options::Args) -> Result<Vec<Cell>> {
    if let Some(file_name) = args.input_file() {
        let encoded = std::fs::read_to_string(&file_name)
            .with_context(|| format!("failed to read pattern {}", file_name))?;
        return RunLengthEncoded::default()
            .decode(&encoded)
            .with_context(|| format!("failed to decode pattern {}", file_name));
    }

    let (w, h) = args.grid_size()?;
    Ok(args.fill_mode()?.create_alive(w, h))
}

fn init_tracing(filter: Option<String>) {
    let filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the ticker for `gens` generations without a terminal UI.
fn run_headless(engine: &mut Engine, gens: u64, view: (i32, i32)) {
    let stats = Rc::new(RefCell::new(StatsRecorder::new(engine.state())));
    let sink = Rc::clone(&stats);
    let sub = engine.subscribe_state(move |state| sink.borrow_mut().record(state));

    engine.start();
    while engine.generation() < gens {
        if let Some(deadline) = engine.next_deadline() {
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
        }
        engine.poll(Instant::now());

        let mut stats = stats.borrow_mut();
        if stats.has_report() {
            info!("{}", stats.report());
        }
    }
    engine.pause();
    engine.unsubscribe(sub);

    let report = stats.borrow_mut().report();
    info!("{}", report);
    println!("{}", report);

    let (w, h) = view;
    debug!(
        "final generation within {}x{}:\n{}",
        w,
        h,
        engine.window(Cell::zero(), Cell { x: w, y: h })
    );
}

/// Writes the living cells as an RLE pattern to stdout.
fn export_pattern(engine: &Engine) {
    let encoder = RunLengthEncoded::default()
        .set_name(format!("lifers generation {}", engine.generation()));
    print!("{}", encoder.encode(&engine.sorted_cells()));
}

fn main() -> Result<()> {
    let args = options::Args::from_env()?;
    if let Some(usage) = args.help() {
        println!("{}", usage);
        return Ok(());
    }
    init_tracing(args.log_filter());

    let alive = args_to_alive(&args)?;
    info!(alive = alive.len(), "seeded");

    let mut engine = Engine::with_speed(args.speed()?);
    engine.add_cells(alive);

    if args.console() {
        let mut console = console::ConsoleRender::new(&mut engine)
            .context("failed to set up the terminal")?;
        if !args.paused() {
            engine.start();
        }
        console.run(&mut engine)?;
    } else {
        run_headless(&mut engine, args.generations()?, args.grid_size()?);
    }

    if args.export() {
        export_pattern(&engine);
    }

    Ok(())
}
