use crate::{EngineState, RunState};
use std::time::{Duration, Instant};

const REPORT_INTERVAL: Duration = Duration::from_millis(500);

/// Stats observer: keeps the latest engine state and measures how many
/// generations per second were actually computed between reports.
#[derive(Debug)]
pub struct StatsRecorder {
    state: EngineState,
    gens_in_report: u64,
    last_generation: u64,
    last_report: Instant,
}
impl StatsRecorder {
    pub fn new(state: EngineState) -> Self {
        Self {
            state,
            gens_in_report: 0,
            last_generation: state.generation,
            last_report: Instant::now(),
        }
    }

    pub fn record(&mut self, state: &EngineState) {
        // a reset to zero is not progress
        if state.generation > self.last_generation {
            self.gens_in_report += state.generation - self.last_generation;
        }
        self.last_generation = state.generation;
        self.state = *state;
    }

    #[inline]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn has_report(&self) -> bool {
        self.last_report.elapsed() >= REPORT_INTERVAL
    }

    pub fn report(&mut self) -> String {
        let elapsed = self.last_report.elapsed().as_secs_f64();
        let gens_per_sec = if elapsed > 0.0 {
            self.gens_in_report as f64 / elapsed
        } else {
            0.0
        };
        // reset for next report
        self.last_report = Instant::now();
        self.gens_in_report = 0;

        format_report(&self.state, gens_per_sec)
    }
}

fn format_report(state: &EngineState, gens_per_sec: f64) -> String {
    let mut report = format!(
        "gen {} | pop {} | {}",
        state.generation, state.population, state.run_state
    );
    if state.run_state == RunState::Running {
        report.push_str(&format!(
            " @ {} gen/s ({:.02} gen/s measured)",
            state.speed, gens_per_sec
        ));
    } else {
        report.push_str(&format!(" @ {} gen/s", state.speed));
    }
    report
}
