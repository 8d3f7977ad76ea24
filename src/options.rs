use lifers::{Cell, DEFAULT_SPEED, SPEED_RANGE};
use std::str::FromStr;
use thiserror::Error;

const USAGE: &str = "usage: lifers [options]";
const DEFAULT_GENS: u64 = 100;
const DEFAULT_SIZE: (i32, i32) = (40, 20);

#[derive(Debug, Error)]
pub enum ArgsError {
    #[error(transparent)]
    Parse(#[from] getopts::Fail),

    #[error("invalid value `{value}` for --{opt}")]
    InvalidValue { opt: &'static str, value: String },

    #[error("speed {0} is outside 1..=15 gen/s")]
    SpeedOutOfRange(f64),
}

pub struct Args {
    matches: getopts::Matches,
    usage: String,
}

impl Args {
    fn new<T: AsRef<str>>(args: &[T]) -> Result<Self, ArgsError> {
        let mut opts = getopts::Options::new();
        opts.optflag("", "help", "print this help menu");
        opts.optflag("c", "console", "run interactively in the terminal");
        opts.optflag("", "paused", "do not start running in console mode");
        opts.optflag("", "export", "print the final pattern as RLE");
        opts.optopt("i", "input", "seed pattern in RLE format", "FILE");
        opts.optopt("w", "width", "set fill width", "WIDTH");
        opts.optopt("h", "height", "set fill height", "HEIGHT");
        opts.optopt("f", "fill", "random, alternating, all or empty", "TYPE");
        opts.optopt("s", "speed", "generations per second (1-15)", "GENS");
        opts.optopt("g", "gens", "generations to run headless", "COUNT");
        opts.optopt("", "log", "tracing filter, overrides RUST_LOG", "FILTER");

        let matches = opts.parse(args.iter().map(T::as_ref))?;
        let args = Self {
            matches,
            usage: opts.usage(USAGE),
        };
        // validate eagerly so accessors below cannot fail
        args.fill_mode()?;
        args.speed()?;
        args.grid_size()?;
        args.generations()?;
        Ok(args)
    }
    pub fn from_env() -> Result<Self, ArgsError> {
        let env = std::env::args().collect::<Vec<_>>();
        Self::new(&env[1..])
    }

    fn opt_parse<T: FromStr>(&self, opt: &'static str) -> Result<Option<T>, ArgsError> {
        self.matches
            .opt_str(opt)
            .map(|value| {
                value
                    .parse::<T>()
                    .map_err(|_| ArgsError::InvalidValue { opt, value })
            })
            .transpose()
    }

    pub fn help(&self) -> Option<&str> {
        self.matches.opt_present("help").then_some(self.usage.as_str())
    }

    pub fn console(&self) -> bool {
        self.matches.opt_present("console")
    }
    pub fn paused(&self) -> bool {
        self.matches.opt_present("paused")
    }
    pub fn export(&self) -> bool {
        self.matches.opt_present("export")
    }

    pub fn generations(&self) -> Result<u64, ArgsError> {
        Ok(self.opt_parse("gens")?.unwrap_or(DEFAULT_GENS))
    }

    pub fn speed(&self) -> Result<f64, ArgsError> {
        let speed = self.opt_parse("speed")?.unwrap_or(DEFAULT_SPEED);
        if SPEED_RANGE.contains(&speed) {
            Ok(speed)
        } else {
            Err(ArgsError::SpeedOutOfRange(speed))
        }
    }

    pub fn grid_size(&self) -> Result<(i32, i32), ArgsError> {
        let w = self.opt_parse("width")?.unwrap_or(DEFAULT_SIZE.0);
        let h = self.opt_parse("height")?.unwrap_or(DEFAULT_SIZE.1);
        if w < 0 {
            return Err(ArgsError::InvalidValue {
                opt: "width",
                value: w.to_string(),
            });
        }
        if h < 0 {
            return Err(ArgsError::InvalidValue {
                opt: "height",
                value: h.to_string(),
            });
        }
        Ok((w, h))
    }

    pub fn fill_mode(&self) -> Result<FillMode, ArgsError> {
        match self.matches.opt_str("fill") {
            None => Ok(FillMode::Random),
            Some(value) => {
                FillMode::new(&value).ok_or(ArgsError::InvalidValue { opt: "fill", value })
            }
        }
    }

    pub fn input_file(&self) -> Option<String> {
        self.matches.opt_str("input")
    }

    pub fn log_filter(&self) -> Option<String> {
        self.matches.opt_str("log")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Random,
    Alternating,
    All,
    Empty,
}
impl FillMode {
    fn new<S: AsRef<str>>(s: S) -> Option<Self> {
        match s.as_ref() {
            "random" => Some(Self::Random),
            "alternating" => Some(Self::Alternating),
            "all" => Some(Self::All),
            "empty" => Some(Self::Empty),
            _ => None,
        }
    }

    fn fill_cell<R: rand::Rng>(&self, cell: Cell, rng: &mut R) -> bool {
        match self {
            Self::Random => rng.random_bool(0.5),
            Self::Alternating => (cell.x + cell.y) % 2 == 0,
            Self::All => true,
            Self::Empty => false,
        }
    }
    pub fn create_alive(self, w: i32, h: i32) -> Vec<Cell> {
        if self == Self::Empty {
            return Vec::new();
        }

        let mut rng = rand::rng();
        let mut alive = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let cell = Cell { x, y };
                if self.fill_cell(cell, &mut rng) {
                    alive.push(cell);
                }
            }
        }
        alive
    }
}
