use clap::Parser;

pub mod types;
pub mod validation;

pub use types::{Args, CleanArgs, RunMode, SimulateArgs};

/// # Errors
///
/// Will return `Err` if the arguments don't fit together
pub fn args_checks() -> Result<CleanArgs, String> {
    CleanArgs::new(Args::parse())
}

impl CleanArgs {
    /// # Errors
    ///
    /// Will return `Err` if simulate mode is missing its chip number, or any other mode its roster
    pub fn new(args: Args) -> Result<Self, String> {
        let simulate = match (args.mode, args.chip) {
            (RunMode::Simulate, None) => {
                return Err("--chip is required in simulate mode.".to_string());
            }
            (RunMode::Simulate, Some(chip)) => Some(SimulateArgs {
                target: args.target.trim_end_matches('/').to_string(),
                chip,
                station: args.station,
                count: args.count.max(1),
                delay_ms: args.delay_ms,
            }),
            _ => None,
        };
        if args.mode != RunMode::Simulate && args.roster.is_none() {
            return Err("--roster is required unless in simulate mode.".to_string());
        }
        if args.interval_secs == 0 {
            return Err("--interval-secs must be at least 1.".to_string());
        }

        Ok(CleanArgs {
            mode: args.mode,
            punch_db: args.punch_db,
            roster: args.roster,
            stage: args.stage,
            bind: args.bind,
            output_dir: args.output_dir,
            interval_secs: args.interval_secs,
            export_mode: args.export_mode,
            utc_offset: args.utc_offset,
            simulate,
        })
    }
}
