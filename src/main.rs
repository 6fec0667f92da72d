use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use particle_sim::state::HeadlessRun;
use particle_sim::SimParams;
use std::io;
use std::process::ExitCode;

/// Real-time 2-D particle collision simulation
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Number of particles to simulate
  #[arg(short, long, default_value_t = SimParams::default().num_particles)]
  particles: u32,
  /// Grid cells per axis
  #[arg(long, default_value_t = SimParams::default().grid_resolution)]
  resolution: u32,
  /// Maximum particles stored per grid cell
  #[arg(long, default_value_t = SimParams::default().cell_capacity)]
  cell_capacity: u32,
  /// Width and height of the simulation area in pixels
  #[arg(long, default_value_t = SimParams::default().render_width)]
  size: u32,
  /// Seed for the initial particle distribution
  #[arg(long, default_value_t = SimParams::default().seed)]
  seed: u64,
  /// Coefficient of restitution for particle collisions
  #[arg(long, default_value_t = SimParams::default().collision.restitution)]
  restitution: f32,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Ticks to run in headless mode
  #[arg(long, default_value_t = 600)]
  ticks: u64,
  /// Fixed time step in seconds for headless mode
  #[arg(long, default_value_t = 1.0 / 60.0)]
  dt: f32,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

impl Args {
  fn sim_params(&self) -> SimParams {
    let mut params = SimParams {
      num_particles: self.particles,
      grid_resolution: self.resolution,
      cell_capacity: self.cell_capacity,
      render_width: self.size,
      render_height: self.size,
      seed: self.seed,
      ..SimParams::default()
    };
    params.collision.restitution = self.restitution;
    params
  }
}

fn main() -> ExitCode {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return ExitCode::SUCCESS;
  }

  env_logger::init();
  let headless = args.headless.then_some(HeadlessRun {
    ticks: args.ticks,
    dt: args.dt,
  });
  match particle_sim::state::run(args.sim_params(), headless) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      log::error!("{err}");
      ExitCode::FAILURE
    }
  }
}
