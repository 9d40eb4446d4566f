//! sc-arena: run combat scenarios against the sc-core engine
//!
//! `duel` plays a scenario file round by round and prints what happens.
//! `ghosts` generates a batch of procedural monsters and checks every one
//! against the configured caps.

mod scenario;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use sc_core::actor::{Actor, Skill, Weapon};
use sc_core::aura::mons_update_aura;
use sc_core::combat::{Attack, Brand};
use sc_core::constrict::handle_constriction;
use sc_core::enchant::{apply_enchantments, tick_player};
use sc_core::ghost::{GhostDemon, init_dancing_weapon, init_pandemonium_lord, init_ugly_thing};
use sc_core::message::{MessageSink, MsgChannel};
use sc_core::{BASELINE_DELAY, CombatConfig, Coord, GameRng, GameSession, Mid};

use scenario::{Scenario, ScenarioError};

/// Combat scenario runner
#[derive(Parser, Debug)]
#[command(name = "sc-arena")]
#[command(author, version, about = "Run combat scenarios", long_about = None)]
struct Args {
    /// Log engine internals (overridden by RUST_LOG)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fight a duel described by a JSON scenario file
    Duel {
        scenario: PathBuf,
        /// Override the scenario's seed
        #[arg(short = 's', long = "seed")]
        seed: Option<u64>,
    },
    /// Generate monsters and check them against the caps
    Ghosts {
        #[arg(short = 's', long = "seed", default_value_t = 0)]
        seed: u64,
        #[arg(short = 'n', long = "count", default_value_t = 100)]
        count: u64,
        /// Dump every profile as JSON
        #[arg(long = "json")]
        json: bool,
    },
    /// Print the default engine configuration
    Config,
}

/// Prints engine messages as they happen.
#[derive(Debug, Default)]
struct StdoutSink;

impl MessageSink for StdoutSink {
    fn emit(&mut self, channel: MsgChannel, text: &str) {
        match channel {
            MsgChannel::Warning => println!("  ! {text}"),
            _ => println!("  {text}"),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Command::Duel { scenario, seed } => run_duel(&scenario, seed),
        Command::Ghosts { seed, count, json } => run_ghosts(seed, count, json),
        Command::Config => print_config(),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sc-arena: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_duel(path: &Path, seed: Option<u64>) -> Result<ExitCode, ScenarioError> {
    let scenario = Scenario::load(path)?;
    let seed = seed.unwrap_or(scenario.seed);
    let config = scenario.config();
    let mut session = GameSession::new(seed).with_config(config).with_sink(StdoutSink);
    info!(seed, rounds = scenario.rounds, "starting duel");

    let attacker = scenario.attacker.spawn(
        &mut session.world,
        &mut session.rng,
        &session.config,
        Coord::new(0, 0),
    )?;
    let defender = scenario.defender.spawn(
        &mut session.world,
        &mut session.rng,
        &session.config,
        Coord::new(1, 0),
    )?;
    describe(&session, attacker);
    describe(&session, defender);

    for round in 1..=scenario.rounds {
        println!("Round {round}");
        session.begin_round();
        for (actor, target) in [(attacker, defender), (defender, attacker)] {
            if over(&session, attacker, defender) {
                break;
            }
            strike(&mut session, actor, target)?;
        }
        for mid in [attacker, defender] {
            upkeep(&mut session, mid)?;
        }
        session.advance_turn();
        if over(&session, attacker, defender) {
            break;
        }
    }

    println!();
    for side in [attacker, defender] {
        if !session.is_dead(side)
            && let Some(a) = session.world.actor(side)
        {
            println!("{} survives with {} hp", a.name(), a.hp());
        }
    }
    for death in session.deaths() {
        println!("{} died ({}) on turn {}", death.name, death.cause, death.turn);
    }
    Ok(ExitCode::SUCCESS)
}

fn over(session: &GameSession, a: Mid, b: Mid) -> bool {
    session.is_dead(a) || session.is_dead(b)
}

fn describe(session: &GameSession, mid: Mid) {
    if let Some(a) = session.world.actor(mid) {
        println!("{} ({} hp, AC {}, EV {})", a.name(), a.hp(), a.armour_class(), a.evasion());
    }
}

/// One full turn of attacks: the player swings once, a monster uses every
/// natural attack in order.
fn strike(session: &mut GameSession, actor: Mid, target: Mid) -> Result<(), ScenarioError> {
    let slots = match session.world.monster(actor) {
        Some(m) => m.attacks.len(),
        None => 0,
    };
    if slots == 0 {
        Attack::melee(session, actor, target)?.attack(session)?;
        return Ok(());
    }
    for index in 0..slots {
        if over(session, actor, target) {
            break;
        }
        let outcome = Attack::monster_melee(session, actor, target, index)?.attack(session)?;
        debug!(%actor, index, hit = outcome.hit, damage = outcome.damage_done, "monster swing");
    }
    Ok(())
}

/// End-of-turn bookkeeping: holds squeeze, auras tick, effects wear off.
fn upkeep(session: &mut GameSession, mid: Mid) -> Result<(), ScenarioError> {
    if session.is_dead(mid) || !session.world.contains(mid) {
        return Ok(());
    }
    let constricting = session
        .world
        .actor(mid)
        .is_some_and(|a| a.constriction().is_constricting());
    if constricting {
        handle_constriction(session, mid)?;
    }
    if session.is_dead(mid) {
        return Ok(());
    }
    if mid.is_player() {
        tick_player(session, BASELINE_DELAY)?;
    } else {
        mons_update_aura(session, mid)?;
        apply_enchantments(session, mid)?;
    }
    Ok(())
}

fn sample_weapons() -> [Weapon; 3] {
    [
        Weapon::new("dagger", Skill::ShortBlades, 4),
        Weapon::new("long sword", Skill::LongBlades, 10).with_brand(Brand::Flaming),
        Weapon::new("executioner's axe", Skill::Axes, 18).with_plus(4),
    ]
}

fn run_ghosts(seed: u64, count: u64, json: bool) -> Result<ExitCode, ScenarioError> {
    let config = CombatConfig::default();
    let weapons = sample_weapons();
    let mut checked = 0usize;
    let mut failures = 0usize;

    for i in 0..count {
        let mut rng = GameRng::new(seed.wrapping_add(i));
        let power = (i % 11) as i32 * 10;
        let profiles = [
            init_pandemonium_lord(&mut rng, &config),
            init_ugly_thing(&mut rng, i % 2 == 1, None, &config),
            init_dancing_weapon(&weapons[(i % 3) as usize], power, &config),
        ];
        for ghost in &profiles {
            checked += 1;
            if let Err(e) = ghost.validate(&config) {
                failures += 1;
                warn!(seed = seed.wrapping_add(i), kind = %ghost.kind, error = %e, "profile out of bounds");
                println!("FAIL {} \"{}\": {e}", ghost.kind, ghost.name);
            }
            if json {
                print_profile(ghost)?;
            }
        }
    }

    println!("checked {checked} profiles, {failures} out of bounds");
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_profile(ghost: &GhostDemon) -> Result<(), ScenarioError> {
    println!("{}", serde_json::to_string(ghost)?);
    Ok(())
}

fn print_config() -> Result<ExitCode, ScenarioError> {
    println!("{}", CombatConfig::default().to_json()?);
    Ok(ExitCode::SUCCESS)
}
