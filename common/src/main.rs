use clap::Parser;
use minesweeper_agent::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Parser)]
#[command(name = "minesweeper-agent")]
#[command(about = "Plays minesweeper revealing only provably safe cells", long_about = None)]
struct Cli {
    /// Board width.
    #[arg(default_value_t = 9)]
    width: usize,
    /// Board height.
    #[arg(default_value_t = 9)]
    height: usize,
    /// Number of mines.
    #[arg(default_value_t = 10)]
    mines: usize,
    /// Number of games to play.
    #[arg(default_value_t = 1)]
    games: usize,
    /// Seed for the mine layouts. Random if not given.
    #[arg(long, env = "MINESWEEPER_SEED")]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // --- 1. Initialization ---
    let cli = Cli::parse();
    let config = AgentConfig::from_env()?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    println!("--- Autonomous Minesweeper Agent ---");
    println!("Strategy: only reveal cells that are provably safe, stop otherwise.");
    println!(
        "{}x{} with {} mines, {} game(s), seed {seed}",
        cli.width, cli.height, cli.mines, cli.games
    );

    // --- 2. Game Loop ---
    let (mut won, mut lost, mut stuck) = (0, 0, 0);
    for game in 1..=cli.games {
        let field = MineField::new(cli.width, cli.height, cli.mines, &mut rng)?;
        let mut agent = Orchestrator::new(field, &config);
        let outcome = agent.solve()?;

        match outcome {
            Outcome::Won => won += 1,
            Outcome::Lost => lost += 1,
            Outcome::Stuck => stuck += 1,
        }

        println!("\n--- Game #{game}: {outcome:?} after {} reveals ---", agent.turns());
        print!("{}", agent.state().grid);
    }

    // --- 3. Final Result ---
    println!("\n--- Summary ---");
    println!("won {won}, lost {lost}, stuck {stuck}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_play_a_small_board() {
        let cli = Cli::try_parse_from(["minesweeper-agent"]).unwrap();
        assert_eq!((cli.width, cli.height, cli.mines, cli.games), (9, 9, 10, 1));
    }

    #[test]
    fn test_positional_sizes_and_seed() {
        let cli =
            Cli::try_parse_from(["minesweeper-agent", "16", "16", "40", "3", "--seed", "7"])
                .unwrap();
        assert_eq!((cli.width, cli.height, cli.mines, cli.games), (16, 16, 40, 3));
        assert_eq!(cli.seed, Some(7));
        assert!(Cli::try_parse_from(["minesweeper-agent", "nine"]).is_err());
    }
}
