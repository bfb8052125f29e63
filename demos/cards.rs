//! Estimate the probability that at least two of four players receive at least two face cards,
//! if each player is dealt seven cards from a standard 52-card deck.
//!
//! Run with `RUST_LOG=simcarlo=debug cargo run --example cards` to watch the dispatcher.

use rand::Rng;
use simcarlo::{Error, Model, RandomStream, SimulationConfig, Tally};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CARDS: usize = 52;
const PLAYERS: usize = 4;
const HAND: usize = 7;

fn two_face(hand: &[usize]) -> bool {
    hand.iter().filter(|card| *card % 13 >= 10).count() >= 2
}

fn check_hands(stream: &mut RandomStream) -> bool {
    let mut deck = (0..CARDS).collect::<Vec<_>>();

    // only the cards that are dealt need to be shuffled
    for n in 0..PLAYERS * HAND {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ndx = (stream.gen::<f64>() * CARDS as f64) as usize;
        deck.swap(n, ndx);
    }

    deck[..PLAYERS * HAND]
        .chunks(HAND)
        .filter(|hand| two_face(hand))
        .count()
        >= 2
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<(), Error> {
    init_tracing("info");

    let config = SimulationConfig::default()
        .with_name("cards")
        .with_ntrials(100)
        .parallel(num_cpus::get());
    let mut model = Model::new(config)
        .with_trial(check_hands)
        .with_callback_state(Tally::default());

    model.simulate()?;

    let tally = model.state();
    println!(
        "{} of {} deals, fraction {:.3} (seed {})",
        tally.successes(),
        tally.trials(),
        tally.fraction().unwrap_or(f64::NAN),
        model.seed_used().unwrap_or_default()
    );

    Ok(())
}
