//! Bitvector edge weights whose shortest-path distances must add up to 10
//!
//! Run with `cargo run --example bv_weights_add [SEED]`.

use bvgraph_solver::{Config, Context, WeightsAdd};
use rand::Rng;

fn main() -> bvgraph_solver::Result<()> {
    println!("begin encode");

    let seed = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .map_err(|_| bvgraph_solver::Error::parse(1, format!("invalid seed '{arg}'")))?,
        None => rand::rng().random_range(1..=100_000u64),
    };
    println!("RandomSeed={seed}");

    let mut ctx = Context::with_config(Config::with_seed(seed));
    let problem = WeightsAdd::encode(&mut ctx)?;

    let result = ctx.solve()?;
    println!("Result is {result}");
    if result {
        for bv in problem.bitvectors() {
            println!("{bv} = {}", ctx.bv_value(bv)?);
        }
    }
    Ok(())
}
