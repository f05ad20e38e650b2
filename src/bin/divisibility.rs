//! Prints a regular expression matching the `base`-ary representations of
//! the natural numbers divisible by `divisor`.

use std::env;
use std::process::exit;

use dfa2regex::{optimize::optimize, Dfa, EquationSystem};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: divisibility <base> <divisor>");
        exit(1);
    }

    let (base, divisor) = match (args[1].parse::<u32>(), args[2].parse::<u32>()) {
        (Ok(base), Ok(divisor)) => (base, divisor),
        _ => {
            eprintln!("Please input numbers for base and divisor");
            exit(1);
        }
    };
    if !(2..=36).contains(&base) || divisor < 1 {
        eprintln!("Invalid base or divisor. Allowed values are 2..=36 for base, 1.. for divisor");
        exit(1);
    }

    let dfa = Dfa::divisibility(base, divisor);
    let solved = EquationSystem::new(&dfa).solve();
    println!("solved:    {}", solved);
    println!("optimized: {}", optimize(&solved));
}
