// Builds a symmetry group from generators and prints what we know about it.
// Try:
//   cargo run --features=cli --bin=group_order 4 "(0 1):-" "(0 2)(1 3)"
// A ":-" suffix marks a generator that negates the tensor.
// Set RUST_LOG=debug to see the stabilizer chain being built.

use tensor_symmetry::{Symmetry, SymmetrySet};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: group_order <degree> [<cycles>[:-] ...]";

fn parse_generator(degree: usize, arg: &str) -> tensor_symmetry::Result<Symmetry> {
    match arg.strip_suffix(":-") {
        Some(cycles) => Symmetry::parse(degree, &format!("-{}", cycles)),
        None => Symmetry::parse(degree, arg),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let mut args = std::env::args().skip(1);
    let degree: usize = match args.next().map(|s| s.parse()) {
        Some(Ok(degree)) => degree,
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let mut set = SymmetrySet::trivial(degree);
    for arg in args {
        let generator = match parse_generator(degree, &arg) {
            Ok(generator) => generator,
            Err(e) => {
                eprintln!("bad generator {}: {}", arg, e);
                std::process::exit(1);
            }
        };
        match set.add(generator) {
            Ok(true) => println!("added {}", arg),
            Ok(false) => println!("{} is already in the group", arg),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }

    let chain = set.chain();
    println!("degree: {}", degree);
    match set.order() {
        Some(order) => println!("order: {}", order),
        None => println!("order: more than {}", u128::MAX),
    }
    println!("base: {:?}", chain.base());
    for (i, level) in chain.levels().iter().enumerate() {
        println!(
            "level {}: base point {}, orbit {:?}, {} generators",
            i,
            level.base_point(),
            level.orbit().points(),
            level.generators().len()
        );
    }
}
