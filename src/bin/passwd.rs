use clap::Parser;
use subsock::cipher::{self, Cipher};

/// Print a random password for the config file.
#[derive(Parser, Debug)]
struct Args {
    /// Number of passwords to print
    #[arg(short, default_value_t = 1)]
    n: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    for _ in 0..args.n {
        let password = cipher::random_password();
        Cipher::new(&password)?;
        println!("{password}");
    }
    Ok(())
}
