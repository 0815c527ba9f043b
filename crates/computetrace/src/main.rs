mod cli;
mod paths;
mod run;

use std::process::ExitCode;

fn main() -> ExitCode {
    let args = cli::parse();
    run::run(args)
}
