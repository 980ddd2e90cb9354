use clap::Parser;
use labscaffold_cli::{cli::Cli, output, pipeline};

fn main() {
    let cli = Cli::parse();

    loggerv::Logger::new()
        .verbosity(cli.verbose as u64)
        .level(true)
        .module_path(false)
        .init()
        .expect("logger is only initialised once");

    match pipeline::run(&cli) {
        Ok(outcome) => {
            output::report_success(&outcome);
            std::process::exit(0);
        }
        Err(err) => {
            output::report_error(&err);
            std::process::exit(err.exit_code());
        }
    }
}
