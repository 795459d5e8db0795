use raccoon::{app::run_cli, init};

fn main() {
    init();

    match run_cli() {
        Ok(output) => print!("{output}"),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(err.exit_code());
        }
    }
}
