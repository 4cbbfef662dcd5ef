//! Entry point for the `fieldroute` command.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = fieldroute_cli::run() {
        eprintln!("fieldroute: {err}");
        std::process::exit(1);
    }
}
