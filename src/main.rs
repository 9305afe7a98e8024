//! Modsync binary entry point.

fn main() {
    if let Err(err) = modsync::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
