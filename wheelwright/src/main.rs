fn main() {
    if let Err(e) = wheelwright::run_cli() {
        eprintln!("Error: {e:#}");
        std::process::exit(wheelwright::exit_code(&e));
    }
}
