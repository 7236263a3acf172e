fn main() {
    if let Err(e) = brokerpad_cli::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
