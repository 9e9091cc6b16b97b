fn main() {
    if let Err(err) = dkp_roster::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
