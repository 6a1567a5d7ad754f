fn main() {
    if let Err(err) = hippo::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
