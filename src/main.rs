fn main() {
    if let Err(err) = well_dedup::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
