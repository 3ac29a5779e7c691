fn main() {
    if let Err(e) = cvtext_lib::run() {
        eprintln!("cvtext: {e}");
        std::process::exit(1);
    }
}
