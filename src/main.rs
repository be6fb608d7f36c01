fn main() {
    if let Err(err) = relation_graph::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
