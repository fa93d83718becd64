#[tokio::main]
async fn main() {
    if let Err(e) = transdoc_lib::run().await {
        eprintln!("transdoc failed to start: {e}");
        std::process::exit(1);
    }
}
