#[tokio::main]
async fn main() {
    rentora::start_server().await;
}
