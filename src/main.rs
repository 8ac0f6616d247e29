use bookstore_client::application::cart_store::CartStore;
use bookstore_client::domain::ports::BookCatalog;
use bookstore_client::domain::session::SessionContext;
use bookstore_client::infrastructure::http_store::HttpRemoteStore;
use bookstore_client::infrastructure::kv_store::DieselKeyValueStore;
use bookstore_client::{create_pool, run_migrations, ClientConfig};
use dotenvy::dotenv;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = ClientConfig::from_env()?;

    let pool = create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let cart = CartStore::open(DieselKeyValueStore::new(pool), config.cart_key.as_str());
    let remote =
        HttpRemoteStore::new(&config.api_url, config.http_timeout, SessionContext::anonymous())?;

    log::info!("using bookstore backend at {}", config.api_url);

    match remote.list_newest().await {
        Ok(books) => {
            println!("Newest books:");
            for book in books {
                println!("  {:<40} {:<24} {}", book.title, book.author, book.price);
            }
        }
        Err(e) => log::warn!("could not load newest books: {}", e),
    }

    let snapshot = cart.snapshot();
    println!("Cart ({} item(s), total {}):", cart.total_items(), cart.total_price());
    for line in snapshot.lines() {
        println!("  {} x {} @ {}", line.quantity, line.title, line.price);
    }

    Ok(())
}
