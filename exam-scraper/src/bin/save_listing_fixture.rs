use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::Path;

use exam_scraper::config::ClientConfig;
use exam_scraper::logging::init_logging;
use exam_scraper::retry::RetryPolicy;
use exam_scraper::{parse_listing, Fetch, HttpClient};

fn main() -> Result<()> {
    init_logging(false);

    // Get URL and fixture name from command line arguments
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Please provide a listing URL and a fixture name");
        eprintln!("Usage: cargo run --bin save_listing_fixture <URL> <fixture_name>");
        std::process::exit(1);
    }

    let url = &args[1];
    let fixture_name = &args[2];

    println!("Fetching listing from {}...", url);

    let config = ClientConfig {
        retry: RetryPolicy::none(),
        ..ClientConfig::default()
    };
    let client = HttpClient::new(&config).context("Failed to set up HTTP session")?;
    let response = client.get(url).context("Failed to fetch listing page")?;
    let html = String::from_utf8_lossy(&response.body);

    // Create the listings fixture directory if it doesn't exist
    let listings_dir = Path::new("src/tests/fixtures/listings");
    fs::create_dir_all(listings_dir).context("Failed to create listings fixture directory")?;

    let file_path = listings_dir.join(format!("{}.html", fixture_name));
    fs::write(&file_path, html.as_bytes()).context("Failed to write HTML file")?;

    println!(
        "Saved HTML to {} for regression testing",
        file_path.display()
    );

    let attachments = parse_listing(&html);
    if attachments.is_empty() {
        println!("⚠️ No attachments found. The page layout may have changed.");
    } else {
        println!("Found {} attachments:", attachments.len());
        for (index, attachment) in attachments.iter().enumerate() {
            println!("{}. {}", index + 1, attachment.title);
            println!("   {}", attachment.link);
        }
    }

    Ok(())
}
