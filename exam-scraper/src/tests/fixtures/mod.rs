use std::fs;
use std::path::{Path, PathBuf};

/// Load test HTML fixture by name
pub fn load_html_fixture(fixture_name: &str) -> String {
    let path = Path::new("src/tests/fixtures").join(format!("{}.html", fixture_name));
    fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to load test fixture: {}", fixture_name))
}

/// Listing pages under `fixtures/listings/`. `first_year_math_q1.html` is a
/// hand-written page in the site's table layout, not a capture; real pages
/// saved with `save_listing_fixture` land next to it.
pub fn saved_listing_paths() -> Vec<PathBuf> {
    let dir = Path::new("src/tests/fixtures/listings");
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "html"))
        .collect();
    paths.sort();
    paths
}
