use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use super::stub_server::{StubResponse, StubServer};
use crate::catalog::{Catalog, Subject, Year};
use crate::config::ClientConfig;
use crate::difficulty::Difficulty;
use crate::download::download;
use crate::error::FetchError;
use crate::http::{Fetch, HttpClient, HttpResponse};
use crate::listing::Attachment;
use crate::retry::RetryPolicy;
use crate::walker::{CatalogWalker, FailureStage};

fn no_retry_client() -> HttpClient {
    HttpClient::new(&ClientConfig {
        retry: RetryPolicy::none(),
        ..ClientConfig::default()
    })
    .unwrap()
}

fn listing_html(entries: &[(&str, &str)]) -> String {
    let rows: String = entries
        .iter()
        .map(|(title, href)| {
            format!(
                r#"<tr><td class="attachment-title"><a class="attachment-link" href="{}">{}</a></td></tr>"#,
                href, title
            )
        })
        .collect();
    format!("<html><body><table>{}</table></body></html>", rows)
}

fn one_subject_catalog(quarters: Vec<String>) -> Catalog {
    Catalog {
        years: vec![Year {
            name: "First Year".to_string(),
            subjects: vec![Subject {
                name: "Mathematics".to_string(),
                quarters,
            }],
        }],
    }
}

/// Serves canned bodies from memory and records every requested URL.
struct MapFetch {
    pages: HashMap<String, Vec<u8>>,
    requested: RefCell<Vec<String>>,
}

impl Fetch for MapFetch {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.requested.borrow_mut().push(url.to_string());
        match self.pages.get(url) {
            Some(body) => Ok(HttpResponse {
                status: StatusCode::OK,
                body: body.clone(),
                headers: HeaderMap::new(),
            }),
            None => Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[test]
fn test_download_creates_missing_directory() {
    let server = StubServer::start(vec![(
        "/exam.pdf",
        vec![StubResponse::ok(vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xff, 0x10])],
    )]);
    let tmp = tempfile::tempdir().unwrap();
    let dest = tmp.path().join("First Year/Mathematics/Quarter 1/hard");
    assert!(!dest.exists());

    let attachment = Attachment {
        title: "Exam 1/2023".to_string(),
        link: server.url("/exam.pdf"),
    };
    let path = download(
        &no_retry_client(),
        &attachment,
        "Mathematics",
        Difficulty::Hard,
        &dest,
    )
    .unwrap();

    assert_eq!(path, dest.join("Exam_1_2023.pdf"));
    assert_eq!(
        fs::read(&path).unwrap(),
        vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xff, 0x10]
    );
}

#[test]
fn test_download_overwrites_existing_file() {
    let server = StubServer::start(vec![("/new.pdf", vec![StubResponse::ok("new")])]);
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("Old_Exam.pdf"), "old and longer").unwrap();

    let attachment = Attachment {
        title: "Old Exam".to_string(),
        link: server.url("/new.pdf"),
    };
    download(
        &no_retry_client(),
        &attachment,
        "Science",
        Difficulty::Easy,
        tmp.path(),
    )
    .unwrap();

    assert_eq!(fs::read(tmp.path().join("Old_Exam.pdf")).unwrap(), b"new");
}

#[test]
fn test_failed_download_does_not_stop_the_listing() {
    let server = StubServer::start(vec![
        ("/a.pdf", vec![StubResponse::ok("first")]),
        ("/b.pdf", vec![StubResponse::status(404)]),
        ("/c.pdf", vec![StubResponse::ok("third")]),
    ]);
    let html = listing_html(&[
        ("Exam A", server.url("/a.pdf").as_str()),
        ("Exam B", server.url("/b.pdf").as_str()),
        ("Exam C", server.url("/c.pdf").as_str()),
    ]);
    server.route("/q1", vec![StubResponse::ok(html)]);

    let tmp = tempfile::tempdir().unwrap();
    let catalog = one_subject_catalog(vec![server.url("/q1")]);
    let mut walker = CatalogWalker::new(no_retry_client(), StdRng::seed_from_u64(1), tmp.path());
    let summary = walker.run(&catalog).unwrap();

    assert_eq!(server.hits("/c.pdf"), 1);
    let titles: Vec<&str> = summary.downloaded.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Exam A", "Exam C"]);

    assert_eq!(summary.failures.len(), 1);
    let failure = &summary.failures[0];
    assert_eq!(failure.stage, FailureStage::Download);
    assert_eq!(failure.target, "Exam B");
    assert_eq!(failure.quarter, 1);
    assert!(failure.message.contains("404"), "{}", failure.message);

    for record in &summary.downloaded {
        let expected_dir = tmp
            .path()
            .join("First Year")
            .join("Mathematics")
            .join("Quarter 1")
            .join(record.difficulty.as_str());
        assert_eq!(record.path.parent().unwrap(), expected_dir);
        assert!(record.path.is_file());
    }
}

#[test]
fn test_failed_listing_moves_to_next_quarter() {
    let server = StubServer::start(vec![("/q1", vec![StubResponse::status(404)])]);
    let html = listing_html(&[("Exam Q2", server.url("/q2.pdf").as_str())]);
    server.route("/q2", vec![StubResponse::ok(html)]);
    server.route("/q2.pdf", vec![StubResponse::ok("q2")]);

    let tmp = tempfile::tempdir().unwrap();
    let catalog = one_subject_catalog(vec![server.url("/q1"), server.url("/q2")]);
    let mut walker = CatalogWalker::new(no_retry_client(), StdRng::seed_from_u64(2), tmp.path());
    let summary = walker.run(&catalog).unwrap();

    assert_eq!(summary.listings_fetched, 1);
    let failures: Vec<_> = summary.failures_in(FailureStage::Listing).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].target, server.url("/q1"));

    assert_eq!(summary.downloaded.len(), 1);
    assert_eq!(summary.downloaded[0].quarter, 2);

    // Quarter directories exist even when their listing failed
    let subject_dir = tmp.path().join("First Year").join("Mathematics");
    assert!(subject_dir.join("Quarter 1").is_dir());
    assert!(subject_dir.join("Quarter 2").is_dir());
    assert!(summary.finished_at.is_some());
}

#[test]
fn test_save_failure_is_recorded_and_walk_continues() {
    let mut pages = HashMap::new();
    pages.insert(
        "listing".to_string(),
        listing_html(&[("Blocked", "blocked"), ("Fine", "fine")]).into_bytes(),
    );
    pages.insert("blocked".to_string(), b"x".to_vec());
    pages.insert("fine".to_string(), b"y".to_vec());
    let client = MapFetch {
        pages,
        requested: RefCell::new(Vec::new()),
    };

    // A directory where the file should go makes the write fail
    let tmp = tempfile::tempdir().unwrap();
    let quarter_dir = tmp.path().join("First Year/Mathematics/Quarter 1");
    for difficulty in Difficulty::ALL {
        fs::create_dir_all(quarter_dir.join(difficulty.as_str()).join("Blocked.pdf")).unwrap();
    }

    let catalog = one_subject_catalog(vec!["listing".to_string()]);
    let mut walker = CatalogWalker::new(client, StdRng::seed_from_u64(3), tmp.path());
    let summary = walker.run(&catalog).unwrap();

    let saves: Vec<_> = summary.failures_in(FailureStage::Save).collect();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].target, "Blocked");
    assert_eq!(summary.downloaded.len(), 1);
    assert_eq!(summary.downloaded[0].title, "Fine");
}

#[test]
fn test_requests_follow_catalog_and_document_order() {
    let mut pages = HashMap::new();
    pages.insert(
        "q1".to_string(),
        listing_html(&[("One", "one"), ("Two", "two")]).into_bytes(),
    );
    pages.insert("q2".to_string(), listing_html(&[]).into_bytes());
    pages.insert("one".to_string(), b"1".to_vec());
    pages.insert("two".to_string(), b"2".to_vec());
    let client = MapFetch {
        pages,
        requested: RefCell::new(Vec::new()),
    };

    let tmp = tempfile::tempdir().unwrap();
    let catalog = one_subject_catalog(vec!["q1".to_string(), "q2".to_string()]);
    let mut walker = CatalogWalker::new(client, StdRng::seed_from_u64(4), tmp.path());
    let summary = walker.run(&catalog).unwrap();

    assert_eq!(summary.listings_fetched, 2);
    assert!(summary.failures.is_empty());
    assert_eq!(
        *walker.client().requested.borrow(),
        vec!["q1", "one", "two", "q2"]
    );
}

#[test]
fn test_same_seed_gives_same_layout() {
    let mut pages = HashMap::new();
    let entries: Vec<(String, String)> = (0..8)
        .map(|i| (format!("Exam {}", i), format!("file{}", i)))
        .collect();
    let refs: Vec<(&str, &str)> = entries
        .iter()
        .map(|(t, l)| (t.as_str(), l.as_str()))
        .collect();
    pages.insert("q1".to_string(), listing_html(&refs).into_bytes());
    for (_, link) in &entries {
        pages.insert(link.clone(), b"pdf".to_vec());
    }

    let layout = |seed: u64| {
        let tmp = tempfile::tempdir().unwrap();
        let client = MapFetch {
            pages: pages.clone(),
            requested: RefCell::new(Vec::new()),
        };
        let mut walker = CatalogWalker::new(client, StdRng::seed_from_u64(seed), tmp.path());
        let summary = walker.run(&one_subject_catalog(vec!["q1".to_string()])).unwrap();
        summary
            .downloaded
            .iter()
            .map(|d| d.difficulty)
            .collect::<Vec<_>>()
    };

    assert_eq!(layout(42), layout(42));
}

#[test]
fn test_unwritable_root_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("not-a-dir");
    fs::write(&root, "file in the way").unwrap();

    let client = MapFetch {
        pages: HashMap::new(),
        requested: RefCell::new(Vec::new()),
    };
    let mut walker = CatalogWalker::new(client, StdRng::seed_from_u64(5), &root);
    let err = walker
        .run(&one_subject_catalog(vec!["q1".to_string()]))
        .unwrap_err();

    assert!(
        err.to_string().contains("Failed to create directory"),
        "{err}"
    );
    assert!(Path::new(&root).is_file());
}

#[test]
fn test_summary_serializes_to_json() {
    let mut pages = HashMap::new();
    pages.insert(
        "q1".to_string(),
        listing_html(&[("Only", "only")]).into_bytes(),
    );
    pages.insert("only".to_string(), b"data".to_vec());
    let client = MapFetch {
        pages,
        requested: RefCell::new(Vec::new()),
    };

    let tmp = tempfile::tempdir().unwrap();
    let mut walker = CatalogWalker::new(client, StdRng::seed_from_u64(6), tmp.path().join("out"));
    let summary = walker
        .run(&one_subject_catalog(vec!["q1".to_string(), "q2".to_string()]))
        .unwrap();

    let json_path = tmp.path().join("summary.json");
    summary.save_json(&json_path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();

    assert_eq!(value["listings_fetched"], 1);
    assert_eq!(value["downloaded"][0]["title"], "Only");
    assert_eq!(value["failures"][0]["stage"], "listing");
    assert_eq!(value["failures"][0]["target"], "q2");
}
