use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use mockito::{Matcher, Server};
use pictor::app::{BatchJobManager, FetchRetryConfig, ImageFetchService, SlotJobState, SlotUpdate};
use pictor::domain::{AspectRatio, BatchRequest};
use pictor::infra::image::PollinationsClient;

const JPEG_MAGIC: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

fn manager_for(server: &Server) -> BatchJobManager {
    let client = PollinationsClient::with_config(server.url(), Duration::from_secs(2))
        .expect("client should build");
    let service = ImageFetchService::with_retry_config(
        Arc::new(client),
        FetchRetryConfig {
            max_retries: 3,
            backoff: Duration::from_millis(1),
        },
    );
    BatchJobManager::with_max_edge(service, 512).expect("batch coordinator should start")
}

fn request(prompt: &str, image_count: u8, ratio: &str) -> BatchRequest {
    BatchRequest {
        prompt: prompt.to_string(),
        image_count,
        aspect_ratio: AspectRatio::parse(ratio).expect("ratio should parse"),
    }
}

fn drain_until(
    manager: &BatchJobManager,
    collected: &mut Vec<SlotUpdate>,
    predicate: impl Fn(&[SlotUpdate]) -> bool,
    timeout: Duration,
) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        collected.extend(manager.drain_updates());
        if predicate(collected) {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }

    panic!("condition was not met within {timeout:?}; collected: {collected:?}");
}

fn terminal_updates<'a>(updates: &'a [SlotUpdate], batch_id: u64) -> Vec<&'a SlotUpdate> {
    updates
        .iter()
        .filter(|update| update.batch_id == batch_id && update.is_terminal())
        .collect()
}

#[test]
fn batch_resolves_every_slot_against_the_endpoint() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", Matcher::Regex("^/prompt/.*".to_string()))
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(JPEG_MAGIC.to_vec())
        .expect(3)
        .create();

    let manager = manager_for(&server);
    let batch_id = manager
        .submit_batch(request("a magic forest", 3, "1/1"))
        .expect("submit should succeed");

    let mut updates = Vec::new();
    drain_until(
        &manager,
        &mut updates,
        |updates| terminal_updates(updates, batch_id).len() == 3,
        Duration::from_millis(4000),
    );

    mock.assert();

    let terminal = terminal_updates(&updates, batch_id);
    let indices: BTreeSet<usize> = terminal.iter().map(|update| update.slot_index).collect();
    assert_eq!(
        indices,
        BTreeSet::from([0, 1, 2]),
        "each slot index appears exactly once with no index skipped or reused"
    );

    for update in terminal {
        assert_eq!(update.state, SlotJobState::Succeeded);
        let image = update.image.as_ref().expect("success carries the image");
        assert_eq!(image.bytes, JPEG_MAGIC.to_vec());
        assert!(image.url.contains("width=512"));
        assert!(image.url.contains("nologo=true"));
    }
}

#[test]
fn every_slot_fails_terminally_after_spending_its_own_retry_budget() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", Matcher::Regex("^/prompt/.*".to_string()))
        .with_status(500)
        .with_body("boom")
        .expect(8)
        .create();

    let manager = manager_for(&server);
    let batch_id = manager
        .submit_batch(request("a magic forest", 2, "16/9"))
        .expect("submit should succeed");

    let mut updates = Vec::new();
    drain_until(
        &manager,
        &mut updates,
        |updates| terminal_updates(updates, batch_id).len() == 2,
        Duration::from_millis(4000),
    );

    // Two slots, four attempts each, and no cross-slot coordination that
    // could stop the second slot early.
    mock.assert();

    for update in terminal_updates(&updates, batch_id) {
        assert_eq!(update.state, SlotJobState::Failed);
        assert!(update.error.is_some());
        assert!(update.image.is_none());
    }
}

#[test]
fn terminal_slot_states_are_final_within_a_batch() {
    let mut server = Server::new();
    server
        .mock("GET", Matcher::Regex("^/prompt/.*".to_string()))
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(JPEG_MAGIC.to_vec())
        .create();

    let manager = manager_for(&server);
    let batch_id = manager
        .submit_batch(request("a magic forest", 1, "1/1"))
        .expect("submit should succeed");

    let mut updates = Vec::new();
    drain_until(
        &manager,
        &mut updates,
        |updates| terminal_updates(updates, batch_id).len() == 1,
        Duration::from_millis(4000),
    );

    thread::sleep(Duration::from_millis(100));
    updates.extend(manager.drain_updates());

    assert_eq!(
        terminal_updates(&updates, batch_id).len(),
        1,
        "a slot reaches exactly one terminal state"
    );
}
