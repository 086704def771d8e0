//! End-to-end retrieval flow: chunk raw text, persist it with
//! embeddings, reload the snapshot, rank against a query vector, and
//! assemble the context block and fallback answer.

use carhelper_backend::rag::{chunk_text, format_context, pick_answer, SqliteStore};

fn one_hot(dim: usize, hot: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dim];
    v[hot] = 1.0;
    v
}

#[tokio::test]
async fn ingest_then_retrieve_end_to_end() {
    let db_path = std::env::temp_dir().join(format!("carhelper-flow-{}.db", uuid::Uuid::new_v4()));
    let store = SqliteStore::new(db_path).await.unwrap();

    let notes = "\
        Oil change done at 154 200 km with 5w30 full synthetic, filter swapped at the same time.\n\
        Front brake pads replaced, the old ones were down to three millimeters on the inner edge.\n\
        Coolant flushed in spring, used G12 compatible fluid and bled the system twice.\n\
        Timing belt and water pump scheduled for next summer together with the aux belt.\n";

    let chunks = chunk_text(notes, 120, 20);
    assert!(chunks.len() >= 2);

    let dim = chunks.len();
    let embeddings: Vec<Vec<f32>> = (0..dim).map(|i| one_hot(dim, i)).collect();

    store
        .replace_source("notes", "notes.md", &chunks, &embeddings)
        .await
        .unwrap();

    let snapshot = store.load_chunks(dim).await.unwrap();
    assert_eq!(snapshot.len(), chunks.len());

    // A query colinear with chunk 1's embedding must rank it first.
    let hits = snapshot.search(&one_hot(dim, 1), 3).unwrap();
    assert_eq!(hits[0].index, 1);
    assert!(hits.len() <= 3);

    let ranked: Vec<usize> = hits.iter().map(|hit| hit.index).collect();
    let context = format_context(
        &ranked,
        snapshot.sources(),
        snapshot.refs(),
        snapshot.texts(),
        900,
        6000,
    );
    assert!(context.starts_with("[1] source=notes ref=notes.md"));
    assert!(context.chars().count() <= 6000);

    let answer = pick_answer(&ranked, snapshot.texts());
    assert!(!answer.is_empty());
    assert!(answer.chars().count() <= 600);
}
