//! Property tests for vector index search ordering.

use gutrag::document::Chunk;
use gutrag::index::VectorIndex;
use proptest::prelude::*;

const DIM: usize = 16;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-3 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Turn generated embeddings into chunks numbered in insertion order.
fn chunks_from(embeddings: Vec<Vec<f32>>) -> Vec<Chunk> {
    embeddings
        .into_iter()
        .enumerate()
        .map(|(i, embedding)| Chunk {
            id: format!("doc_0_{i}"),
            text: format!("chunk {i}"),
            document_id: "doc_0".to_string(),
            position: i,
            embedding,
        })
        .collect()
}

fn position_of(id: &str) -> usize {
    id.rsplit('_').next().and_then(|n| n.parse().ok()).unwrap()
}

/// **Property 1: Search ordering**
/// *For any* set of indexed chunks and query, search SHALL return at most
/// `top_k` results ordered by descending score, with equal scores kept in
/// insertion order.
mod prop_search_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 0..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let count = embeddings.len();
            let index = VectorIndex::build("test/1", DIM, chunks_from(embeddings)).unwrap();
            let results = index.search(&query, top_k).unwrap();

            prop_assert_eq!(results.len(), top_k.min(count));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
                if window[0].score == window[1].score {
                    prop_assert!(
                        position_of(&window[0].chunk.id) < position_of(&window[1].chunk.id)
                    );
                }
            }
        }

        #[test]
        fn duplicated_vectors_tie_in_insertion_order(
            embedding in arb_normalized_embedding(DIM),
            copies in 2usize..6,
        ) {
            let index = VectorIndex::build(
                "test/1",
                DIM,
                chunks_from(vec![embedding.clone(); copies]),
            )
            .unwrap();
            let results = index.search(&embedding, copies).unwrap();
            let positions: Vec<usize> = results.iter().map(|r| position_of(&r.chunk.id)).collect();
            prop_assert_eq!(positions, (0..copies).collect::<Vec<_>>());
        }
    }
}

/// **Property 2: Self-similarity**
/// *For any* indexed chunk, querying with that chunk's own vector SHALL
/// return it as the top (or tied-top) result.
mod prop_self_similarity {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn chunk_vector_finds_itself(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            pick in any::<prop::sample::Index>(),
        ) {
            let target = pick.index(embeddings.len());
            let query = embeddings[target].clone();
            let index = VectorIndex::build("test/1", DIM, chunks_from(embeddings)).unwrap();
            let results = index.search(&query, index.len()).unwrap();

            let top_score = results[0].score;
            let target_result = results
                .iter()
                .find(|r| position_of(&r.chunk.id) == target)
                .unwrap();
            prop_assert!((top_score - target_result.score).abs() < 1e-5);
        }
    }
}

/// **Property 3: Determinism**
/// Building the index twice from the same vectors SHALL yield identical
/// results for the same query.
mod prop_determinism {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn rebuilt_index_answers_identically(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
        ) {
            let first = VectorIndex::build("test/1", DIM, chunks_from(embeddings.clone())).unwrap();
            let second = VectorIndex::build("test/1", DIM, chunks_from(embeddings)).unwrap();
            prop_assert_eq!(first.search(&query, 5).unwrap(), second.search(&query, 5).unwrap());
        }
    }
}
