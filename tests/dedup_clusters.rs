// tests/dedup_clusters.rs
use trend_radar::dedup::{cluster_candidates, similarity};
use trend_radar::fetch::types::RawCandidate;
use trend_radar::normalize::{normalize_candidate, NormalizedCandidate};
use trend_radar::sources::SourceWeights;

fn candidate(source: &str, title: &str, ts: u64) -> NormalizedCandidate {
    normalize_candidate(
        &RawCandidate {
            title: title.to_string(),
            url: None,
            source: source.to_string(),
            published_at: ts,
            author: None,
            category_hint: None,
        },
        None,
    )
}

fn weights() -> SourceWeights {
    SourceWeights::from_catalog(&[])
}

#[test]
fn same_story_across_sources_merges_and_sports_stays_apart() {
    let input = vec![
        candidate("npr", "Company X raises $50M", 1_000),
        candidate("techcrunch", "Company X funding round hits $50 million", 1_100),
        candidate("espn", "Unrelated sports score", 1_200),
    ];
    let clusters = cluster_candidates(0.8, &weights(), input);

    assert_eq!(clusters.len(), 2);
    let funding = &clusters[0];
    assert_eq!(funding.members.len(), 2);
    assert_eq!(funding.distinct_source_count(), 2);
    assert_eq!(funding.first_seen, 1_000);
    assert_eq!(funding.last_seen, 1_100);

    let sports = &clusters[1];
    assert_eq!(sports.members.len(), 1);
    assert_eq!(sports.distinct_source_count(), 1);
}

#[test]
fn every_member_is_similar_to_its_representative() {
    let input = vec![
        candidate("npr", "Company X raises $50M", 1_000),
        candidate("bbc", "Company X funding round hits $50 million", 1_050),
        candidate("techcrunch", "Company X raises $50M in funding", 1_100),
        candidate("espn", "Unrelated sports score", 1_200),
        candidate("verge", "New compiler release cuts build times", 1_300),
    ];
    let clusters = cluster_candidates(0.8, &weights(), input);

    for cluster in &clusters {
        let rep = &cluster.representative().normalized_title;
        for member in &cluster.members {
            assert!(
                similarity(&member.normalized_title, rep) >= 0.8,
                "member {:?} below threshold against {:?}",
                member.normalized_title,
                rep
            );
        }
    }
}

#[test]
fn clustering_is_deterministic() {
    let build = || {
        vec![
            candidate("npr", "Company X raises $50M", 1_000),
            candidate("bbc", "Company X funding round hits $50 million", 1_050),
            candidate("espn", "Unrelated sports score", 1_200),
            candidate("verge", "New compiler release cuts build times", 1_300),
        ]
    };
    let a = cluster_candidates(0.8, &weights(), build());
    let b = cluster_candidates(0.8, &weights(), build());

    assert_eq!(a.len(), b.len());
    for (ca, cb) in a.iter().zip(b.iter()) {
        assert_eq!(ca.members.len(), cb.members.len());
        assert_eq!(ca.representative_title(), cb.representative_title());
        let ta: Vec<_> = ca.members.iter().map(|m| m.title.clone()).collect();
        let tb: Vec<_> = cb.members.iter().map(|m| m.title.clone()).collect();
        assert_eq!(ta, tb);
    }
}

#[test]
fn below_threshold_titles_open_their_own_clusters() {
    let input = vec![
        candidate("npr", "Storm batters northern coast", 1_000),
        candidate("bbc", "Parliament passes budget bill", 1_100),
        candidate("verge", "New compiler release cuts build times", 1_200),
    ];
    let clusters = cluster_candidates(0.8, &weights(), input);
    assert_eq!(clusters.len(), 3);
}

#[test]
fn members_keep_discovery_order() {
    let input = vec![
        candidate("npr", "Company X raises $50M", 1_000),
        candidate("bbc", "Company X funding round hits $50 million", 900),
        candidate("techcrunch", "Company X raises $50M in funding", 1_100),
    ];
    let clusters = cluster_candidates(0.8, &weights(), input);
    assert_eq!(clusters.len(), 1);
    let sources: Vec<_> = clusters[0]
        .members
        .iter()
        .map(|m| m.raw.source.as_str())
        .collect();
    // insertion order = discovery order, regardless of timestamps
    assert_eq!(sources, vec!["npr", "bbc", "techcrunch"]);
}
