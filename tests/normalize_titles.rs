// tests/normalize_titles.rs
use trend_radar::fetch::types::RawCandidate;
use trend_radar::normalize::{
    clean_title, infer_category, match_key, normalize_candidate, Category, Language,
};

fn raw(source: &str, title: &str) -> RawCandidate {
    RawCandidate {
        title: title.to_string(),
        url: Some("https://example.test/a".into()),
        source: source.to_string(),
        published_at: 1_780_000_000,
        author: None,
        category_hint: None,
    }
}

#[test]
fn normalization_is_idempotent() {
    let titles = [
        "Company X raises $50M",
        "  <b>Breaking:</b> Storm batters northern coast!!! ",
        "Parliament passes budget bill",
    ];
    for t in titles {
        let key = match_key(t);
        assert_eq!(match_key(&key), key, "match_key not idempotent for {t:?}");
        let cleaned = clean_title(t);
        assert_eq!(clean_title(&cleaned), cleaned, "clean_title not idempotent for {t:?}");
    }
}

#[test]
fn non_english_titles_are_filtered() {
    let n = normalize_candidate(&raw("bbc", "速報 これはニュースです"), None);
    assert_eq!(n.language, Language::NonEnglish);
    assert!(!n.accepted);

    let n = normalize_candidate(&raw("bbc", "Storm batters northern coast"), None);
    assert_eq!(n.language, Language::English);
    assert!(n.accepted);
}

#[test]
fn money_shorthand_and_spelled_out_agree() {
    assert_eq!(match_key("Company X raises $50M"), "company x 50 million");
    assert_eq!(
        match_key("Company X funding round hits $50 million"),
        "company x funding round 50 million"
    );
}

#[test]
fn markup_is_stripped_from_display_title() {
    let n = normalize_candidate(&raw("verge", "<em>New&nbsp;chip</em> ships today."), None);
    assert_eq!(n.title, "New chip ships today");
}

#[test]
fn category_falls_back_to_general() {
    assert_eq!(infer_category(None, "Quiet afternoon in town", None), Category::General);
    assert_eq!(
        infer_category(None, "Senate vote on the election bill", None),
        Category::Politics
    );
    assert_eq!(
        infer_category(Some("nba"), "whatever", Some(Category::News)),
        Category::Sports
    );
}
