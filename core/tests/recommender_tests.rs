use reelmatch_core::{Corpus, Document, IndexConfig, MovieRecommender, SimilarityIndex, DEFAULT_TOP_N};
use std::sync::Arc;
use std::thread;

fn corpus(movies: &[(&str, &str)]) -> Corpus {
    Corpus::from_documents(movies.iter().map(|(t, s)| Document::new(Some(*t), Some(*s))).collect())
}

fn built(movies: &[(&str, &str)]) -> MovieRecommender {
    let rec = MovieRecommender::new(IndexConfig::default());
    rec.build(corpus(movies));
    rec
}

const MOVIES: &[(&str, &str)] = &[
    ("Wizard School", "A young wizard attends a magic school."),
    ("City Rain", "A detective hunts a killer in a rainy city."),
    ("Dragon Heist", "A thief plans to steal gold from a sleeping dragon."),
    ("Rainy Days", "Two lovers meet on rainy afternoons in the city."),
    ("Space Farm", "A farmer grows potatoes on a distant planet."),
    ("Magic Detective", "A detective uses magic to solve a murder."),
];

#[test]
fn wizard_query_ranks_wizard_school_first() {
    let rec = built(&MOVIES[..2]);
    let results = rec.query("a wizard goes to a magic school", DEFAULT_TOP_N).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Wizard School");
    assert_eq!(results[0].storyline, "A young wizard attends a magic school.");
    assert!(results[0].score > 0.0);
    assert!(results.iter().all(|r| r.title != "City Rain"));
}

#[test]
fn scores_stay_in_unit_interval() {
    let rec = built(MOVIES);
    for q in ["magic detective city", "rainy rainy rainy", "dragon gold thief", MOVIES[3].1] {
        for r in rec.query(q, 10).unwrap() {
            assert!(r.score > 0.0 && r.score <= 1.0, "{q}: {}", r.score);
        }
    }
}

#[test]
fn own_storyline_ranks_first() {
    let rec = built(MOVIES);
    for (i, (title, storyline)) in MOVIES.iter().enumerate() {
        let results = rec.query(storyline, MOVIES.len()).unwrap();
        assert_eq!(results[0].title, *title);
        assert_eq!(results[0].id, i);
        assert!(results[0].score > 0.999);
        if let Some(next) = results.get(1) {
            assert!(results[0].score > next.score);
        }
    }
}

#[test]
fn results_are_sorted_descending() {
    let rec = built(MOVIES);
    let results = rec.query("a detective in a rainy city with magic", 10).unwrap();
    assert!(results.len() >= 3);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn out_of_vocabulary_query_is_empty() {
    let rec = built(MOVIES);
    assert!(rec.query("submarine volcano xylophone", 5).unwrap().is_empty());
    assert!(rec.query("the and of a", 5).unwrap().is_empty());
    assert!(rec.query("", 5).unwrap().is_empty());
    assert!(rec.query("?!...", 5).unwrap().is_empty());
}

#[test]
fn top_n_zero_and_no_padding() {
    let rec = built(MOVIES);
    assert!(rec.query("detective", 0).unwrap().is_empty());
    // only two storylines mention a detective
    let results = rec.query("detective", 5).unwrap();
    assert_eq!(results.len(), 2);
    let results = rec.query("detective", 1).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn zero_scores_are_filtered_before_truncation() {
    // The matching movie sits last; zero-score rows must not crowd it out.
    let rec = built(&[
        ("A", "farmers harvest wheat"),
        ("B", "pilots fly planes"),
        ("C", "sailors cross oceans"),
        ("D", "a vampire bites"),
    ]);
    let results = rec.query("vampire", 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "D");
}

#[test]
fn ties_keep_corpus_order() {
    let rec = built(&[
        ("Other", "pirates sail north"),
        ("First Twin", "a robot falls in love"),
        ("Unrelated", "cowboys ride west"),
        ("Second Twin", "A robot falls in love!"),
    ]);
    let results = rec.query("robot love", 5).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "First Twin");
    assert_eq!(results[1].title, "Second Twin");
    assert_eq!(results[0].score.to_bits(), results[1].score.to_bits());
}

#[test]
fn rebuild_is_bit_identical() {
    let docs = corpus(MOVIES);
    let a = SimilarityIndex::build(&docs, IndexConfig::default());
    let b = SimilarityIndex::build(&docs, IndexConfig::default());
    for q in ["magic detective", "rainy city lovers", "a young wizard", MOVIES[2].1] {
        let sa: Vec<u32> = a.scores(q).iter().map(|s| s.to_bits()).collect();
        let sb: Vec<u32> = b.scores(q).iter().map(|s| s.to_bits()).collect();
        assert_eq!(sa, sb, "{q}");
    }
}

#[test]
fn index_rows_match_corpus_length() {
    let docs = corpus(MOVIES);
    let index = SimilarityIndex::build(&docs, IndexConfig::default());
    assert_eq!(index.num_rows(), docs.len());
}

#[test]
fn empty_corpus_answers_nothing() {
    let rec = built(&[]);
    assert!(rec.is_built());
    assert!(rec.query("wizard", 5).unwrap().is_empty());
}

#[test]
fn rebuild_replaces_visible_state() {
    let rec = built(&MOVIES[..2]);
    assert!(rec.query("dragon", 5).unwrap().is_empty());
    rec.build(corpus(MOVIES));
    let results = rec.query("dragon", 5).unwrap();
    assert_eq!(results[0].title, "Dragon Heist");
}

#[test]
fn concurrent_readers_during_rebuild() {
    let rec = Arc::new(built(MOVIES));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let rec = Arc::clone(&rec);
            thread::spawn(move || {
                for _ in 0..200 {
                    let results = rec.query("a young wizard at magic school", 3).unwrap();
                    assert_eq!(results[0].title, "Wizard School");
                }
            })
        })
        .collect();
    for _ in 0..20 {
        rec.build(corpus(MOVIES));
    }
    for r in readers {
        r.join().unwrap();
    }
}
