// Criterion benchmarks for Unimate Match

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use unimate_match::core::{
    filters::{is_eligible, matches_filters},
    CandidateFilters, EligibilityContext, Matcher, Requester,
};
use unimate_match::models::{CandidateProfile, Gender, PreferenceVector, ScoringWeights};
use unimate_match::calculate_compatibility;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn create_candidate(id: usize) -> CandidateProfile {
    let rating = |offset: usize| ((id + offset) % 5 + 1) as u8;

    CandidateProfile {
        user_id: id as i64 + 2,
        name: format!("Student {}", id),
        email: format!("student{}@example.ac.kr", id),
        gender: if id % 2 == 0 { Gender::Female } else { Gender::Male },
        university: if id % 3 == 0 { "KAIST" } else { "Hanyang University" }.to_string(),
        birth_date: NaiveDate::from_ymd_opt(1995 + (id % 10) as i32, 1 + (id % 12) as u32, 1).unwrap(),
        start_use_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        end_use_date: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
        sleep_time: rating(0),
        cleaning_frequency: rating(1),
        hygiene_level: rating(2),
        noise_sensitivity: rating(3),
        drinking_frequency: rating(4),
        guest_frequency: rating(5),
        is_smoker: id % 7 == 0,
        is_pet_allowed: id % 4 == 0,
        is_snoring: id % 5 == 0,
        mbti: "ISTJ".to_string(),
        student_verified: id % 3 == 0,
        matching_enabled: id % 11 != 0,
    }
}

fn create_preference() -> PreferenceVector {
    PreferenceVector {
        user_id: 1,
        sleep_time: Some(3),
        cleaning_frequency: Some(4),
        hygiene_level: Some(4),
        noise_sensitivity: Some(2),
        drinking_frequency: Some(1),
        guest_frequency: None,
        is_smoker: Some(false),
        is_pet_allowed: None,
        is_snoring: Some(false),
        preferred_age_gap: Some(2),
    }
}

fn requester() -> Requester {
    Requester {
        user_id: 1,
        gender: Gender::Female,
        university: "Hanyang University".to_string(),
    }
}

fn bench_compatibility(c: &mut Criterion) {
    let preference = create_preference();
    let candidate = create_candidate(4);
    let weights = ScoringWeights::default();

    c.bench_function("calculate_compatibility", |b| {
        b.iter(|| {
            calculate_compatibility(
                black_box(Some(&preference)),
                black_box(Some(&candidate)),
                black_box(&weights),
                black_box(today()),
            )
        });
    });
}

fn bench_ranking(c: &mut Criterion) {
    let matcher = Matcher::with_default_weights();
    let preference = create_preference();
    let requester = requester();
    let filters = CandidateFilters::default();

    let mut group = c.benchmark_group("ranking");

    for candidate_count in [100, 1_000, 10_000].iter() {
        let candidates: Vec<CandidateProfile> = (0..*candidate_count).map(create_candidate).collect();
        let context = EligibilityContext {
            registered: candidates.iter().map(|c| c.user_id).collect(),
            ..Default::default()
        };

        group.bench_with_input(
            BenchmarkId::new("rank_candidates", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    matcher.rank_candidates(
                        black_box(&requester),
                        black_box(&preference),
                        black_box(&candidates),
                        black_box(&context),
                        black_box(&filters),
                        today(),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_filtering_pipeline(c: &mut Criterion) {
    let requester = requester();
    let candidates: Vec<CandidateProfile> = (0..1_000).map(create_candidate).collect();
    let context = EligibilityContext {
        registered: candidates.iter().map(|c| c.user_id).collect(),
        ..Default::default()
    };
    let filters = CandidateFilters::parse(Some("normal"), Some("26-28"), None, None, None)
        .expect("valid filters");

    c.bench_function("filtering_pipeline_1000_candidates", |b| {
        b.iter(|| {
            let filtered: Vec<_> = candidates
                .iter()
                .filter(|p| is_eligible(p, &requester, &context))
                .filter(|p| matches_filters(p, &filters, today()))
                .collect();

            black_box(filtered)
        });
    });
}

criterion_group!(benches, bench_compatibility, bench_ranking, bench_filtering_pipeline);

criterion_main!(benches);
