use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spanrec_core::{GoldSpan, Sample, TrainingParameters};
use spanrec_tagger::PerceptronTagger;

fn corpus() -> Vec<Sample> {
    let cities = ["Lisbon", "Porto", "Vigo", "Madrid", "Paris", "Lyon", "Braga", "Cádiz"];
    let people = ["Ana", "Bruno", "Carla", "Diego", "Elena", "Fabio", "Gema", "Hugo"];

    cities
        .iter()
        .zip(people.iter())
        .map(|(city, person)| {
            let tokens = [*person, "moved", "to", *city, "last", "year", "."];
            Sample::new(
                tokens.iter().map(|t| t.to_string()).collect(),
                vec![GoldSpan::new(0, 0, "PER"), GoldSpan::new(3, 3, "LOC")],
            )
        })
        .collect()
}

fn bench_tagger(c: &mut Criterion) {
    let samples = corpus();
    let params = TrainingParameters::new().with_iterations(10);
    let model = PerceptronTagger::new().fit(&samples, &params).unwrap();

    let inputs: Vec<Vec<&str>> = vec![
        vec!["Carla", "moved", "to", "Vigo", "last", "year", "."],
        vec!["Nobody", "went", "anywhere", "."],
        vec!["Hugo", "and", "Gema", "visited", "Lyon", "and", "Paris", "in", "May", "."],
    ];

    c.bench_function("tagger_find_single", |b| {
        b.iter(|| model.find_spans(black_box(&inputs[0])).unwrap());
    });

    c.bench_function("tagger_find_batch_3", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = model.find_spans(black_box(input)).unwrap();
            }
        });
    });

    c.bench_function("tagger_train_10_iterations", |b| {
        b.iter(|| PerceptronTagger::new().fit(black_box(&samples), &params).unwrap());
    });
}

criterion_group!(benches, bench_tagger);
criterion_main!(benches);
