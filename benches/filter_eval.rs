use criterion::{black_box, criterion_group, criterion_main, Criterion};

use deck_editor::cards::{Card, CardId, Expansion, Face, Inventory, Legality, ManaCost, Rarity};
use deck_editor::deck::{CategorySpec, Deck};
use deck_editor::filter::Filter;

const COSTS: [&str; 6] = ["{R}", "{1}{G}", "{2}{W}{W}", "{X}{U}", "{3}{B}{B}", ""];
const TYPES: [&str; 5] = ["Creature", "Instant", "Sorcery", "Land", "Artifact"];

fn inventory(size: usize) -> Inventory {
    let expansion = std::sync::Arc::new(Expansion::new("Bench Set", "BEN"));
    let cards = (0..size)
        .map(|i| {
            let face = Face::new(format!("Card {i}"))
                .with_mana_cost(ManaCost::parse(COSTS[i % COSTS.len()]).unwrap_or_default())
                .with_types([TYPES[i % TYPES.len()]])
                .with_rules_text(format!("When Card {i} enters the battlefield, draw {} cards.", i % 4))
                .with_stats(&(i % 7).to_string(), &(i % 5).to_string());
            Card::new(CardId::new(format!("c{i}")), expansion.clone(), Rarity::Common, vec![face])
                .with_legality("legacy", if i % 11 == 0 { Legality::Banned } else { Legality::Legal })
        })
        .collect();
    Inventory::new(cards)
}

fn filter() -> Filter {
    Filter::parse(
        "<AND <OR <cardtype:a{Creature,Artifact}> <o:c ~ enters>> <cmc:\\<=3> <legal:a{legacy}> <p:\\>=2>>",
    )
    .unwrap()
}

fn bench_matches(c: &mut Criterion) {
    let inventory = inventory(20_000);
    let filter = filter();
    c.bench_function("filter_inventory_20k", |b| {
        b.iter(|| black_box(inventory.filter(&filter).count()))
    });
}

fn bench_codec(c: &mut Criterion) {
    let filter = filter();
    let text = filter.to_string();
    c.bench_function("filter_parse", |b| b.iter(|| Filter::parse(black_box(&text)).unwrap()));
    c.bench_function("filter_to_json", |b| b.iter(|| black_box(&filter).to_json()));
}

fn bench_category_refresh(c: &mut Criterion) {
    let inventory = inventory(2_000);
    let mut deck = Deck::new();
    deck.add_all(inventory.iter().take(250), 1);
    let spec = CategorySpec::new("Bench", filter());
    c.bench_function("add_category_250", |b| {
        b.iter(|| {
            let mut deck = deck.clone();
            deck.add_category(spec.clone()).unwrap();
            black_box(deck)
        })
    });
}

criterion_group!(benches, bench_matches, bench_codec, bench_category_refresh);
criterion_main!(benches);
