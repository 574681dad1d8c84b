use std::collections::HashSet;

use crate::domain::filter::{ListingQuery, SortOrder};
use crate::tests::utils::{insert_mls, make_db, make_engine, MlsSeed};

fn seed_numbered(db: &crate::db::Database, count: i64) {
    for i in 1..=count {
        insert_mls(
            db,
            &MlsSeed {
                id: i,
                number: format!("Q{i}"),
                price: 100_000 * i,
                // Three listings share each list date so the id tie-break
                // actually gets exercised.
                list_date: match i % 3 {
                    0 => "2026-08-01 10:00:00",
                    1 => "2026-08-02 10:00:00",
                    _ => "2026-08-03 10:00:00",
                },
                ..MlsSeed::default()
            },
        );
    }
}

#[test]
fn pages_partition_the_filtered_set() {
    let db = make_db("partition");
    seed_numbered(&db, 25);
    let engine = make_engine(db);

    for page_size in [7u32, 10, 25, 40] {
        let mut seen: HashSet<i64> = HashSet::new();
        let mut page_no = 1i64;
        loop {
            let page = engine
                .search(ListingQuery::default(), page_no, page_size)
                .unwrap();
            assert_eq!(page.total, 25);
            assert!(page.listings.len() <= page_size as usize);
            for l in &page.listings {
                // No listing may appear on two pages.
                assert!(seen.insert(l.id), "duplicate id {} at page {page_no}", l.id);
            }
            if page.listings.is_empty() {
                break;
            }
            page_no += 1;
        }
        // No omissions either: the union across pages is the whole set.
        assert_eq!(seen.len(), 25, "page size {page_size}");
    }
}

#[test]
fn page_beyond_the_end_keeps_the_total() {
    let db = make_db("beyond_end");
    seed_numbered(&db, 5);
    let engine = make_engine(db);

    let page = engine.search(ListingQuery::default(), 9, 20).unwrap();
    assert!(page.listings.is_empty());
    assert_eq!(page.total, 5);
    assert_eq!(page.page, 9);
}

#[test]
fn page_numbers_below_one_are_treated_as_one() {
    let db = make_db("clamp");
    seed_numbered(&db, 5);
    let engine = make_engine(db);

    let first = engine.search(ListingQuery::default(), 1, 3).unwrap();
    let clamped = engine.search(ListingQuery::default(), -2, 3).unwrap();

    assert_eq!(clamped.page, 1);
    let ids = |p: &crate::domain::page::PageResult| -> Vec<i64> {
        p.listings.iter().map(|l| l.id).collect()
    };
    assert_eq!(ids(&first), ids(&clamped));
}

#[test]
fn newest_sort_breaks_ties_by_larger_id_first() {
    let db = make_db("tie_break");
    seed_numbered(&db, 9);
    let engine = make_engine(db);

    let page = engine.search(ListingQuery::default(), 1, 9).unwrap();
    let ids: Vec<i64> = page.listings.iter().map(|l| l.id).collect();

    // 2026-08-03: ids 2,5,8 · 2026-08-02: ids 1,4,7 · 2026-08-01: ids 3,6,9.
    assert_eq!(ids, vec![8, 5, 2, 7, 4, 1, 9, 6, 3]);

    // Identical query, identical order.
    let again = engine.search(ListingQuery::default(), 1, 9).unwrap();
    let ids_again: Vec<i64> = again.listings.iter().map(|l| l.id).collect();
    assert_eq!(ids, ids_again);
}

#[test]
fn price_sorts_run_both_directions() {
    let db = make_db("price_sort");
    seed_numbered(&db, 4);
    let engine = make_engine(db);

    let desc = engine
        .search(
            ListingQuery { sort: SortOrder::PriceDesc, ..ListingQuery::default() },
            1,
            10,
        )
        .unwrap();
    let prices: Vec<i64> = desc.listings.iter().filter_map(|l| l.list_price).collect();
    assert_eq!(prices, vec![400_000, 300_000, 200_000, 100_000]);

    let asc = engine
        .search(
            ListingQuery { sort: SortOrder::PriceAsc, ..ListingQuery::default() },
            1,
            10,
        )
        .unwrap();
    let prices: Vec<i64> = asc.listings.iter().filter_map(|l| l.list_price).collect();
    assert_eq!(prices, vec![100_000, 200_000, 300_000, 400_000]);
}

#[test]
fn range_filters_compose_with_pagination() {
    let db = make_db("range_page");
    seed_numbered(&db, 20);
    let engine = make_engine(db);

    let query = ListingQuery {
        min_price: Some(500_000),
        max_price: Some(1_500_000),
        ..ListingQuery::default()
    };
    let page = engine.search(query.clone(), 1, 4).unwrap();
    assert_eq!(page.total, 11); // 500k..=1.5m in 100k steps
    assert_eq!(page.listings.len(), 4);

    let last = engine.search(query, 3, 4).unwrap();
    assert_eq!(last.total, 11);
    assert_eq!(last.listings.len(), 3);
}
