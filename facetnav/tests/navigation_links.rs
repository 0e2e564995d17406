//! Navigation links followed end to end: every link the response hands out
//! is fed back in as the next query string.

use std::sync::Arc;

use facetnav::{Endpoint, MemoryBackend, SearchResponse, SortSpec, parse_query_string};
use serde_json::json;

fn backend() -> MemoryBackend {
    let fixture = json!({
        "products": [
            {"id": "p1", "brand": "acme", "price": 10},
            {"id": "p2", "brand": "acme", "price": 20},
            {"id": "p3", "brand": "zenith", "price": 30},
            {"id": "p4", "brand": "zenith", "price": 40},
            {"id": "p5", "brand": "orbit", "price": 50}
        ]
    });
    let indices = facetnav::backend::load_indices(fixture).unwrap();
    MemoryBackend::new()
        .with_indices(indices)
        .with_facet("brand")
        .with_sort(SortSpec::new("cheap", "price", true))
        .with_sort(SortSpec::new("pricey", "price", false))
}

async fn search(query: &str) -> SearchResponse {
    let endpoint = Endpoint::new(Arc::new(backend()), vec!["products".to_string()]);
    let result = endpoint.execute(parse_query_string(query)).await.unwrap();
    SearchResponse::from_result(result)
}

fn ids(response: &SearchResponse) -> Vec<String> {
    response
        .hits
        .iter()
        .map(|hit| hit["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn next_links_walk_every_page() {
    let mut query = "size=2".to_string();
    let mut seen = Vec::new();
    let mut pages = 0;

    loop {
        let response = search(&query).await;
        seen.extend(ids(&response));
        pages += 1;

        let pagination = response.pages.unwrap();
        assert_eq!(pagination.count, 3);
        assert_eq!(pagination.current, pages);
        match pagination.next {
            Some(next) => query = next,
            None => break,
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(seen, ["p1", "p2", "p3", "p4", "p5"]);
    assert_eq!(query, "size=2&offset=4");
}

#[tokio::test]
async fn previous_link_returns_to_prior_page() {
    let response = search("size=2&offset=2").await;
    let previous = response.pages.unwrap().previous.unwrap();
    assert_eq!(previous, "size=2&offset=0");

    let back = search(&previous).await;
    assert_eq!(ids(&back), ["p1", "p2"]);
    assert!(back.pages.unwrap().previous.is_none());
}

#[tokio::test]
async fn bucket_link_narrows_to_bucket_count() {
    let response = search("").await;
    let brands = &response.buckets["brand"];
    let values: Vec<_> = brands.iter().map(|bucket| bucket.value.clone()).collect();
    assert_eq!(values, [json!("acme"), json!("zenith"), json!("orbit")]);

    for bucket in brands {
        let narrowed = search(&bucket.query).await;
        assert_eq!(narrowed.total_hit_count, bucket.count, "following {}", bucket.query);
    }
}

#[tokio::test]
async fn selecting_a_bucket_keeps_sibling_buckets() {
    let response = search("brand=acme").await;
    assert_eq!(response.total_hit_count, 2);

    let brands = &response.buckets["brand"];
    assert_eq!(brands.len(), 3);
    let zenith = brands.iter().find(|bucket| bucket.value == json!("zenith")).unwrap();
    assert_eq!(zenith.count, 2);
    assert_eq!(zenith.query, "brand=zenith");
}

#[tokio::test]
async fn range_bounds_carry_into_every_link() {
    let response = search("price.min=15&price.max=40&size=1").await;
    assert_eq!(response.total_hit_count, 3);

    let brands = &response.buckets["brand"];
    assert_eq!(brands[0].value, json!("zenith"));
    assert_eq!(brands[0].query, "price.min=15&price.max=40&size=1&brand=zenith");

    let next = response.pages.unwrap().next.unwrap();
    assert_eq!(next, "price.min=15&price.max=40&size=1&offset=1");
}

#[tokio::test]
async fn sort_links_switch_the_selected_option() {
    let response = search("size=2").await;
    let options = response.sort_options.unwrap();
    assert_eq!(options.len(), 2);
    assert!(options[0].selected);
    assert!(options[0].ascending);
    assert!(!options[1].selected);
    assert_eq!(options[1].query, "size=2&sort=pricey");

    let resorted = search(&options[1].query).await;
    assert_eq!(ids(&resorted), ["p5", "p4"]);
    let options = resorted.sort_options.unwrap();
    assert!(options[1].selected);
    assert!(!options[1].ascending);
    assert_eq!(options[0].query, "size=2&sort=cheap");

    let next = resorted.pages.unwrap().next.unwrap();
    assert_eq!(next, "size=2&sort=pricey&offset=2");
}

#[tokio::test]
async fn unknown_sort_is_rejected() {
    let endpoint = Endpoint::new(Arc::new(backend()), vec!["products".to_string()]);
    let err = endpoint.execute(parse_query_string("sort=nope")).await.unwrap_err();
    assert_eq!(err.status_code().as_u16(), 400);
}
