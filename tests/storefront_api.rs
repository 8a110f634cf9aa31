// Boots the router over an in-memory inventory and drives it through StorefrontClient.

use std::collections::BTreeMap;
use std::sync::Arc;

use car_storefront::admin::CarEditForm;
use car_storefront::config::Settings;
use car_storefront::error::ClientError;
use car_storefront::inventory::MemoryInventory;
use car_storefront::models::{
    BrandRecord, CarCondition, CarRecord, CarSummary, Condition, SearchFilters,
};
use car_storefront::routes;
use car_storefront::search_results::{SearchOutcome, SearchResultAggregator};
use car_storefront::storefront_api::StorefrontClient;
use car_storefront::AppState;
use tokio::net::TcpListener;

fn brand(name: &str, slug: &str, country_group: &str) -> BrandRecord {
    BrandRecord {
        name: name.to_string(),
        slug: slug.to_string(),
        country_group: country_group.to_string(),
        image: None,
    }
}

fn record(id: i64, brand: &str, model: &str, condition: CarCondition) -> CarRecord {
    CarRecord {
        summary: CarSummary {
            id,
            brand: brand.to_string(),
            model: model.to_string(),
            name: format!("{brand} {model}"),
            price: 20_000.0 + id as f64 * 100.0,
            year: Some(2022),
            condition,
            origin: "china".to_string(),
            body_type: if id % 3 == 0 { "sedan" } else { "suv" }.to_string(),
            engine_type: "electric".to_string(),
            drivetrain: "awd".to_string(),
            image: None,
        },
        description: None,
        images: Vec::new(),
        options: Vec::new(),
        characteristics: BTreeMap::new(),
        accessories: Vec::new(),
        colors: Vec::new(),
        specs: BTreeMap::new(),
    }
}

// 45 BYD cars (ids 1..=45, the last five used) and one Audi; Zeekr has none
fn inventory() -> MemoryInventory {
    let mut cars: Vec<CarRecord> = (1..=45)
        .map(|id| record(id, "BYD", "Seal", if id > 40 { CarCondition::Used } else { CarCondition::New }))
        .collect();
    cars.push(record(46, "audi", "Q4", CarCondition::New));
    MemoryInventory::new(
        vec![
            brand("BYD", "byd", "chinese"),
            brand("Zeekr", "zeekr", "chinese"),
            brand("Audi", "audi", "European"),
        ],
        cars,
    )
}

async fn spawn_server() -> StorefrontClient {
    let state = AppState {
        settings: Arc::new(Settings::default()),
        inventory: Arc::new(inventory()),
    };
    let app = routes::create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    StorefrontClient::with_client(Arc::new(reqwest::Client::new()), &format!("http://{addr}"))
}

#[tokio::test]
async fn load_more_walks_through_all_pages() {
    let client = spawn_server().await;
    let aggregator = SearchResultAggregator::new(Arc::new(client));
    let byd = SearchFilters::new().with_search_term("byd");

    assert_eq!(aggregator.refresh(byd).await, SearchOutcome::Applied);
    let state = aggregator.state();
    assert_eq!((state.cars.len(), state.total_count, state.can_load_more), (20, 45, true));

    aggregator.load_more().await;
    let state = aggregator.state();
    assert_eq!((state.cars.len(), state.can_load_more), (40, true));

    aggregator.load_more().await;
    let state = aggregator.state();
    assert_eq!((state.cars.len(), state.can_load_more), (45, false));

    // Pages never repeat a car
    let mut ids: Vec<_> = state.cars.iter().map(|c| c.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 45);
}

#[tokio::test]
async fn search_applies_repeated_and_scalar_filters() {
    let client = spawn_server().await;

    let filters = SearchFilters::new()
        .with_condition(Condition::New)
        .with_body_type(["sedan", "SUV"])
        .with_price_range(Some(20_500.0), Some(21_000.0));
    let page = client.search(&filters, 1).await.unwrap();
    // ids 5..=10 fall in the price range and are all new
    assert_eq!(page.total_count, 6);

    let sedans = client.search(&SearchFilters::new().with_body_type(["sedan"]), 1).await.unwrap();
    assert!(sedans.cars.iter().all(|c| c.body_type == "sedan"));

    let used = client.search(&SearchFilters::new().with_condition(Condition::Used), 1).await.unwrap();
    assert_eq!(used.total_count, 5);

    let nothing = client.search(&SearchFilters::new().with_search_term("lada"), 1).await.unwrap();
    assert_eq!(nothing.total_count, 0);
    assert!(nothing.cars.is_empty());
}

#[tokio::test]
async fn suggestions_need_two_characters() {
    let client = spawn_server().await;

    assert!(client.suggestions("b").await.unwrap().is_empty());
    let labels: Vec<_> = client
        .suggestions(" by ")
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.label)
        .collect();
    assert_eq!(labels, vec!["BYD", "BYD Seal"]);
}

#[tokio::test]
async fn brand_listing_keeps_empty_brands_and_capitalizes_groups() {
    let client = spawn_server().await;

    let groups = client.brands().await.unwrap();
    let chinese = &groups["chinese"];
    assert_eq!(chinese.title, "Chinese");
    let zeekr = chinese.brands.iter().find(|b| b.slug == "zeekr").unwrap();
    assert_eq!(zeekr.car_count, 0);
    // Brand code "audi" matches slug "audi" case-insensitively
    assert_eq!(groups["european"].brands[0].car_count, 1);
    assert_eq!(groups["european"].title, "European");

    let popular = client.popular_brands().await.unwrap();
    assert_eq!(popular.iter().map(|b| b.slug.as_str()).collect::<Vec<_>>(), vec!["byd", "audi"]);
    assert_eq!(popular[0].count, 45);
}

#[tokio::test]
async fn admin_edit_round_trip() {
    let client = spawn_server().await;

    let record = client.get_car(7).await.unwrap();
    let mut form = CarEditForm::from_record(&record);
    form.price = "19999".to_string();
    form.colors = r##"[{"name": "Arctic white", "hex": "#ffffff"}]"##.to_string();

    let updated = client.update_car(7, &form).await.unwrap();
    assert_eq!(updated.summary.price, 19_999.0);
    assert_eq!(updated.colors[0].name, "Arctic white");
    assert_eq!(client.get_car(7).await.unwrap(), updated);

    match client.get_car(999).await {
        Err(ClientError::Status { status: 404, .. }) => {}
        other => panic!("expected 404, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_json_blocks_submission_without_contacting_the_server() {
    // Nothing listens here; reaching the network would surface as a transport error
    let client = StorefrontClient::with_client(Arc::new(reqwest::Client::new()), "http://127.0.0.1:9");
    let mut form = CarEditForm::from_record(&record(1, "BYD", "Seal", CarCondition::New));
    form.options = "[{\"name\": \"Tow bar\",".to_string();

    match client.update_car(1, &form).await {
        Err(ClientError::Validation(errors)) => assert_eq!(errors.first().unwrap().field, "options"),
        other => panic!("expected a validation error, got {other:?}"),
    }
}
