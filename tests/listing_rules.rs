use car_marketplace_api::{
    domain::{
        PromotionKind,
        listing::{ListingDraft, validate},
        promotions::{badges, extend_until, primary_label},
        search::{CarSearchFilters, build_search_url, contains_pattern},
    },
    error::AppError,
    services::import_service::check_rows,
};
use chrono::{Duration, TimeZone, Utc};

fn draft(brand: &str, model: &str, year: i32, price: i64) -> ListingDraft {
    ListingDraft {
        brand: Some(brand.into()),
        model: Some(model.into()),
        year: Some(year),
        price: Some(price),
        ..Default::default()
    }
}

#[test]
fn validation_reports_every_problem() {
    let bad = ListingDraft {
        brand: Some("   ".into()),
        year: Some(1900),
        price: Some(-5),
        mileage_km: Some(-1),
        ..Default::default()
    };
    let errors = validate(&bad, 2025).unwrap_err();
    assert_eq!(errors.len(), 5, "{errors:?}");
    assert!(errors.iter().any(|e| e.contains("brand")));
    assert!(errors.iter().any(|e| e.contains("model")));
    assert!(errors.iter().any(|e| e.contains("year")));
}

#[test]
fn next_model_year_is_accepted() {
    let ok = validate(&draft(" Toyota ", "Corolla", 2026, 85000), 2025).unwrap();
    assert_eq!(ok.brand, "Toyota");
    assert_eq!(ok.mileage_km, 0);
    assert!(validate(&draft("Toyota", "Corolla", 2027, 85000), 2025).is_err());
}

#[test]
fn import_rows_are_numbered_from_one() {
    let rows = vec![
        draft("Mazda", "3", 2019, 60000),
        ListingDraft::default(),
        draft("Kia", "Picanto", 2021, 45000),
    ];
    let check = check_rows(&rows, 2025);
    assert_eq!(check.valid.len(), 2);
    assert_eq!(check.errors.len(), 1);
    assert_eq!(check.errors[0].row, 2);
}

#[test]
fn badges_are_ordered_by_priority_and_expire() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let later = Some(now + Duration::days(3));
    let earlier = Some(now - Duration::seconds(1));

    let active = badges(now, later, later, later);
    assert_eq!(
        active,
        vec![
            PromotionKind::ExposurePlus,
            PromotionKind::Highlight,
            PromotionKind::Boost
        ]
    );
    assert_eq!(primary_label(&active), Some("Exposure+"));

    let only_boost = badges(now, later, earlier, None);
    assert_eq!(only_boost, vec![PromotionKind::Boost]);
    assert_eq!(primary_label(&only_boost), Some("Boosted"));
    assert_eq!(primary_label(&badges(now, None, None, None)), None);
}

#[test]
fn buying_more_time_extends_an_active_promotion() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    let active = now + Duration::days(2);
    assert_eq!(extend_until(Some(active), now, 7).unwrap(), now + Duration::days(9));

    let expired = now - Duration::days(5);
    assert_eq!(extend_until(Some(expired), now, 7).unwrap(), now + Duration::days(7));
    assert_eq!(extend_until(None, now, 7).unwrap(), now + Duration::days(7));
}

#[test]
fn an_unrepresentable_expiry_is_rejected() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    let days = 30 * 2_000_000_000_i64;
    assert!(matches!(
        extend_until(Some(now), now, days),
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        extend_until(None, now, i64::MAX),
        Err(AppError::BadRequest(_))
    ));
}

#[test]
fn search_url_carries_filters_in_a_stable_order() {
    let filters = CarSearchFilters {
        brand: Some("Škoda".into()),
        city: Some("Tel Aviv".into()),
        min_year: Some(2018),
        max_price: Some(90000),
        ..Default::default()
    };
    let url = build_search_url("https://cars.example.com/app/", &filters).unwrap();
    assert_eq!(
        url,
        "https://cars.example.com/app/cars?brand=skoda&min_year=2018&max_price=90000&city=Tel+Aviv"
    );
}

#[test]
fn search_url_without_filters_has_no_query() {
    let url = build_search_url("https://cars.example.com", &CarSearchFilters::default()).unwrap();
    assert_eq!(url, "https://cars.example.com/cars");
}

#[test]
fn inverted_ranges_are_rejected() {
    let filters = CarSearchFilters {
        min_price: Some(100),
        max_price: Some(50),
        ..Default::default()
    };
    assert!(filters.validate().is_err());
}

#[test]
fn text_search_matches_wildcards_literally() {
    assert_eq!(contains_pattern(" Corolla "), "%Corolla%");
    assert_eq!(contains_pattern("50%"), "%50\\%%");
    assert_eq!(contains_pattern("a_b\\c"), "%a\\_b\\\\c%");
}
