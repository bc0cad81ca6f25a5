//! Mock upstream data: realistic ecommerce funnel records with intentional
//! outlier segments, for demos and tests when no analytics property is
//! connected.

use chrono::{Duration, NaiveDate};
use funnel_core::types::FunnelRecord;
use rand::Rng;
use std::collections::HashMap;

/// Daily traffic profile for one dimension value. Rates are chosen so the
/// fleet-wide baseline lands near 15% view->cart and 9% cart->purchase, with
/// a few segments deliberately far enough off to trip outlier detection
/// (Social and Clothing & Accessories well below, Email well above).
struct Segment {
    dimension: &'static str,
    value: &'static str,
    daily_views: u64,
    view_to_cart: f64,
    cart_to_purchase: f64,
}

const SEGMENTS: &[Segment] = &[
    // Channel
    seg("channel", "Organic Search", 1000, 0.183, 0.087),
    seg("channel", "Social", 800, 0.081, 0.077),
    seg("channel", "Email", 500, 0.214, 0.112),
    seg("channel", "Direct", 1200, 0.148, 0.084),
    seg("channel", "Paid Search", 600, 0.160, 0.104),
    // Device
    seg("device", "desktop", 2000, 0.189, 0.111),
    seg("device", "mobile", 1800, 0.113, 0.079),
    seg("device", "tablet", 300, 0.173, 0.038),
    // Browser
    seg("browser", "Chrome", 2500, 0.161, 0.094),
    seg("browser", "Safari", 1200, 0.142, 0.088),
    seg("browser", "Firefox", 400, 0.143, 0.088),
    seg("browser", "Edge", 200, 0.130, 0.077),
    // Product category
    seg("category", "Canvas & Wall Art", 1800, 0.170, 0.098),
    seg("category", "Photo Blankets", 1200, 0.130, 0.083),
    seg("category", "Kitchen & Dining", 800, 0.170, 0.096),
    seg("category", "Clothing & Accessories", 500, 0.080, 0.075),
];

const fn seg(
    dimension: &'static str,
    value: &'static str,
    daily_views: u64,
    view_to_cart: f64,
    cart_to_purchase: f64,
) -> Segment {
    Segment {
        dimension,
        value,
        daily_views,
        view_to_cart,
        cart_to_purchase,
    }
}

/// Generate one record per segment per day over the `days` ending at
/// `end_date` inclusive, with ±5% random daily variation on traffic and
/// add-to-cart rate.
pub fn generate_mock_records(days: u32, end_date: NaiveDate) -> Vec<FunnelRecord> {
    let mut rng = rand::thread_rng();
    let mut records = Vec::with_capacity(days as usize * SEGMENTS.len());

    for offset in 0..days {
        let date = end_date - Duration::days(i64::from(days - 1 - offset));
        for segment in SEGMENTS {
            let variation: f64 = rng.gen_range(0.95..1.05);
            let views = (segment.daily_views as f64 * variation).round() as u64;
            let carts =
                ((views as f64 * segment.view_to_cart * variation).round() as u64).min(views);
            let purchases =
                ((carts as f64 * segment.cart_to_purchase).round() as u64).min(carts);

            records.push(FunnelRecord {
                dimensions: HashMap::from([(
                    segment.dimension.to_string(),
                    segment.value.to_string(),
                )]),
                view_item: views,
                add_to_cart: carts,
                purchase: purchases,
                date,
            });
        }
    }

    records
}

/// The dimension names the mock segments cover.
pub fn mock_dimensions() -> Vec<String> {
    let mut names: Vec<String> = SEGMENTS.iter().map(|s| s.dimension.to_string()).collect();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn test_one_record_per_segment_per_day() {
        let records = generate_mock_records(7, end_date());
        assert_eq!(records.len(), 7 * SEGMENTS.len());
    }

    #[test]
    fn test_counts_are_funnel_shaped() {
        for record in generate_mock_records(14, end_date()) {
            assert!(record.add_to_cart <= record.view_item);
            assert!(record.purchase <= record.add_to_cart);
        }
    }

    #[test]
    fn test_dates_span_the_window() {
        let records = generate_mock_records(10, end_date());
        let min = records.iter().map(|r| r.date).min().unwrap();
        let max = records.iter().map(|r| r.date).max().unwrap();
        assert_eq!(max, end_date());
        assert_eq!(min, end_date() - Duration::days(9));
    }

    #[test]
    fn test_social_runs_well_below_email() {
        let records = generate_mock_records(30, end_date());
        let rate_of = |value: &str| {
            let (views, carts) = records
                .iter()
                .filter(|r| r.dimensions.get("channel").map(String::as_str) == Some(value))
                .fold((0u64, 0u64), |(v, c), r| (v + r.view_item, c + r.add_to_cart));
            carts as f64 / views as f64
        };
        assert!(rate_of("Social") < 0.10);
        assert!(rate_of("Email") > 0.18);
    }

    #[test]
    fn test_mock_dimensions_deduplicated() {
        let names = mock_dimensions();
        assert_eq!(names, vec!["channel", "device", "browser", "category"]);
    }
}
