//! Spot price data model and the Tibber GraphQL payload format.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use thiserror::Error;

/// Query for the active price of the first home on the account
pub const PRICE_QUERY: &str = "{ viewer { homes { currentSubscription { priceInfo { current { total startsAt } } } } } }";

/// Currency units to minor units (SEK -> öre)
const MINOR_PER_MAJOR: f64 = 100.0;

/// Current spot price, immutable once fetched
#[derive(Debug, Clone, PartialEq)]
pub struct Price {
    total: f64,
    starts_at: DateTime<FixedOffset>,
}

impl Price {
    /// Returns `None` for negative or non-finite totals
    pub fn new(total: f64, starts_at: DateTime<FixedOffset>) -> Option<Self> {
        if !total.is_finite() || total < 0.0 {
            return None;
        }
        Some(Self { total, starts_at })
    }

    /// Price in currency units per kWh
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn starts_at(&self) -> DateTime<FixedOffset> {
        self.starts_at
    }

    /// Price in minor units per kWh, rounded to the nearest unit
    pub fn minor_units(&self) -> u32 {
        (self.total * MINOR_PER_MAJOR).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network unavailable")]
    NetworkUnavailable,
    #[error("API error: {0}")]
    ApiError(String),
    #[error("malformed response")]
    MalformedResponse,
}

pub type FetchOutcome = Result<Price, FetchError>;

/// JSON body for the price query POST
pub fn request_body() -> String {
    serde_json::json!({ "query": PRICE_QUERY }).to_string()
}

// ── GraphQL JSON structures ─────────────────────────────────────────

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<ViewerData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: Option<String>,
}

#[derive(Deserialize)]
struct ViewerData {
    viewer: Option<Viewer>,
}

#[derive(Deserialize)]
struct Viewer {
    homes: Option<Vec<Home>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Home {
    current_subscription: Option<Subscription>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Subscription {
    price_info: Option<PriceInfo>,
}

#[derive(Deserialize)]
struct PriceInfo {
    current: Option<PricePoint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricePoint {
    total: Option<f64>,
    starts_at: Option<String>,
}

/// Decode a response body into a price.
///
/// Every segment of `data.viewer.homes[0].currentSubscription.priceInfo.current`
/// must be present along with both `total` and `startsAt`. A body carrying
/// GraphQL `errors` and no usable data is reported as an API error.
pub fn parse_price_response(body: &[u8]) -> FetchOutcome {
    let response: GraphQlResponse = match serde_json::from_slice(body) {
        Ok(response) => response,
        Err(e) => {
            log::warn!("Price response is not valid JSON: {}", e);
            return Err(FetchError::MalformedResponse);
        }
    };

    let point = response
        .data
        .and_then(|data| data.viewer)
        .and_then(|viewer| viewer.homes)
        .and_then(|homes| homes.into_iter().next())
        .and_then(|home| home.current_subscription)
        .and_then(|subscription| subscription.price_info)
        .and_then(|info| info.current);

    let Some(point) = point else {
        if let Some(error) = response.errors.as_ref().and_then(|errors| errors.first()) {
            let message = error.message.clone().unwrap_or_else(|| "unknown GraphQL error".to_string());
            return Err(FetchError::ApiError(message));
        }
        return Err(FetchError::MalformedResponse);
    };

    let (Some(total), Some(starts_at)) = (point.total, point.starts_at) else {
        return Err(FetchError::MalformedResponse);
    };

    let starts_at = DateTime::parse_from_rfc3339(&starts_at).map_err(|e| {
        log::warn!("Unparsable startsAt '{}': {}", starts_at, e);
        FetchError::MalformedResponse
    })?;

    Price::new(total, starts_at).ok_or(FetchError::MalformedResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(current: &str) -> String {
        format!(
            r#"{{"data":{{"viewer":{{"homes":[{{"currentSubscription":{{"priceInfo":{{"current":{}}}}}}}]}}}}}}"#,
            current
        )
    }

    #[test]
    fn test_parses_current_price() {
        let json = body(r#"{"total":1.23,"startsAt":"2024-01-15T14:00:00.000+01:00"}"#);
        let price = parse_price_response(json.as_bytes()).unwrap();

        assert_eq!(price.total(), 1.23);
        assert_eq!(price.minor_units(), 123);
        assert_eq!(price.starts_at().format("%H:%M").to_string(), "14:00");
    }

    #[test]
    fn test_first_home_wins() {
        let json = r#"{"data":{"viewer":{"homes":[
            {"currentSubscription":{"priceInfo":{"current":{"total":0.5,"startsAt":"2024-01-15T14:00:00+01:00"}}}},
            {"currentSubscription":{"priceInfo":{"current":{"total":9.9,"startsAt":"2024-01-15T14:00:00+01:00"}}}}
        ]}}}"#;
        assert_eq!(parse_price_response(json.as_bytes()).unwrap().minor_units(), 50);
    }

    #[test]
    fn test_missing_segments_are_malformed() {
        let cases = [
            r#"{}"#,
            r#"{"data":null}"#,
            r#"{"data":{"viewer":{"homes":[]}}}"#,
            r#"{"data":{"viewer":{"homes":[{"currentSubscription":null}]}}}"#,
            r#"{"data":{"viewer":{"homes":[{"currentSubscription":{"priceInfo":{}}}]}}}"#,
        ];
        for case in cases {
            assert_eq!(parse_price_response(case.as_bytes()), Err(FetchError::MalformedResponse), "{}", case);
        }

        let no_total = body(r#"{"startsAt":"2024-01-15T14:00:00+01:00"}"#);
        assert_eq!(parse_price_response(no_total.as_bytes()), Err(FetchError::MalformedResponse));

        let no_start = body(r#"{"total":1.0}"#);
        assert_eq!(parse_price_response(no_start.as_bytes()), Err(FetchError::MalformedResponse));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(parse_price_response(b"<html>502</html>"), Err(FetchError::MalformedResponse));
        assert_eq!(parse_price_response(b""), Err(FetchError::MalformedResponse));
    }

    #[test]
    fn test_bad_timestamp_is_malformed() {
        let json = body(r#"{"total":1.0,"startsAt":"yesterday"}"#);
        assert_eq!(parse_price_response(json.as_bytes()), Err(FetchError::MalformedResponse));
    }

    #[test]
    fn test_negative_total_is_malformed() {
        let json = body(r#"{"total":-0.05,"startsAt":"2024-01-15T14:00:00+01:00"}"#);
        assert_eq!(parse_price_response(json.as_bytes()), Err(FetchError::MalformedResponse));
    }

    #[test]
    fn test_graphql_errors_become_api_error() {
        let json = r#"{"data":null,"errors":[{"message":"invalid token"}]}"#;
        assert_eq!(
            parse_price_response(json.as_bytes()),
            Err(FetchError::ApiError("invalid token".to_string()))
        );
    }

    #[test]
    fn test_minor_units_round_instead_of_truncating() {
        let at = DateTime::parse_from_rfc3339("2024-01-15T14:00:00+01:00").unwrap();
        // 0.29 * 100.0 is 28.999999999999996 in f64
        assert_eq!(Price::new(0.29, at).unwrap().minor_units(), 29);
        assert_eq!(Price::new(0.0, at).unwrap().minor_units(), 0);
        assert!(Price::new(f64::NAN, at).is_none());
    }

    #[test]
    fn test_request_body_carries_query() {
        let body: serde_json::Value = serde_json::from_str(&request_body()).unwrap();
        assert_eq!(body["query"], PRICE_QUERY);
        assert!(PRICE_QUERY.contains("startsAt"));
    }
}
