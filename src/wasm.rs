//! Browser entry point: suggestions computed from a band availability
//! document the front end has already fetched.

use crate::calendar::DateRange;
use crate::config::ResolverConfig;
use crate::payload::{BandAvailability, MemberAvailabilityRecord};
use crate::resolver::Resolver;
use crate::BandId;
use chrono::{Duration, NaiveDate};
use wasm_bindgen::prelude::*;

fn js_error<E: ToString>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[wasm_bindgen(js_name = suggestRehearsals)]
pub fn suggest_rehearsals(
    band_id: &str,
    members: JsValue,
    from: &str,
    to: &str,
    duration_minutes: u32,
    limit: Option<u32>,
) -> Result<JsValue, JsValue> {
    let band_id: BandId = band_id.parse().map_err(js_error)?;
    let from: NaiveDate = from.parse().map_err(js_error)?;
    let to: NaiveDate = to.parse().map_err(js_error)?;
    let members: Vec<MemberAvailabilityRecord> = serde_wasm_bindgen::from_value(members)?;

    let store = BandAvailability::new(band_id, members)
        .into_store()
        .map_err(js_error)?;

    let candidates = Resolver::with_config(store, ResolverConfig::default())
        .suggest(
            band_id,
            DateRange::new(from, to),
            Duration::minutes(i64::from(duration_minutes)),
            limit.map(|n| n as usize),
        )
        .map_err(js_error)?;

    Ok(serde_wasm_bindgen::to_value(&candidates)?)
}
