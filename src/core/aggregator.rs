use crate::core::cleaner::AddressCleaner;
use crate::core::geocoder::build_query;
use crate::domain::model::{
    CostEstimate, GeocodeOutcome, GeocodePlan, GeocodeResult, GeocodeSummary, PassengerRecord,
    PlannedLookup,
};
use crate::domain::ports::{Geocoder, Pacer};

/// 清理後地址為空時回傳 `None`，這類資料不會送出請求
pub fn lookup_query(record: &PassengerRecord, cleaner: &AddressCleaner) -> Option<String> {
    let cleaned = cleaner.clean(&record.address);
    if cleaned.is_empty() {
        None
    } else {
        Some(build_query(&cleaned, &record.city))
    }
}

pub fn plan_lookups(
    records: &[PassengerRecord],
    cleaner: &AddressCleaner,
    price_per_request: f64,
) -> GeocodePlan {
    let lookups: Vec<PlannedLookup> = records
        .iter()
        .map(|record| PlannedLookup {
            id: record.id.clone(),
            query: lookup_query(record, cleaner),
        })
        .collect();
    let requests = lookups.iter().filter(|l| l.query.is_some()).count();

    GeocodePlan {
        lookups,
        cost: CostEstimate::new(requests, price_per_request),
    }
}

/// 依原始順序逐筆地理編碼
///
/// 輸出筆數與順序和輸入相同；失敗或略過的資料原樣保留
pub async fn geocode_records<G, P>(
    records: &[PassengerRecord],
    cleaner: &AddressCleaner,
    geocoder: &G,
    pacer: &mut P,
) -> GeocodeResult
where
    G: Geocoder + ?Sized,
    P: Pacer + ?Sized,
{
    let total = records.len();
    let mut summary = GeocodeSummary {
        total,
        ..GeocodeSummary::default()
    };
    let mut updated = Vec::with_capacity(total);

    for (index, record) in records.iter().enumerate() {
        tracing::debug!("📍 Geocoding {}/{} (id={})", index + 1, total, record.id);

        let Some(query) = lookup_query(record, cleaner) else {
            tracing::warn!("⚠️ Record {} has an empty address after cleaning, skipping", record.id);
            summary.skipped += 1;
            updated.push(record.clone());
            continue;
        };

        pacer.pace(index).await;

        match geocoder.geocode(&query).await {
            GeocodeOutcome::Found(coordinates) => {
                summary.geocoded += 1;
                updated.push(record.with_coordinates(coordinates));
            }
            GeocodeOutcome::ZeroResults | GeocodeOutcome::Failed { .. } => {
                summary.unresolved += 1;
                updated.push(record.clone());
            }
        }
    }

    tracing::info!(
        "✅ Geocoding finished: {} of {} addresses geocoded ({} skipped, {} unresolved)",
        summary.geocoded,
        summary.total,
        summary.skipped,
        summary.unresolved
    );

    GeocodeResult {
        records: updated,
        summary,
    }
}
