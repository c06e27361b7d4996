// Shipment location trail, ETA estimation and the public tracking view
//
// Location samples are display data only; nothing here feeds back into the
// lifecycle rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::{Package, PackageHistory, PackageStatus, ShippingType, TrackingNumber};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometres
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// One immutable position sample reported for a shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentLocation {
    pub shipment_id: Uuid,
    pub position: GeoPoint,
    pub recorded_at: DateTime<Utc>,
}

/// Samples of one shipment in chronological order
#[derive(Debug, Clone, Default)]
pub struct LocationTrail {
    samples: Vec<ShipmentLocation>,
}

impl LocationTrail {
    pub fn new(mut samples: Vec<ShipmentLocation>) -> Self {
        samples.sort_by_key(|sample| sample.recorded_at);
        Self { samples }
    }

    pub fn samples(&self) -> &[ShipmentLocation] {
        &self.samples
    }

    pub fn latest(&self) -> Option<&ShipmentLocation> {
        self.samples.last()
    }

    pub fn distance_travelled_km(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|pair| pair[0].position.distance_km(&pair[1].position))
            .sum()
    }

    /// Average speed between the first and last sample
    pub fn average_speed_kmh(&self) -> Option<f64> {
        let (first, last) = (self.samples.first()?, self.samples.last()?);
        let elapsed_hours = (last.recorded_at - first.recorded_at).num_seconds() as f64 / 3600.0;
        if elapsed_hours <= 0.0 {
            return None;
        }
        Some(self.distance_travelled_km() / elapsed_hours)
    }
}

/// Arrival estimate from the latest sample at the trail's average speed.
/// `None` when there is not enough movement to extrapolate from.
pub fn estimate_eta(
    trail: &LocationTrail,
    destination: GeoPoint,
    min_speed_kmh: f64,
) -> Option<DateTime<Utc>> {
    let latest = trail.latest()?;
    let speed = trail.average_speed_kmh()?;
    if speed < min_speed_kmh || speed <= 0.0 {
        return None;
    }
    let remaining_km = latest.position.distance_km(&destination);
    let remaining_secs = (remaining_km / speed * 3600.0).round();
    if !remaining_secs.is_finite() || remaining_secs >= i64::MAX as f64 {
        return None;
    }
    let remaining = Duration::try_seconds(remaining_secs as i64)?;
    latest.recorded_at.checked_add_signed(remaining)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: PackageStatus,
    pub description: String,
    pub at: DateTime<Utc>,
}

/// What the public tracking page shows for a tracking number. Operator
/// identities stay out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingView {
    pub tracking_number: TrackingNumber,
    pub current_status: PackageStatus,
    pub shipping_type: ShippingType,
    pub delivered: bool,
    pub failed_attempts: usize,
    pub events: Vec<TrackingEvent>,
}

impl TrackingView {
    pub fn build(package: &Package, history: &PackageHistory) -> Self {
        let events = history
            .entries()
            .iter()
            .map(|entry| TrackingEvent {
                status: entry.status,
                description: entry.description.clone(),
                at: entry.created_at,
            })
            .collect();
        let current_status = history.current_status();

        Self {
            tracking_number: package.tracking_number.clone(),
            current_status,
            shipping_type: package.shipping_type,
            delivered: current_status.is_terminal(),
            failed_attempts: history.failed_attempts(),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(shipment_id: Uuid, minutes: i64, lat: f64, lon: f64) -> ShipmentLocation {
        ShipmentLocation {
            shipment_id,
            position: GeoPoint::new(lat, lon),
            recorded_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_distance_manila_to_cebu() {
        let manila = GeoPoint::new(14.5995, 120.9842);
        let cebu = GeoPoint::new(10.3157, 123.8854);
        let km = manila.distance_km(&cebu);
        assert!((km - 570.0).abs() < 15.0, "got {km}");
        assert_eq!(manila.distance_km(&manila), 0.0);
    }

    #[test]
    fn test_eta_needs_two_samples() {
        let id = Uuid::new_v4();
        let trail = LocationTrail::new(vec![sample(id, 0, 14.6, 121.0)]);
        assert_eq!(trail.average_speed_kmh(), None);
        assert_eq!(estimate_eta(&trail, GeoPoint::new(14.7, 121.0), 1.0), None);
    }

    #[test]
    fn test_eta_extrapolates_from_average_speed() {
        let id = Uuid::new_v4();
        // Unordered on purpose, the trail sorts by time
        let trail = LocationTrail::new(vec![
            sample(id, 60, 14.6, 121.1),
            sample(id, 0, 14.6, 121.0),
        ]);
        let speed = trail.average_speed_kmh().unwrap();
        assert!(speed > 10.0 && speed < 11.0, "got {speed}");

        let latest = trail.latest().unwrap().recorded_at;
        let eta = estimate_eta(&trail, GeoPoint::new(14.6, 121.2), 1.0).unwrap();
        let minutes = (eta - latest).num_minutes();
        assert!((59..=61).contains(&minutes), "got {minutes}");
    }

    #[test]
    fn test_crawling_shipment_with_zero_floor_has_no_eta() {
        let id = Uuid::new_v4();
        // About a metre in a year, destination on the far side of the globe
        let trail = LocationTrail::new(vec![
            sample(id, 0, 14.6, 121.0),
            sample(id, 365 * 24 * 60, 14.600009, 121.0),
        ]);
        assert_eq!(estimate_eta(&trail, GeoPoint::new(-14.6, -59.0), 0.0), None);
    }

    #[test]
    fn test_stationary_shipment_has_no_eta() {
        let id = Uuid::new_v4();
        let trail = LocationTrail::new(vec![
            sample(id, 0, 14.6, 121.0),
            sample(id, 30, 14.6, 121.0),
        ]);
        assert_eq!(estimate_eta(&trail, GeoPoint::new(14.7, 121.0), 1.0), None);
    }
}
