//! Straight-line trip estimates for the transport page.

use thiserror::Error;

use super::entities::{Rupees, TransportVehicle};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average speed used when a vehicle has no explicit trip estimate.
pub const AVERAGE_SPEED_KMH: f64 = 40.0;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TransportError {
    #[error("invalid {axis} {value}")]
    InvalidCoordinate { axis: &'static str, value: f64 },
    #[error("{vehicle} has an invalid rate per km ({rate})")]
    InvalidRate { vehicle: String, rate: f64 },
    #[error("cannot read coordinate '{0}'")]
    Unparseable(String),
}

/// A validated point in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, TransportError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(TransportError::InvalidCoordinate {
                axis: "latitude",
                value: lat,
            });
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(TransportError::InvalidCoordinate {
                axis: "longitude",
                value: lon,
            });
        }
        Ok(Self { lat, lon })
    }

    /// Parses the two text inputs of the pickup/drop form.
    pub fn parse(lat: &str, lon: &str) -> Result<Self, TransportError> {
        let read = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| TransportError::Unparseable(raw.to_string()))
        };
        Self::new(read(lat)?, read(lon)?)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[derive(Clone, Debug, PartialEq)]
pub struct TripEstimate {
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub distance_km: u32,
    pub cost: Rupees,
    pub hours: u32,
}

/// Prices a trip. Distance is rounded to whole kilometres before the rate is
/// applied; the cost is rounded again after.
pub fn estimate_trip(
    pickup: Coordinates,
    drop: Coordinates,
    vehicle: &TransportVehicle,
) -> Result<TripEstimate, TransportError> {
    let rate = vehicle.price_per_km;
    if !rate.is_finite() || rate < 0.0 {
        return Err(TransportError::InvalidRate {
            vehicle: vehicle.name.clone(),
            rate,
        });
    }

    let distance_km = haversine_km(pickup, drop).round();
    let cost = (distance_km * rate).round() as Rupees;
    let hours = vehicle
        .estimated_hours
        .unwrap_or_else(|| (distance_km / AVERAGE_SPEED_KMH).round() as u32);

    Ok(TripEstimate {
        vehicle_id: vehicle.id.clone(),
        vehicle_name: vehicle.name.clone(),
        distance_km: distance_km as u32,
        cost,
        hours,
    })
}

/// Estimates for every vehicle with a usable rate, cheapest first.
pub fn quote_vehicles(
    pickup: Coordinates,
    drop: Coordinates,
    vehicles: &[TransportVehicle],
) -> Vec<TripEstimate> {
    let mut estimates: Vec<TripEstimate> = vehicles
        .iter()
        .filter_map(|vehicle| match estimate_trip(pickup, drop, vehicle) {
            Ok(estimate) => Some(estimate),
            Err(err) => {
                tracing::warn!(vehicle = %vehicle.id, "skipping vehicle: {err}");
                None
            }
        })
        .collect();
    estimates.sort_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.hours.cmp(&b.hours)));
    estimates
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn chennai() -> Coordinates {
        Coordinates::new(13.0827, 80.2707).unwrap()
    }

    fn coimbatore() -> Coordinates {
        Coordinates::new(11.0168, 76.9558).unwrap()
    }

    fn vehicle(id: &str, rate: f64, hours: Option<u32>) -> TransportVehicle {
        TransportVehicle {
            id: id.to_string(),
            name: format!("Truck {id}"),
            vehicle_type: "mini truck".to_string(),
            capacity: Some("2 tonnes".to_string()),
            price_per_km: rate,
            estimated_hours: hours,
            driver_name: None,
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(haversine_km(chennai(), chennai()), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let there = haversine_km(chennai(), coimbatore());
        let back = haversine_km(coimbatore(), chennai());
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn chennai_to_coimbatore() {
        let km = haversine_km(chennai(), coimbatore());
        assert!((km - 427.4).abs() < 1.0, "got {km}");
    }

    #[test]
    fn trip_rounds_distance_before_pricing() {
        let estimate = estimate_trip(chennai(), coimbatore(), &vehicle("t1", 15.0, None)).unwrap();
        assert_eq!(estimate.distance_km, 427);
        assert_eq!(estimate.cost, 427 * 15);
        assert_eq!(estimate.hours, 11);
    }

    #[test]
    fn fractional_rate_applies_to_rounded_distance() {
        // 427.43 km * 12.5 would round to 5343; the rounded distance gives 5338.
        let estimate = estimate_trip(chennai(), coimbatore(), &vehicle("t2", 12.5, None)).unwrap();
        assert_eq!(estimate.cost, 5338);
    }

    #[test]
    fn explicit_vehicle_hours_win() {
        let estimate = estimate_trip(chennai(), coimbatore(), &vehicle("t3", 10.0, Some(9))).unwrap();
        assert_eq!(estimate.hours, 9);
    }

    #[rstest]
    #[case(f64::NAN, 80.0)]
    #[case(91.0, 80.0)]
    #[case(13.0, -181.0)]
    #[case(13.0, f64::INFINITY)]
    fn invalid_coordinates_fail(#[case] lat: f64, #[case] lon: f64) {
        assert!(matches!(
            Coordinates::new(lat, lon),
            Err(TransportError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn blank_input_fails_instead_of_zero() {
        assert_eq!(
            Coordinates::parse("", "80.27"),
            Err(TransportError::Unparseable(String::new()))
        );
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(-1.0)]
    fn invalid_rate_fails(#[case] rate: f64) {
        assert!(matches!(
            estimate_trip(chennai(), coimbatore(), &vehicle("bad", rate, None)),
            Err(TransportError::InvalidRate { .. })
        ));
    }

    #[test]
    fn quotes_are_cheapest_first_and_skip_bad_rates() {
        let vehicles = vec![
            vehicle("a", 20.0, None),
            vehicle("b", f64::NAN, None),
            vehicle("c", 12.0, None),
        ];
        let quotes = quote_vehicles(chennai(), coimbatore(), &vehicles);
        let ids: Vec<_> = quotes.iter().map(|q| q.vehicle_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }
}
