use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use log::{debug, info, warn};
use reqwest::Client;
use sunrise::{SolarDay, SolarEvent};

use crate::configuration::ZipcodeConfig;
use crate::geocode::{Coordinates, GeocodeError, Geocoder};

#[derive(thiserror::Error, Debug)]
pub enum SuntimesError {
    #[error("Invalid coordinates: latitude {0}, longitude {1}.")]
    InvalidCoordinates(f64, f64),
    #[error("No regular sunrise/sunset on {0} (sunrise {1}, sunset {2}).")]
    NoRegularDay(NaiveDate, NaiveTime, NaiveTime),
    #[error("{0}")]
    Geocode(#[from] GeocodeError),
}

/// Sunrise and sunset clock times for one date at one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunTimes {
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

impl SunTimes {
    pub fn is_daytime(&self, now: NaiveTime) -> bool {
        self.sunrise <= now && now < self.sunset
    }
}

/// Sun times on `date` at `coordinates`, as clock times in `tz`.
pub fn sun_times_in<Tz: TimeZone>(
    coordinates: Coordinates,
    date: NaiveDate,
    tz: &Tz,
) -> Result<SunTimes, SuntimesError> {
    let coord = sunrise::Coordinates::new(coordinates.latitude, coordinates.longitude).ok_or(
        SuntimesError::InvalidCoordinates(coordinates.latitude, coordinates.longitude),
    )?;
    let solar_day = SolarDay::new(coord, date);
    let sunrise = solar_day
        .event_time(SolarEvent::Sunrise)
        .with_timezone(tz)
        .time();
    let sunset = solar_day
        .event_time(SolarEvent::Sunset)
        .with_timezone(tz)
        .time();
    debug!("Sunrise: {}, sunset: {}", sunrise, sunset);
    if sunrise >= sunset {
        return Err(SuntimesError::NoRegularDay(date, sunrise, sunset));
    }
    Ok(SunTimes { sunrise, sunset })
}

#[derive(Debug, Clone)]
struct CachedDay {
    zipcode: String,
    date: NaiveDate,
    times: SunTimes,
}

/// Resolves today's sun times for the configured zipcode, caching them per day.
#[derive(Default)]
pub struct SunTimesResolver {
    geocoder: Geocoder,
    day: Option<CachedDay>,
}

impl SunTimesResolver {
    pub fn new(geocoder: Geocoder) -> Self {
        Self { geocoder, day: None }
    }

    fn cached(&self, zipcode: &str, date: NaiveDate) -> Option<SunTimes> {
        match &self.day {
            Some(day) if day.zipcode == zipcode && day.date == date => Some(day.times),
            Some(_) => {
                debug!("Sun times data stale.");
                None
            }
            None => None,
        }
    }

    async fn collect(
        &mut self,
        client: &Client,
        zipcode: &str,
        date: NaiveDate,
    ) -> Result<SunTimes, SuntimesError> {
        let coordinates = self.geocoder.coordinates(client, zipcode).await?;
        let times = sun_times_in(coordinates, date, &Local)?;
        info!(
            "Sun times for {} on {}: sunrise {}, sunset {}",
            zipcode, date, times.sunrise, times.sunset
        );
        self.day = Some(CachedDay {
            zipcode: zipcode.to_string(),
            date,
            times,
        });
        Ok(times)
    }

    /// Today's sun times, or `None` when sunrise/sunset mode is off or unavailable.
    pub async fn sun_times(
        &mut self,
        client: &Client,
        config: &ZipcodeConfig,
        today: NaiveDate,
    ) -> Option<SunTimes> {
        if !config.use_sunrise_sunset {
            debug!("Sunrise/sunset is not enabled in configuration.");
            return None;
        }
        let Some(zipcode) = config.active_zipcode() else {
            warn!("No zipcode specified for sunrise/sunset configuration.");
            return None;
        };
        if let Some(times) = self.cached(zipcode, today) {
            return Some(times);
        }
        match self.collect(client, zipcode, today).await {
            Ok(times) => Some(times),
            Err(e) => {
                warn!("Sun times unavailable for zipcode {}: {}", zipcode, e);
                None
            }
        }
    }
}
