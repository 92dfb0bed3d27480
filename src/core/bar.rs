use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, OverlayResult};

/// Canonical OHLCV bar consumed by the chart backend.
///
/// `time` is a unix epoch in whole seconds. Within a valid batch, times are
/// unique and strictly increasing; the engine canonicalizes batches before
/// handing them to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Bar {
    /// Builds a validated bar from raw floating values.
    ///
    /// Invariants:
    /// - `open`, `high`, `low`, `close` are finite
    /// - `volume`, when present, is finite
    pub fn new(
        time: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> OverlayResult<Self> {
        if !open.is_finite() || !high.is_finite() || !low.is_finite() || !close.is_finite() {
            return Err(OverlayError::InvalidData(
                "ohlc values must be finite".to_owned(),
            ));
        }

        if volume.is_some_and(|value| !value.is_finite()) {
            return Err(OverlayError::InvalidData(
                "volume must be finite when present".to_owned(),
            ));
        }

        Ok(Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Converts strongly-typed temporal/decimal producer input into a validated bar.
    pub fn from_decimal_time(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Option<Decimal>,
    ) -> OverlayResult<Self> {
        let volume = volume
            .map(|value| decimal_to_f64(value, "volume"))
            .transpose()?;
        Self::new(
            time.timestamp(),
            decimal_to_f64(open, "open")?,
            decimal_to_f64(high, "high")?,
            decimal_to_f64(low, "low")?,
            decimal_to_f64(close, "close")?,
            volume,
        )
    }

    /// Returns `true` when close price is greater than or equal to open price.
    #[must_use]
    pub fn is_bullish(self) -> bool {
        self.close >= self.open
    }

    /// Derives the histogram point for the volume series, if volume is present.
    #[must_use]
    pub fn volume_point(self) -> Option<VolumePoint> {
        self.volume.map(|value| VolumePoint {
            time: self.time,
            value,
            bullish: self.is_bullish(),
        })
    }
}

/// One sample of the volume histogram derived from a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    pub time: i64,
    pub value: f64,
    pub bullish: bool,
}

fn decimal_to_f64(value: Decimal, field_name: &str) -> OverlayResult<f64> {
    value.to_f64().ok_or_else(|| {
        OverlayError::InvalidData(format!("{field_name} cannot be represented as f64"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn non_finite_ohlc_is_rejected() {
        assert!(Bar::new(1, f64::NAN, 2.0, 0.5, 1.5, None).is_err());
        assert!(Bar::new(1, 1.0, 2.0, 0.5, 1.5, Some(f64::INFINITY)).is_err());
        assert!(Bar::new(1, 1.0, 2.0, 0.5, 1.5, None).is_ok());
    }

    #[test]
    fn decimal_producer_input_converts_to_whole_seconds() {
        let time = chrono::Utc
            .with_ymd_and_hms(2024, 1, 5, 14, 30, 0)
            .single()
            .expect("valid datetime");
        let bar = Bar::from_decimal_time(
            time,
            Decimal::new(10_050, 2),
            Decimal::new(10_200, 2),
            Decimal::new(9_900, 2),
            Decimal::new(10_100, 2),
            Some(Decimal::new(5, 0)),
        )
        .expect("valid bar");

        assert_eq!(bar.time, 1_704_465_000);
        assert_eq!(bar.open, 100.5);
        assert_eq!(bar.volume, Some(5.0));
    }

    #[test]
    fn volume_point_follows_candle_direction() {
        let bullish = Bar::new(1, 1.0, 2.0, 0.5, 1.5, Some(3.0)).expect("bar");
        let point = bullish.volume_point().expect("volume point");
        assert!(point.bullish);
        assert_eq!(point.value, 3.0);

        let no_volume = Bar::new(1, 1.0, 2.0, 0.5, 1.5, None).expect("bar");
        assert!(no_volume.volume_point().is_none());
    }
}
