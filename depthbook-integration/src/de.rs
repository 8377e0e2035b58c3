/// Determine the `DateTime<Utc>` from the provided `Duration` since the epoch.
pub fn datetime_utc_from_epoch_duration(
    duration: std::time::Duration,
) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::<chrono::Utc>::from(std::time::UNIX_EPOCH + duration)
}

/// Determine the `DateTime<Utc>` from a `u64` milliseconds value since the epoch.
pub fn datetime_utc_from_epoch_ms(epoch_ms: u64) -> chrono::DateTime<chrono::Utc> {
    datetime_utc_from_epoch_duration(std::time::Duration::from_millis(epoch_ms))
}

/// Deserialize a `String` as the desired type.
pub fn de_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::de::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let data: &str = serde::de::Deserialize::deserialize(deserializer)?;
    data.parse::<T>().map_err(serde::de::Error::custom)
}

/// Deserialize an optional `u64` milliseconds value as `Option<DateTime<Utc>>`.
pub fn de_opt_u64_epoch_ms_as_datetime_utc<'de, D>(
    deserializer: D,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let epoch_ms: Option<u64> = serde::de::Deserialize::deserialize(deserializer)?;
    Ok(epoch_ms.map(datetime_utc_from_epoch_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Quote {
        #[serde(deserialize_with = "de_str")]
        price: f64,
        #[serde(default, deserialize_with = "de_opt_u64_epoch_ms_as_datetime_utc")]
        time: Option<chrono::DateTime<chrono::Utc>>,
    }

    #[test]
    fn test_de_str_and_epoch_ms() {
        let quote = serde_json::from_str::<Quote>(r#"{"price":"1209.67","time":1671656397761}"#)
            .unwrap();
        assert_eq!(quote.price, 1209.67);
        assert_eq!(
            quote.time,
            Some(chrono::Utc.timestamp_millis_opt(1671656397761).unwrap())
        );

        let quote = serde_json::from_str::<Quote>(r#"{"price":"NaN"}"#).unwrap();
        assert!(quote.price.is_nan());
        assert!(quote.time.is_none());

        assert!(serde_json::from_str::<Quote>(r#"{"price":"abc"}"#).is_err());
    }
}
