use chrono::{TimeZone, Utc};
use primitive_types::U256;

// A couple of helper functions to format data for the API response.

const UPOKT_PER_POKT: u64 = 1_000_000;

/// Converts a uPOKT amount (decimal string, possibly huge) to a POKT string
/// with six decimals. Pure integer math; invalid input falls back to "0".
pub fn format_pokt(upokt: &str) -> String {
    let amount = match U256::from_dec_str(upokt) {
        Ok(amount) => amount,
        Err(_) => return "0.000000".to_string(),
    };
    let denom = U256::from(UPOKT_PER_POKT);
    let whole = amount / denom;
    let fraction = (amount % denom).as_u64();
    format!("{whole}.{fraction:06}")
}

/// Converts a Unix timestamp (i64) into a readable date string (RFC3339 format).
pub fn format_timestamp(ts: i64) -> String {
    // Create a `DateTime<Utc>` object from the timestamp.
    let datetime = Utc.timestamp_opt(ts, 0).single();

    // Format it into a standard date string.
    if let Some(dt) = datetime {
        dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    } else {
        // Fallback for invalid timestamps.
        "Invalid Timestamp".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pokt_formatting_keeps_six_decimals() {
        assert_eq!(format_pokt("0"), "0.000000");
        assert_eq!(format_pokt("1"), "0.000001");
        assert_eq!(format_pokt("1000000"), "1.000000");
        assert_eq!(format_pokt("15750000"), "15.750000");
        // 2^65 uPOKT still formats without precision loss.
        assert_eq!(format_pokt("36893488147419103232"), "36893488147419.103232");
        assert_eq!(format_pokt("garbage"), "0.000000");
    }

    #[test]
    fn timestamps_render_rfc3339() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14T22:13:20Z");
    }
}
