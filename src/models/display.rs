use super::ListingStatus;

const PLACEHOLDER: &str = "N/A";

/// "$1,250,000", or "N/A" when the listing carries no price.
pub fn format_price(price: Option<u64>) -> String {
    match price {
        Some(value) => format!("${}", group_thousands(value)),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_count(value: Option<u64>) -> String {
    value
        .map(group_thousands)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Maps the raw service status (e.g. `FOR_SALE`) to its display label.
pub fn format_status(raw: Option<&str>) -> String {
    ListingStatus::from_raw(raw).label().to_string()
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
