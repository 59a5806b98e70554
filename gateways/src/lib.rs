pub mod paypal;
pub mod pesapal;
pub mod signature;

/// Gateway-agnostic view of where a payment stands, produced by each
/// client's status mapping. The reconciler consumes this; it never sees the
/// gateways' own status vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPaymentState {
    Completed,
    Failed,
    Cancelled,
    Pending,
}

/// Formats integer cents as the "12.50"-style decimal string both gateways
/// expect in order payloads.
pub fn cents_to_decimal(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_formatting_pads_cents() {
        assert_eq!(cents_to_decimal(1_250), "12.50");
        assert_eq!(cents_to_decimal(999), "9.99");
        assert_eq!(cents_to_decimal(3_000), "30.00");
        assert_eq!(cents_to_decimal(5), "0.05");
    }
}
