pub const ORDER_NUMBER_PREFIX: &str = "ECO-";

/// Generates a new human-readable order number, e.g. `ECO-1A2B3C4D`.
pub fn new_order_number() -> String {
    format!("{ORDER_NUMBER_PREFIX}{:08X}", rand::random::<u32>())
}
