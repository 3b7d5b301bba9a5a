use crate::domain::cart::CartLine;
use crate::domain::money::UnitPrice;
use crate::domain::seller::SellerId;
use crate::error::{CheckoutError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct CartLineRecord {
    product_id: Uuid,
    product_name: String,
    seller_id: SellerId,
    unit_price: Decimal,
    quantity: u32,
}

/// Reads cart lines from a CSV source.
///
/// Wraps `csv::Reader` and yields `Result<CartLine>` lazily, so large carts
/// stream without loading the whole file. Whitespace is trimmed and record
/// lengths are flexible.
pub struct CartReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CartReader<R> {
    /// Creates a new `CartReader` from any `Read` source (e.g. File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn lines(self) -> impl Iterator<Item = Result<CartLine>> {
        self.reader.into_deserialize().map(|result| {
            let record: CartLineRecord = result
                .map_err(|e| CheckoutError::validation(format!("malformed cart line: {e}")))?;
            Ok(CartLine {
                product_id: record.product_id,
                product_name: record.product_name,
                seller_id: record.seller_id,
                unit_price: UnitPrice::new(record.unit_price)?,
                quantity: record.quantity,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let seller = Uuid::new_v4();
        let data = format!(
            "product_id, product_name, seller_id, unit_price, quantity\n\
             {}, Kopi Robusta 250g, {seller}, 35000, 2\n\
             {}, Gula Aren, {seller}, 18000, 1",
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let reader = CartReader::new(data.as_bytes());
        let lines: Vec<Result<CartLine>> = reader.lines().collect();

        assert_eq!(lines.len(), 2);
        let first = lines[0].as_ref().unwrap();
        assert_eq!(first.unit_price.value(), dec!(35000));
        assert_eq!(first.quantity, 2);
        assert_eq!(first.seller_id, seller);
    }

    #[test]
    fn test_reader_rejects_non_positive_price() {
        let data = format!(
            "product_id, product_name, seller_id, unit_price, quantity\n\
             {}, Gratisan, {}, 0, 1",
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let reader = CartReader::new(data.as_bytes());
        let lines: Vec<Result<CartLine>> = reader.lines().collect();
        assert!(lines[0].is_err());
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "product_id, product_name, seller_id, unit_price, quantity\n\
                    not-a-uuid, X, also-not, 10, 1";
        let reader = CartReader::new(data.as_bytes());
        let lines: Vec<Result<CartLine>> = reader.lines().collect();
        assert!(lines[0].is_err());
    }
}
