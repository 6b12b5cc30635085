use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy, dec};

use crate::{
    error::{AppError, Result},
    models::{CartItem, CatalogStatus, OrderItemData, Product, ShippingMethod},
};

pub const TAX_RATE: Decimal = dec!(0.08);

/// Largest value a `DECIMAL(10, 2)` money column holds.
pub const MAX_AMOUNT: Decimal = dec!(99999999.99);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Fails with 400 when the order total does not fit the money columns.
    pub fn compute(items: &[OrderItemData], method: ShippingMethod) -> Result<Self> {
        let subtotal: Decimal = items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum();
        let tax = round_cents(subtotal * TAX_RATE);
        let shipping = method.price();

        let total = subtotal + tax + shipping;
        if total > MAX_AMOUNT {
            return Err(AppError::BadRequest(format!(
                "Order total exceeds the maximum of {}",
                MAX_AMOUNT
            )));
        }

        Ok(Self {
            subtotal,
            tax,
            shipping,
            total,
        })
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rejects empty carts and non-positive quantities before anything is locked.
pub fn validate_cart(items: &[CartItem]) -> Result<()> {
    if items.is_empty() {
        return Err(AppError::BadRequest("Order items are required".to_string()));
    }

    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(format!(
                "Invalid quantity for product {}",
                item.product_id
            )));
        }
    }

    demand(items)?;

    Ok(())
}

/// Total requested quantity per product, summing repeated lines.
pub fn demand(items: &[CartItem]) -> Result<HashMap<i32, i32>> {
    let mut demand: HashMap<i32, i32> = HashMap::new();
    for item in items {
        let total = demand.entry(item.product_id).or_insert(0);
        *total = total.checked_add(item.quantity).ok_or_else(|| {
            AppError::BadRequest(format!("Quantity too large for product {}", item.product_id))
        })?;
    }
    Ok(demand)
}

/// Prices every line at the current product price after checking the product is
/// purchasable and has stock for the aggregated demand.
pub fn price_items(
    items: &[CartItem],
    products: &HashMap<i32, Product>,
) -> Result<Vec<OrderItemData>> {
    let demand = demand(items)?;
    let mut priced = Vec::with_capacity(items.len());

    for item in items {
        let product = products
            .get(&item.product_id)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", item.product_id)))?;

        if product.status != CatalogStatus::Active {
            return Err(AppError::BadRequest(format!(
                "Product {} is not available",
                item.product_id
            )));
        }

        if product.stock_quantity < demand[&item.product_id] {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {}",
                item.product_id
            )));
        }

        priced.push(OrderItemData {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: item.quantity,
            price: product.price,
        });
    }

    Ok(priced)
}

/// Shipping/billing addresses and the payment method must be JSON objects.
pub fn validate_details(field: &str, value: &serde_json::Value) -> Result<()> {
    match value.as_object() {
        Some(map) if !map.is_empty() => Ok(()),
        _ => Err(AppError::BadRequest(format!("{} is required", field))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn product(id: i32, price: Decimal, stock: i32, status: CatalogStatus) -> Product {
        Product {
            id,
            name: format!("Product {}", id),
            description: None,
            price,
            stock_quantity: stock,
            category_id: None,
            image_url: None,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<i32, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    fn line(product_id: i32, quantity: i32) -> CartItem {
        CartItem {
            product_id,
            quantity,
        }
    }

    #[test]
    fn totals_add_tax_and_shipping() {
        let items = vec![
            OrderItemData {
                product_id: 1,
                product_name: "Mug".into(),
                quantity: 2,
                price: dec!(12.50),
            },
            OrderItemData {
                product_id: 2,
                product_name: "Tee".into(),
                quantity: 1,
                price: dec!(19.99),
            },
        ];

        let totals = OrderTotals::compute(&items, ShippingMethod::Express).unwrap();
        assert_eq!(totals.subtotal, dec!(44.99));
        // 44.99 * 0.08 = 3.5992
        assert_eq!(totals.tax, dec!(3.60));
        assert_eq!(totals.shipping, dec!(14.99));
        assert_eq!(totals.total, dec!(63.58));
    }

    #[test]
    fn tax_rounds_half_away_from_zero() {
        let items = vec![OrderItemData {
            product_id: 1,
            product_name: "Pen".into(),
            quantity: 1,
            price: dec!(0.5625),
        }];
        // 0.5625 * 0.08 = 0.045
        let totals = OrderTotals::compute(&items, ShippingMethod::Standard).unwrap();
        assert_eq!(totals.tax, dec!(0.05));
    }

    #[test]
    fn totals_beyond_money_columns_are_rejected() {
        let items = vec![OrderItemData {
            product_id: 1,
            product_name: "Yacht".into(),
            quantity: 2000,
            price: dec!(99999.99),
        }];
        let err = OrderTotals::compute(&items, ShippingMethod::Standard).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let items = vec![OrderItemData {
            product_id: 1,
            product_name: "Car".into(),
            quantity: 1,
            price: dec!(90000000.00),
        }];
        assert!(OrderTotals::compute(&items, ShippingMethod::Overnight).is_ok());
    }

    #[test]
    fn repeated_lines_cannot_overflow_demand() {
        let lines = [line(1, i32::MAX), line(1, 2)];

        assert!(matches!(demand(&lines), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_cart(&lines), Err(AppError::BadRequest(_))));
        assert_eq!(demand(&[line(1, 2), line(1, 3)]).unwrap()[&1], 5);
    }

    #[test]
    fn empty_cart_and_bad_quantities_are_rejected() {
        assert!(validate_cart(&[]).is_err());
        assert!(validate_cart(&[line(1, 0)]).is_err());
        assert!(validate_cart(&[line(1, -3)]).is_err());
        assert!(validate_cart(&[line(1, 1)]).is_ok());
    }

    #[test]
    fn repeated_lines_share_stock() {
        let products = catalog(vec![product(1, dec!(3), 3, CatalogStatus::Active)]);

        assert!(price_items(&[line(1, 2), line(1, 1)], &products).is_ok());

        let err = price_items(&[line(1, 2), line(1, 2)], &products).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("Insufficient stock")));
    }

    #[test]
    fn lines_use_catalog_price() {
        let products = catalog(vec![product(7, dec!(9.99), 10, CatalogStatus::Active)]);
        let priced = price_items(&[line(7, 3)], &products).unwrap();

        assert_eq!(priced.len(), 1);
        assert_eq!(priced[0].price, dec!(9.99));
        assert_eq!(priced[0].product_name, "Product 7");
    }

    #[test]
    fn unknown_or_inactive_products_are_rejected() {
        let products = catalog(vec![product(1, dec!(1), 5, CatalogStatus::Inactive)]);

        let missing = price_items(&[line(2, 1)], &products).unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));

        let inactive = price_items(&[line(1, 1)], &products).unwrap_err();
        assert!(matches!(inactive, AppError::BadRequest(_)));
    }

    #[test]
    fn details_must_be_non_empty_objects() {
        assert!(validate_details("shipping_address", &json!({"city": "Rabat"})).is_ok());
        assert!(validate_details("shipping_address", &json!({})).is_err());
        assert!(validate_details("shipping_address", &json!("Rabat")).is_err());
        assert!(validate_details("payment_method", &serde_json::Value::Null).is_err());
    }
}
