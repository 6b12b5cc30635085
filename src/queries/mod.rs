pub mod admin_queries;
pub mod category_queries;
pub mod order_queries;
pub mod permission_queries;
pub mod product_queries;
pub mod user_queries;
pub mod wishlist_queries;
