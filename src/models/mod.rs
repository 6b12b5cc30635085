mod analytics;
mod category;
mod order;
mod permission;
mod product;
mod user;
mod wishlist;

pub use analytics::*;
pub use category::*;
pub use order::*;
pub use permission::*;
pub use product::*;
pub use user::*;
pub use wishlist::*;
