use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageOrders,
    ManageProducts,
    ManageCategories,
    ManageUsers,
    ManageAdmins,
    ViewAnalytics,
}

impl Permission {
    pub fn describe(&self) -> &'static str {
        match self {
            Permission::ManageOrders => "manage orders",
            Permission::ManageProducts => "manage products",
            Permission::ManageCategories => "manage categories",
            Permission::ManageUsers => "manage users",
            Permission::ManageAdmins => "manage admins",
            Permission::ViewAnalytics => "view analytics",
        }
    }
}

/// The six permission flags. Missing fields in a request body count as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct UserPermissions {
    pub manage_orders: bool,
    pub manage_products: bool,
    pub manage_categories: bool,
    pub manage_users: bool,
    pub manage_admins: bool,
    pub view_analytics: bool,
}

impl UserPermissions {
    pub fn all() -> Self {
        Self {
            manage_orders: true,
            manage_products: true,
            manage_categories: true,
            manage_users: true,
            manage_admins: true,
            view_analytics: true,
        }
    }

    /// Admins get everything but `manage_admins`, which is only ever granted explicitly.
    pub fn defaults_for(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Self {
                manage_admins: false,
                ..Self::all()
            },
            UserRole::Customer => Self::default(),
        }
    }

    /// Effective flags: the stored row when present, role defaults otherwise.
    /// Customers never hold a permission, whatever is stored.
    pub fn effective(role: UserRole, stored: Option<Self>) -> Self {
        match role {
            UserRole::Customer => Self::default(),
            UserRole::Admin => stored.unwrap_or_else(|| Self::defaults_for(role)),
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ManageOrders => self.manage_orders,
            Permission::ManageProducts => self.manage_products,
            Permission::ManageCategories => self.manage_categories,
            Permission::ManageUsers => self.manage_users,
            Permission::ManageAdmins => self.manage_admins,
            Permission::ViewAnalytics => self.view_analytics,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PermissionRecord {
    pub id: i32,
    pub user_id: i32,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub flags: UserPermissions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EffectivePermissions {
    pub user_id: i32,
    #[serde(flatten)]
    pub flags: UserPermissions,
}

#[derive(Debug, Serialize)]
pub struct AdminWithPermissions {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub permissions: UserPermissions,
}
