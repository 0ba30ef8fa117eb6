//! Storefront features gated by role, and the roles each one needs.

use super::roles::{ADMIN_GROUP, USER_GROUP};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A gated storefront or dashboard feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    AccessDashboard,
    ManageProducts,
    ManageCategories,
    ManageOrders,
    ManageUsers,
    ManagePromotions,
    ManageStores,
    ViewAnalytics,
    ManageSettings,
    GetMyInfo,
    EditProfile,
    ViewOrders,
    PlaceOrder,
}

impl Permission {
    pub const ALL: [Permission; 13] = [
        Permission::AccessDashboard,
        Permission::ManageProducts,
        Permission::ManageCategories,
        Permission::ManageOrders,
        Permission::ManageUsers,
        Permission::ManagePromotions,
        Permission::ManageStores,
        Permission::ViewAnalytics,
        Permission::ManageSettings,
        Permission::GetMyInfo,
        Permission::EditProfile,
        Permission::ViewOrders,
        Permission::PlaceOrder,
    ];

    /// Roles of which the caller must hold at least one.
    pub fn required_roles(&self) -> &'static [&'static str] {
        match self {
            Permission::GetMyInfo
            | Permission::EditProfile
            | Permission::ViewOrders
            | Permission::PlaceOrder => USER_GROUP,
            _ => ADMIN_GROUP,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::AccessDashboard => "access_dashboard",
            Permission::ManageProducts => "manage_products",
            Permission::ManageCategories => "manage_categories",
            Permission::ManageOrders => "manage_orders",
            Permission::ManageUsers => "manage_users",
            Permission::ManagePromotions => "manage_promotions",
            Permission::ManageStores => "manage_stores",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ManageSettings => "manage_settings",
            Permission::GetMyInfo => "get_my_info",
            Permission::EditProfile => "edit_profile",
            Permission::ViewOrders => "view_orders",
            Permission::PlaceOrder => "place_order",
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::{ADMIN, USER, has_any_role};

    #[test]
    fn test_admin_features_exclude_customers() {
        for permission in [
            Permission::AccessDashboard,
            Permission::ManageOrders,
            Permission::ManagePromotions,
            Permission::ViewAnalytics,
        ] {
            assert!(has_any_role(&[ADMIN], permission.required_roles()));
            assert!(!has_any_role(&[USER], permission.required_roles()));
        }
    }

    #[test]
    fn test_customer_features_include_admins() {
        for permission in [Permission::EditProfile, Permission::ViewOrders, Permission::PlaceOrder] {
            assert!(has_any_role(&[USER], permission.required_roles()));
            assert!(has_any_role(&[ADMIN], permission.required_roles()));
        }
    }

    #[test]
    fn test_every_permission_requires_a_role() {
        for permission in Permission::ALL {
            assert!(!permission.required_roles().is_empty(), "{}", permission);
        }
    }

    #[test]
    fn test_serde_names_match_display() {
        let json = serde_json::to_string(&Permission::ManageProducts).unwrap();
        assert_eq!(json, "\"manage_products\"");
        assert_eq!(Permission::ManageProducts.to_string(), "manage_products");
    }
}
