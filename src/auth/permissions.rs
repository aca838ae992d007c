/*!
 * # Permissions Module
 *
 * Permission strings are `resource:action`, optionally scoped with a third
 * segment (`orders:read:own`).
 */

/// Permission string constants used by the router and the role map.
pub mod consts {
    // Orders
    pub const ORDERS_CREATE: &str = "orders:create";
    pub const ORDERS_READ: &str = "orders:read";
    pub const ORDERS_READ_OWN: &str = "orders:read:own";
    pub const ORDERS_UPDATE: &str = "orders:update";
    pub const ORDERS_CANCEL: &str = "orders:cancel";

    // Catalog
    pub const CATALOG_WRITE: &str = "catalog:write";

    // Inventory
    pub const INVENTORY_ADJUST: &str = "inventory:adjust";

    // Account
    pub const PROFILE: &str = "profile";
}

/// Every permission known to the API.
pub const ALL: &[&str] = &[
    consts::ORDERS_CREATE,
    consts::ORDERS_READ,
    consts::ORDERS_READ_OWN,
    consts::ORDERS_UPDATE,
    consts::ORDERS_CANCEL,
    consts::CATALOG_WRITE,
    consts::INVENTORY_ADJUST,
    consts::PROFILE,
];
