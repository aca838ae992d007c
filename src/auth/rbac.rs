/*!
 * # Role-Based Access Control (RBAC) Module
 *
 * Maps each user role to the permissions it grants. Roles are cumulative:
 * STAFF holds everything CUSTOMER does, ADMIN holds everything.
 */

use lazy_static::lazy_static;
use std::collections::HashMap;

use super::permissions::{consts, ALL};
use crate::entities::UserRole;

lazy_static! {
    pub static ref ROLE_PERMISSIONS: HashMap<UserRole, Vec<&'static str>> = {
        let customer = vec![
            consts::ORDERS_CREATE,
            consts::ORDERS_READ_OWN,
            consts::PROFILE,
        ];

        let mut staff = customer.clone();
        staff.extend([
            consts::CATALOG_WRITE,
            consts::ORDERS_READ,
            consts::ORDERS_UPDATE,
            consts::ORDERS_CANCEL,
            consts::INVENTORY_ADJUST,
        ]);

        let mut roles = HashMap::new();
        roles.insert(UserRole::Customer, customer);
        roles.insert(UserRole::Staff, staff);
        roles.insert(UserRole::Admin, ALL.to_vec());
        roles
    };
}

/// Permissions granted to `role`, as owned strings for token claims.
pub fn permissions_for(role: UserRole) -> Vec<String> {
    ROLE_PERMISSIONS
        .get(&role)
        .map(|perms| perms.iter().map(|p| p.to_string()).collect())
        .unwrap_or_default()
}

pub fn role_has_permission(role: UserRole, permission: &str) -> bool {
    if role == UserRole::Admin {
        return true;
    }
    ROLE_PERMISSIONS
        .get(&role)
        .is_some_and(|perms| perms.contains(&permission))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(UserRole::Customer, consts::ORDERS_CREATE, true)]
    #[case(UserRole::Customer, consts::ORDERS_READ_OWN, true)]
    #[case(UserRole::Customer, consts::ORDERS_READ, false)]
    #[case(UserRole::Customer, consts::CATALOG_WRITE, false)]
    #[case(UserRole::Staff, consts::CATALOG_WRITE, true)]
    #[case(UserRole::Staff, consts::INVENTORY_ADJUST, true)]
    #[case(UserRole::Staff, consts::ORDERS_CANCEL, true)]
    #[case(UserRole::Admin, consts::ORDERS_UPDATE, true)]
    #[case(UserRole::Admin, "anything:else", true)]
    fn role_permission_matrix(
        #[case] role: UserRole,
        #[case] permission: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(role_has_permission(role, permission), expected);
    }

    #[test]
    fn staff_is_superset_of_customer() {
        let customer = permissions_for(UserRole::Customer);
        let staff = permissions_for(UserRole::Staff);
        assert!(customer.iter().all(|p| staff.contains(p)));
        assert_eq!(permissions_for(UserRole::Admin).len(), ALL.len());
    }
}
