// tests/property_test.rs

use chatterd::core::chat;
use chatterd::core::types::Database;
use proptest::prelude::*;

proptest! {
    /// Every username returned by `list_accounts("*")` must actually be an
    /// active account that exists in the database.
    #[test]
    fn list_accounts_star_only_returns_active_existing_users(
        names in prop::collection::vec("[a-z]{3,8}", 1..6)
    ) {
        let mut db = Database::new();
        let mut created = Vec::new();
        for name in &names {
            if chat::create_account(&mut db, name, "pw").is_ok() {
                created.push(name.clone());
            }
        }
        let listed = chat::list_accounts(&db, "*");
        for username in &listed {
            prop_assert!(db.find_user_by_username(username).map(|u| u.active).unwrap_or(false));
        }
        for name in &created {
            prop_assert!(listed.contains(name));
        }
    }
}
