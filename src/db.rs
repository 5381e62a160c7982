use crate::models::{application_statuses, PocketApplication, PublicPocketAccount};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

/// Creates the tables and indexes if they are not there yet.
///
/// Uniqueness of (name, owner) and of the account address is enforced here,
/// by the store itself. The service still does a friendly pre-check, but the
/// index is what actually guarantees the invariant under concurrent writes.
pub fn initialize_database(db_path: &str) -> Result<()> {
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS applications (
            id              INTEGER PRIMARY KEY,
            name            TEXT NOT NULL,
            owner           TEXT NOT NULL,
            url             TEXT NOT NULL,
            contact_email   TEXT NOT NULL,
            user_email      TEXT NOT NULL,
            description     TEXT,
            icon            TEXT,
            free_tier       INTEGER NOT NULL DEFAULT 0,
            address         TEXT NOT NULL UNIQUE,
            public_key      TEXT NOT NULL,
            status          TEXT NOT NULL,
            last_changed_at INTEGER NOT NULL,
            created_at      INTEGER NOT NULL,
            UNIQUE (name, owner)
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            email      TEXT PRIMARY KEY,
            username   TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// The application record store. Opens a fresh connection per operation,
/// which is plenty for the dashboard's write volume.
#[derive(Clone)]
pub struct AppStore {
    db_path: String,
}

fn row_to_application(row: &Row) -> Result<PocketApplication> {
    Ok(PocketApplication {
        name: row.get("name")?,
        owner: row.get("owner")?,
        url: row.get("url")?,
        contact_email: row.get("contact_email")?,
        user: row.get("user_email")?,
        description: row.get("description")?,
        icon: row.get("icon")?,
        free_tier: row.get("free_tier")?,
        public_pocket_account: PublicPocketAccount {
            address: row.get("address")?,
            public_key: row.get("public_key")?,
        },
        status: row.get("status")?,
        last_changed_at: row.get("last_changed_at")?,
        created_at: row.get("created_at")?,
    })
}

const APPLICATION_COLUMNS: &str = "name, owner, url, contact_email, user_email, description, \
     icon, free_tier, address, public_key, status, last_changed_at, created_at";

impl AppStore {
    pub fn new(db_path: &str) -> AppStore {
        AppStore {
            db_path: db_path.to_string(),
        }
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
    }

    /// Inserts the application unless a record with the same (name, owner)
    /// or address already exists. Returns whether a row was written; a
    /// conflicting concurrent insert shows up here as `false`, not as an
    /// error.
    pub fn save_application(&self, application: &PocketApplication) -> Result<bool> {
        let conn = self.open()?;
        let changed = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO applications ({APPLICATION_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                application.name,
                application.owner,
                application.url,
                application.contact_email,
                application.user,
                application.description,
                application.icon,
                application.free_tier,
                application.public_pocket_account.address,
                application.public_pocket_account.public_key,
                application.status,
                application.last_changed_at,
                application.created_at,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn get_application_by_address(&self, address: &str) -> Result<Option<PocketApplication>> {
        let conn = self.open()?;
        conn.query_row(
            &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE address = ?1"),
            params![address],
            row_to_application,
        )
        .optional()
    }

    pub fn get_application_by_identity(
        &self,
        name: &str,
        owner: &str,
    ) -> Result<Option<PocketApplication>> {
        let conn = self.open()?;
        conn.query_row(
            &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE name = ?1 AND owner = ?2"),
            params![name, owner],
            row_to_application,
        )
        .optional()
    }

    pub fn get_applications(&self, limit: u32, offset: u32) -> Result<Vec<PocketApplication>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications ORDER BY created_at, id LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![limit, offset], row_to_application)?;
        rows.collect()
    }

    pub fn get_user_applications(
        &self,
        user_email: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PocketApplication>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE user_email = ?1 \
             ORDER BY created_at, id LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(params![user_email, limit, offset], row_to_application)?;
        rows.collect()
    }

    /// Flags the record as free tier and moves it into service. Idempotent.
    pub fn mark_free_tier(&self, address: &str) -> Result<bool> {
        let conn = self.open()?;
        let changed = conn.execute(
            "UPDATE applications SET free_tier = 1, status = ?2, last_changed_at = ?3 \
             WHERE address = ?1",
            params![address, application_statuses::IN_SERVICE, Utc::now().timestamp()],
        )?;
        Ok(changed > 0)
    }

    /// Removes the local record only. Nothing here talks to the network.
    pub fn delete_application(&self, address: &str) -> Result<bool> {
        let conn = self.open()?;
        let changed = conn.execute(
            "DELETE FROM applications WHERE address = ?1",
            params![address],
        )?;
        Ok(changed > 0)
    }

    pub fn user_exists(&self, email: &str) -> Result<bool> {
        let conn = self.open()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn save_user(&self, email: &str, username: &str) -> Result<bool> {
        let conn = self.open()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO users (email, username, created_at) VALUES (?1, ?2, ?3)",
            params![email, username, Utc::now().timestamp()],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    /// Fresh store backed by a throwaway sqlite file under the OS temp dir.
    pub fn fresh_store(tag: &str) -> AppStore {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "pocket-portal-test-{}-{}-{}.db",
            tag,
            std::process::id(),
            n
        ));
        let _ = std::fs::remove_file(&path);
        let path = path.to_string_lossy().to_string();
        initialize_database(&path).unwrap();
        AppStore::new(&path)
    }

    pub fn sample_application(name: &str, owner: &str, address: &str) -> PocketApplication {
        PocketApplication {
            name: name.to_string(),
            owner: owner.to_string(),
            url: "https://example.com".to_string(),
            contact_email: "dev@example.com".to_string(),
            user: "dev@example.com".to_string(),
            description: None,
            icon: None,
            free_tier: false,
            public_pocket_account: PublicPocketAccount {
                address: address.to_string(),
                public_key: format!("pk-{address}"),
            },
            status: application_statuses::AWAITING_STAKING.to_string(),
            last_changed_at: 1_700_000_000,
            created_at: 1_700_000_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{fresh_store, sample_application};

    #[test]
    fn save_then_fetch_by_address() {
        let store = fresh_store("fetch");
        let app = sample_application("my-app", "Alice", "addr1");

        assert!(store.save_application(&app).unwrap());

        let found = store.get_application_by_address("addr1").unwrap().unwrap();
        assert_eq!(found.name, "my-app");
        assert_eq!(found.owner, "Alice");
        assert_eq!(found.public_pocket_account.public_key, "pk-addr1");
        assert!(!found.free_tier);
    }

    #[test]
    fn duplicate_identity_is_not_written() {
        let store = fresh_store("dup");
        let first = sample_application("my-app", "Alice", "addr1");
        let second = sample_application("my-app", "Alice", "addr2");

        assert!(store.save_application(&first).unwrap());
        // Same (name, owner), different address: the unique index wins.
        assert!(!store.save_application(&second).unwrap());
        assert!(store.get_application_by_address("addr2").unwrap().is_none());
    }

    #[test]
    fn same_name_different_owner_is_fine() {
        let store = fresh_store("owners");
        assert!(store
            .save_application(&sample_application("my-app", "Alice", "addr1"))
            .unwrap());
        assert!(store
            .save_application(&sample_application("my-app", "Bob", "addr2"))
            .unwrap());
    }

    #[test]
    fn listing_honors_limit_offset_and_user_filter() {
        let store = fresh_store("listing");
        for i in 0..5 {
            let mut app = sample_application(&format!("app-{i}"), "Alice", &format!("addr{i}"));
            if i % 2 == 0 {
                app.user = "even@example.com".to_string();
            }
            store.save_application(&app).unwrap();
        }

        assert_eq!(store.get_applications(10, 0).unwrap().len(), 5);
        assert_eq!(store.get_applications(2, 0).unwrap().len(), 2);
        assert_eq!(store.get_applications(10, 4).unwrap().len(), 1);

        let evens = store
            .get_user_applications("even@example.com", 10, 0)
            .unwrap();
        assert_eq!(evens.len(), 3);
    }

    #[test]
    fn mark_free_tier_flags_the_record() {
        let store = fresh_store("freetier");
        store
            .save_application(&sample_application("my-app", "Alice", "addr1"))
            .unwrap();

        assert!(store.mark_free_tier("addr1").unwrap());
        assert!(!store.mark_free_tier("missing").unwrap());

        let found = store.get_application_by_address("addr1").unwrap().unwrap();
        assert!(found.free_tier);
        assert_eq!(found.status, "IN_SERVICE");
    }

    #[test]
    fn delete_removes_only_the_addressed_record() {
        let store = fresh_store("delete");
        store
            .save_application(&sample_application("app-a", "Alice", "addr1"))
            .unwrap();
        store
            .save_application(&sample_application("app-b", "Alice", "addr2"))
            .unwrap();

        assert!(store.delete_application("addr1").unwrap());
        assert!(!store.delete_application("addr1").unwrap());
        assert!(store.get_application_by_address("addr1").unwrap().is_none());
        assert!(store.get_application_by_address("addr2").unwrap().is_some());
    }

    #[test]
    fn user_exists_after_save() {
        let store = fresh_store("users");
        assert!(!store.user_exists("dev@example.com").unwrap());
        assert!(store.save_user("dev@example.com", "dev").unwrap());
        assert!(store.user_exists("dev@example.com").unwrap());
        // Re-registration is a no-op.
        assert!(!store.save_user("dev@example.com", "dev2").unwrap());
    }
}
