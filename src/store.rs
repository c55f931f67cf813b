use crate::schema::{Category, table_configs};
use crate::seed::{Dashboard, default_table, seed_dashboard};
use crate::table::Table;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// One browser session: its dashboard tables and an expiry stamp.
#[derive(Debug, Clone)]
pub struct Session {
    pub dashboard: Dashboard,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: SystemTime,
}

/// Global sessions storage
///
/// Stores every active dashboard session in a thread-safe map keyed by the
/// `sid` cookie value.
lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
}

const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Create a fresh session seeded with the default datasets.
pub fn create_session() -> String {
    sweep_expired();
    let session_id = Uuid::new_v4().to_string();
    let session = Session {
        dashboard: seed_dashboard(),
        created_at: chrono::Utc::now(),
        expires_at: SystemTime::now() + Duration::from_secs(SESSION_DURATION),
    };
    SESSIONS
        .write()
        .unwrap()
        .insert(session_id.clone(), session);
    log::info!("session {} created", session_id);
    session_id
}

fn is_live(session_id: &str) -> bool {
    SESSIONS
        .read()
        .unwrap()
        .get(session_id)
        .map(|s| s.expires_at > SystemTime::now())
        .unwrap_or(false)
}

/// Resolve the session for a request: reuse a live one, otherwise create.
///
/// Expired ids silently get a newly seeded session, so a stale cookie never
/// errors, it just starts over.
pub fn ensure_session(session_id: Option<&str>) -> String {
    match session_id {
        Some(id) if is_live(id) => id.to_string(),
        _ => create_session(),
    }
}

/// Drop every session whose lifetime has elapsed.
pub fn sweep_expired() {
    let now = SystemTime::now();
    let mut sessions = SESSIONS.write().unwrap();
    let before = sessions.len();
    sessions.retain(|_, s| s.expires_at > now);
    let swept = before - sessions.len();
    if swept > 0 {
        log::debug!("swept {} expired session(s)", swept);
    }
}

/// Read access to a session's dashboard.
pub fn with_dashboard<F, R>(session_id: &str, f: F) -> Option<R>
where
    F: FnOnce(&Dashboard) -> R,
{
    let sessions = SESSIONS.read().unwrap();
    sessions.get(session_id).map(|s| f(&s.dashboard))
}

/// Write access to a session's dashboard.
pub fn with_dashboard_mut<F, R>(session_id: &str, f: F) -> Option<R>
where
    F: FnOnce(&mut Dashboard) -> R,
{
    let mut sessions = SESSIONS.write().unwrap();
    sessions.get_mut(session_id).map(|s| f(&mut s.dashboard))
}

/// Clone of one table from a session.
pub fn table(session_id: &str, data_key: &str) -> Option<Table> {
    with_dashboard(session_id, |d| d.get(data_key).cloned()).flatten()
}

/// Store a table back into a session.
pub fn save_table(session_id: &str, data_key: &str, table: Table) -> bool {
    with_dashboard_mut(session_id, |d| {
        d.insert(data_key.to_string(), table);
    })
    .is_some()
}

/// Replace the whole dashboard (snapshot upload).
pub fn replace_dashboard(session_id: &str, dashboard: Dashboard) -> bool {
    with_dashboard_mut(session_id, |d| *d = dashboard).is_some()
}

/// Empty every table of a category, keeping the column headers.
pub fn clear_category(session_id: &str, category: Category) -> bool {
    with_dashboard_mut(session_id, |d| {
        for config in table_configs(category) {
            if let Some(table) = d.get_mut(config.data_key) {
                table.clear();
            }
        }
    })
    .is_some()
}

/// Re-seed every table of a category from the defaults.
pub fn restore_category(session_id: &str, category: Category) -> bool {
    with_dashboard_mut(session_id, |d| {
        for config in table_configs(category) {
            if let Some(table) = default_table(config.data_key) {
                d.insert(config.data_key.to_string(), table);
            }
        }
    })
    .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    #[test]
    fn sessions_are_seeded_and_isolated() {
        let a = create_session();
        let b = create_session();
        assert_ne!(a, b);

        let mut brands = table(&a, "brands").unwrap();
        brands.set(0, "sales", CellValue::Number(999.0)).unwrap();
        assert!(save_table(&a, "brands", brands));

        // Session b keeps the seed value.
        assert_eq!(
            table(&b, "brands").unwrap().get(0, "sales"),
            Some(&CellValue::Number(248.0))
        );
        assert_eq!(
            table(&a, "brands").unwrap().get(0, "sales"),
            Some(&CellValue::Number(999.0))
        );
    }

    #[test]
    fn ensure_session_reuses_live_ids() {
        let id = create_session();
        assert_eq!(ensure_session(Some(&id)), id);
        let fresh = ensure_session(Some("not-a-session"));
        assert_ne!(fresh, id);
        assert!(is_live(&fresh));
    }

    #[test]
    fn clear_keeps_headers_restore_reseeds() {
        let id = create_session();
        assert!(clear_category(&id, Category::Sales));
        let monthly = table(&id, "monthly").unwrap();
        assert!(monthly.is_empty());
        assert_eq!(monthly.columns.len(), 6);

        assert!(restore_category(&id, Category::Sales));
        assert_eq!(table(&id, "monthly").unwrap().len(), 12);
    }

    #[test]
    fn clearing_one_category_spares_the_other() {
        let id = create_session();
        assert!(clear_category(&id, Category::Leads));
        assert!(table(&id, "gender").unwrap().is_empty());
        assert_eq!(table(&id, "monthly").unwrap().len(), 12);
    }

    #[test]
    fn unknown_session_yields_none() {
        assert!(table("nope", "brands").is_none());
        assert!(!save_table("nope", "brands", Table::new(vec![])));
    }
}
