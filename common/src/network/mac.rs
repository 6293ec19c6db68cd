use std::sync::OnceLock;

use mac_oui::Oui;
use tracing::warn;

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

/// Retrieves or initializes the **Organizationally unique identifier** database.
///
/// A database that fails to load is remembered as absent so the lookup is
/// not retried for every accessory.
fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                warn!("failed to load OUI database: {e}");
                None
            }
        })
        .as_ref()
}

/// Identify the vendor behind the `MAC` attribute an accessory reports.
///
/// Accepts the firmware's textual form (`00:11:22:33:44:55`, either case).
pub fn get_vendor(mac: &str) -> Option<String> {
    let mac: &str = mac.trim();
    if mac.is_empty() {
        return None;
    }

    let db: &Oui = get_oui_db()?;
    match db.lookup_by_mac(mac) {
        Ok(Some(entry)) => Some(entry.company_name.clone()),
        _ => None,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
