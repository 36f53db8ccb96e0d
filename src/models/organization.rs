//! Organization record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An organization that owns host assignments.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    /// Store-assigned id, ascending in registration order.
    pub id: i64,
    /// Unique name.
    pub name: String,
    /// Declared number of PCs. Informational only, never checked against
    /// the number of assigned addresses.
    pub pc_count: u64,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}
