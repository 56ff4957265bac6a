use printdesk_sync::SyncSummary;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub summary: SyncSummary,
}
