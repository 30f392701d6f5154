use super::{ScoreResult, Store, StoreId};

/// A candidate store together with its score breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct RankedStore {
    pub store: Store,
    pub score: ScoreResult,
}

/// Paging metadata. Exactly one mode is active per request.
#[derive(Debug, Clone, PartialEq)]
pub enum PageInfo {
    Offset {
        page: u32,
        size: u32,
        total_count: usize,
        total_pages: usize,
        has_more: bool,
    },
    Cursor {
        limit: u32,
        has_more: bool,
        /// Id of the last store on this page, to be sent back as the next cursor
        last_id: Option<StoreId>,
    },
}

impl PageInfo {
    pub fn has_more(&self) -> bool {
        match self {
            PageInfo::Offset { has_more, .. } | PageInfo::Cursor { has_more, .. } => *has_more,
        }
    }
}

/// One page of ranked stores
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPage {
    pub entries: Vec<RankedStore>,
    pub paging: PageInfo,
}

impl RankedPage {
    pub fn store_ids(&self) -> Vec<StoreId> {
        self.entries.iter().map(|e| e.store.id).collect()
    }
}
