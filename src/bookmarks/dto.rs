use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bookmarks::repo::BookmarkedBusiness;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkRequest {
    pub business_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BookmarkListResponse {
    pub bookmarks: Vec<BookmarkedBusiness>,
}

#[derive(Debug, Serialize)]
pub struct BookmarkStatusResponse {
    pub bookmarked: bool,
}
