use serde::Deserialize;

use super::ApiError;
use crate::domain::order::OrderStatus;
use crate::store::{OrderSearch, Page};

pub const DEFAULT_OFFSET: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 100;

/// Query string shared by every order listing:
/// `?memberName=&orderStatus=&offset=&limit=`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQueryParams {
    pub member_name: Option<String>,
    pub order_status: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl OrderQueryParams {
    pub fn search(&self) -> Result<OrderSearch, ApiError> {
        let order_status = match self.order_status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<OrderStatus>()
                    .map_err(|_| ApiError::InvalidStatus(raw.to_string()))?,
            ),
        };

        Ok(OrderSearch {
            member_name: self.member_name.clone(),
            order_status,
        })
    }

    /// A page only when the caller asked for one.
    pub fn page(&self) -> Option<Page> {
        if self.offset.is_none() && self.limit.is_none() {
            return None;
        }
        Some(self.page_or_default())
    }

    pub fn page_or_default(&self) -> Page {
        Page::new(
            self.offset.unwrap_or(DEFAULT_OFFSET),
            self.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}
