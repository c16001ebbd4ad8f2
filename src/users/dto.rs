use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;
use crate::timefmt::format_timestamp;

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: i64,
    pub email: String,
    pub deposit_amount: Decimal,
    pub created_at: String,
}

impl From<User> for ProfileView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            deposit_amount: u.deposit_amount,
            created_at: format_timestamp(u.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: ProfileView,
}

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub amount: Decimal,
}
