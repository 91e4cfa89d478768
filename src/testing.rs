use sqlx::MySqlPool;

use crate::auth::jwt::{TokenSubject, generate_access_token};
use crate::config::Config;
use crate::model::role::Role;

/// Pool that never connects unless a query runs.
pub fn lazy_pool() -> MySqlPool {
    MySqlPool::connect_lazy(&Config::for_tests().database_url).unwrap()
}

pub fn bearer_for(user_id: u64, role: Role) -> String {
    let subject = TokenSubject {
        user_id,
        email: format!("user{user_id}@company.com"),
        name: format!("User {user_id}"),
        role,
    };
    let token = generate_access_token(&subject, &Config::for_tests().jwt_secret, 300).unwrap();
    format!("Bearer {token}")
}
