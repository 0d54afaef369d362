use std::collections::HashMap;

use crate::domain::User;
use crate::ports::outbound::Directory;

/// Fixed user table used as the login fallback.
#[derive(Clone, Debug, Default)]
pub struct StaticDirectory {
    users: HashMap<String, User>,
}

impl StaticDirectory {
    /// Index `users` by email, case-insensitively.
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.email.to_ascii_lowercase(), u))
                .collect(),
        }
    }

    /// Directory holding the two demo accounts.
    pub fn with_seed_users() -> Self {
        Self::new(vec![seed_admin(), seed_jane()])
    }
}

impl Directory for StaticDirectory {
    fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.get(&email.trim().to_ascii_lowercase()).cloned()
    }
}

fn seed_admin() -> User {
    let mut user = User::new(
        "00000000-0000-0000-0000-000000000001",
        "admin@acme.com",
        "Admin",
        "User",
    )
    .with_progress(4850, 12);
    user.employee_id = "E0001".to_string();
    user.department = "IT".to_string();
    user.role = "System Administrator".to_string();
    user.manager_name = "CTO".to_string();
    user.start_date = "2023-01-15".to_string();
    user.streak_days = 42;
    user.intro_completed = true;
    user
}

fn seed_jane() -> User {
    let mut user = User::new(
        "00000000-0000-0000-0000-000000000002",
        "jane@acme.com",
        "Jane",
        "Patel",
    )
    .with_progress(485, 3);
    user.employee_id = "E0057".to_string();
    user.department = "Engineering".to_string();
    user.role = "Software Engineer I".to_string();
    user.manager_name = "A. Chen".to_string();
    user.start_date = "2024-11-01".to_string();
    user.streak_days = 7;
    user.intro_completed = true;
    user
}
