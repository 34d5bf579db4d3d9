use std::fmt;

pub const ROLE_NAMES: &[&str] = &["super_admin", "admin", "super_user", "user"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    Admin,
    SuperUser,
    User,
    Other(String),
}

impl Role {
    pub fn parse(name: &str) -> Self {
        match name {
            "super_admin" => Role::SuperAdmin,
            "admin" => Role::Admin,
            "super_user" => Role::SuperUser,
            "user" => Role::User,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::SuperUser => "super_user",
            Role::User => "user",
            Role::Other(name) => name,
        }
    }

    /// Roles this role may act upon, besides its own record.
    pub fn manageable(&self) -> &'static [&'static str] {
        match self {
            Role::SuperAdmin => &["user", "super_user", "admin"],
            Role::Admin => &["user", "super_user"],
            Role::SuperUser => &["user"],
            Role::User | Role::Other(_) => &[],
        }
    }

    pub fn can_manage(&self, target: &str) -> bool {
        self.manageable().contains(&target)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
