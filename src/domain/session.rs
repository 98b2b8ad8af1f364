use super::entities::User;

/// The signed-in user, passed explicitly to every call that needs auth.
///
/// The server accepts the raw user id as its bearer token. That token is not
/// signed and never expires, so it must not be treated as a credential beyond
/// this demo deployment.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn bearer_token(&self) -> &str {
        &self.user.id
    }

    pub fn into_user(self) -> User {
        self.user
    }
}
