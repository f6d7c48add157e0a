/// Store keys backing one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub data: String,
    pub groups: String,
    pub signature: String,
}

impl SessionKeys {
    pub fn new(prefix: &str, sid: &str) -> Self {
        Self {
            data: format!("{prefix}:data:{sid}"),
            groups: format!("{prefix}:groups:{sid}"),
            signature: format!("{prefix}:signature:{sid}"),
        }
    }

    /// All three keys, in data/groups/signature order.
    pub fn all(&self) -> [&str; 3] {
        [&self.data, &self.groups, &self.signature]
    }
}
