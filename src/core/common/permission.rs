use serde::{Deserialize, Serialize};

/// Permission set granted to the session at login
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Permissions {
    pub connection: Option<bool>,
    pub settings: Option<bool>,
    pub contacts: Option<bool>,
    pub calls: Option<bool>,
    pub explorer: Option<bool>,
    pub downloader: Option<bool>,
    pub parental: Option<bool>,
    pub pvr: Option<bool>,
    pub home: Option<bool>,
    pub camera: Option<bool>,
}

impl Permissions {
    /// Names of the permissions explicitly granted
    pub fn granted(&self) -> Vec<&'static str> {
        [
            ("connection", self.connection),
            ("settings", self.settings),
            ("contacts", self.contacts),
            ("calls", self.calls),
            ("explorer", self.explorer),
            ("downloader", self.downloader),
            ("parental", self.parental),
            ("pvr", self.pvr),
            ("home", self.home),
            ("camera", self.camera),
        ]
        .into_iter()
        .filter(|(_, v)| v.unwrap_or(false))
        .map(|(name, _)| name)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Permissions;

    #[test]
    fn granted_lists_only_true_flags() {
        let permissions: Permissions = serde_json::from_str(
            r#"{"settings": true, "calls": false, "pvr": true, "unexpected": true}"#,
        )
        .unwrap();

        assert_eq!(vec!["settings", "pvr"], permissions.granted());
    }
}
