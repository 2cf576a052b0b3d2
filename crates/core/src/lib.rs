#![forbid(unsafe_code)]

pub mod history;

pub mod ids {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    macro_rules! uuid_id {
        ($($name:ident),+ $(,)?) => {
            $(
                #[derive(
                    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
                )]
                #[serde(transparent)]
                pub struct $name(Uuid);

                impl $name {
                    pub fn new() -> Self {
                        Self(Uuid::new_v4())
                    }

                    pub const fn nil() -> Self {
                        Self(Uuid::nil())
                    }

                    pub fn is_nil(&self) -> bool {
                        self.0.is_nil()
                    }
                }

                impl Default for $name {
                    fn default() -> Self {
                        Self::new()
                    }
                }

                impl From<Uuid> for $name {
                    fn from(value: Uuid) -> Self {
                        Self(value)
                    }
                }

                impl std::fmt::Display for $name {
                    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                        std::fmt::Display::fmt(&self.0, f)
                    }
                }
            )+
        };
    }

    uuid_id!(StructureId, ResourceId, PrincipalId, ProjectId, PropertyDefId);
}

pub mod paths {
    pub const SEPARATOR: char = '/';

    pub fn is_folder_path(path: &str) -> bool {
        path.ends_with(SEPARATOR)
    }

    /// Parent folder of `path`, keeping the trailing separator. `None` for the root.
    pub fn parent_folder(path: &str) -> Option<&str> {
        let trimmed = path.strip_suffix(SEPARATOR).unwrap_or(path);
        let index = trimmed.rfind(SEPARATOR)?;
        Some(&path[..=index])
    }
}
