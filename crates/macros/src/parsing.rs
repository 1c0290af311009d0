use convert_case::{Case, Casing};
use darling::FromMeta;
use syn::Ident;

/// Converts a Rust identifier to the name the host sees, without the `r#`
/// prefix of raw identifiers.
pub fn ident_to_plugin_name(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").unwrap_or(&name).to_string()
}

#[derive(FromMeta, Debug, Default)]
#[darling(default)]
pub struct PluginRename {
    name: Option<String>,
    change_case: Option<RenameRule>,
}

impl PluginRename {
    pub fn rename(&self, name: impl AsRef<str>, default: RenameRule) -> String {
        if let Some(name) = self.name.as_ref() {
            name.clone()
        } else {
            self.change_case.unwrap_or(default).rename(name)
        }
    }
}

#[derive(Debug, Copy, Clone, FromMeta, Default)]
pub enum RenameRule {
    /// Names are kept as written.
    #[darling(rename = "none")]
    None,
    /// Names are converted to `PascalCase`.
    #[darling(rename = "PascalCase")]
    #[default]
    Pascal,
    /// Names are converted to `camelCase`.
    #[darling(rename = "camelCase")]
    Camel,
    /// Names are converted to `snake_case`.
    #[darling(rename = "snake_case")]
    Snake,
}

impl RenameRule {
    pub fn rename(self, value: impl AsRef<str>) -> String {
        match self {
            Self::None => value.as_ref().to_string(),
            Self::Pascal => value.as_ref().to_case(Case::Pascal),
            Self::Camel => value.as_ref().to_case(Case::Camel),
            Self::Snake => value.as_ref().to_case(Case::Snake),
        }
    }
}
